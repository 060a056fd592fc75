pub mod board;
#[cfg(feature = "cli")]
pub mod cli;
pub mod editor;
pub mod sgf;

pub use board::{BoardData, BoardState, NodeHandler};
pub use editor::{
    Adapter, EditCommand, Editor, EditorOptions, InteractionMode, NavPath, run_editor,
};
pub use sgf::{GameTree, parse_sgf};
