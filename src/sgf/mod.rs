pub mod coord;
pub mod node;
pub mod tree;
pub mod value;
mod parser;

pub use coord::{CoordinateCodec, GoCodec, XYMove, XYPoint};
pub use node::{Node, Property, decode_property};
pub use tree::{GameTree, MainlineIter, Subtree, SubtreeIter, TreeId};
pub use parser::parse_sgf;
pub use value::{Color, Emphasis, SimpleText, Text};
