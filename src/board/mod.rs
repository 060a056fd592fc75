//! Board state reconstructed from SGF nodes.
//!
//! A node only records what changes, so the board is derived by folding the
//! nodes from the root to the current one through [`BoardState::process_node`].
//! Every node opens a frame recording what it changed, which is what makes
//! stepping back possible without replaying the whole line.

mod data;
pub mod go;
mod handler;

pub use data::{
    BoardConfig, BoardData, InfoKey, Markup, MarkupType, MoveInfo, NodeInfo, Piece, Prisoners,
    SgfData,
};
pub use go::GoMoveHandler;
pub use handler::{CustomPropertyHandler, MoveHandler, NodeHandler};

use crate::sgf::{coord::CoordinateCodec, value::Color};

/// Values of the `GM` root property.
pub mod game {
    pub const GO: i64 = 1;
    pub const OTHELLO: i64 = 2;
    pub const CHESS: i64 = 3;
    pub const GOMOKU: i64 = 4;
    pub const NINE_MENS_MORRIS: i64 = 5;
    pub const BACKGAMMON: i64 = 6;
    pub const CHINESE_CHESS: i64 = 7;
    pub const SHOGI: i64 = 8;
}

/// Which variations `ST` asks to show.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum VariationMode {
    /// Children of the current node.
    #[default]
    Successors,
    /// Siblings of the current node, i.e. alternatives to the last move.
    Siblings,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Change {
    Add,
    Remove,
}

/// What one node did to the board.
#[derive(Debug, Clone)]
struct Frame<G: CoordinateCodec> {
    /// In the order they happened, with the piece list index they touched.
    changes: Vec<(Change, usize, Piece<G>)>,
    move_info: Option<MoveInfo<G>>,
    inherits: Vec<(MarkupType, Vec<Markup<G>>)>,
}

impl<G: CoordinateCodec> Default for Frame<G> {
    fn default() -> Self {
        Self { changes: Vec::new(), move_info: None, inherits: Vec::new() }
    }
}

#[derive(Debug, Clone)]
pub struct BoardState<G: CoordinateCodec> {
    frames: Vec<Frame<G>>,
    pieces: Vec<Piece<G>>,

    // Scratch, reset for every node.
    node_info: Vec<NodeInfo>,
    markup: Vec<Markup<G>>,
    variations: Vec<Option<G::Move>>,
    variation_markup: Vec<Markup<G>>,
    color_just_set: Option<Color>,
    move_number_just_set: Option<i64>,

    config: BoardConfig,
    show_variations: bool,
    variation_mode: VariationMode,
}

impl<G: CoordinateCodec> Default for BoardState<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: CoordinateCodec> BoardState<G> {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            pieces: Vec::new(),
            node_info: Vec::new(),
            markup: Vec::new(),
            variations: Vec::new(),
            variation_markup: Vec::new(),
            color_just_set: None,
            move_number_just_set: None,
            config: BoardConfig { game_id: game::GO, columns: 19, rows: 19 },
            show_variations: true,
            variation_mode: VariationMode::Successors,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn pieces(&self) -> &[Piece<G>] {
        &self.pieces
    }

    pub fn node_info(&self) -> &[NodeInfo] {
        &self.node_info
    }

    pub fn markup(&self) -> &[Markup<G>] {
        &self.markup
    }

    /// Variations handed in for the current node, as the first move of each.
    pub fn variations(&self) -> &[Option<G::Move>] {
        &self.variations
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn columns(&self) -> i64 {
        self.config.columns
    }

    pub fn rows(&self) -> i64 {
        self.config.rows
    }

    pub fn show_variations(&self) -> bool {
        self.show_variations
    }

    pub fn variation_mode(&self) -> VariationMode {
        self.variation_mode
    }

    /// Number of nodes folded into this state.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn piece_at(&self, point: &G::Point) -> Option<&Piece<G>> {
        self.pieces.iter().find(|p| G::stone_point(&p.stone) == point)
    }

    /// Totals as of the most recent move, including one made in the current
    /// node.
    pub fn last_move_info(&self) -> Option<&MoveInfo<G>> {
        self.frames.iter().rev().find_map(|f| f.move_info.as_ref())
    }

    /// A `PL` in the current node wins; otherwise the opponent of whoever
    /// moved last, and Black if nobody has.
    pub fn next_color(&self) -> Color {
        self.color_just_set
            .unwrap_or_else(|| self.last_move_info().map_or(Color::Black, |m| !m.color))
    }

    /// The most recent set of each inherited markup type. A set that was
    /// cleared with an empty list contributes nothing.
    pub fn inherited(&self) -> Vec<Markup<G>> {
        let mut seen: Vec<MarkupType> = Vec::new();
        let mut markups = Vec::new();
        for (kind, set) in self.frames.iter().rev().flat_map(|f| f.inherits.iter()) {
            if seen.contains(kind) {
                continue;
            }
            seen.push(*kind);
            markups.extend(set.iter().cloned());
        }
        markups
    }

    pub fn data(&self) -> BoardData<G> {
        BoardData {
            pieces: self.pieces.clone(),
            node_info: self.node_info.clone(),
            markup: self.markup.clone(),
            variations: self.variation_markup.clone(),
            inherited: self.inherited(),
            config: self.config,
            last_move: self.last_move_info().cloned(),
        }
    }

    // -----------------------------------------------------------------------
    // Changes available to move and custom property handlers
    // -----------------------------------------------------------------------

    /// Puts `piece` on the board, first removing whatever occupies its point.
    pub fn add_piece(&mut self, piece: Piece<G>) {
        while let Some(index) = self
            .pieces
            .iter()
            .position(|p| G::stone_point(&p.stone) == G::stone_point(&piece.stone))
        {
            self.remove_at(index);
        }
        self.record(Change::Add, self.pieces.len(), piece.clone());
        self.pieces.push(piece);
    }

    /// Takes `piece` off the board. Does nothing if it is not there.
    pub fn remove_piece(&mut self, piece: &Piece<G>) {
        if let Some(index) = self.pieces.iter().position(|p| p == piece) {
            self.remove_at(index);
        }
    }

    pub fn add_markups(&mut self, markups: impl IntoIterator<Item = Markup<G>>) {
        self.markup.extend(markups);
    }

    /// Replaces the inherited markup of type `kind` from this node on. An
    /// empty `markups` clears it.
    pub fn add_inherits(&mut self, kind: MarkupType, markups: Vec<Markup<G>>) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        match frame.inherits.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, set)) => set.extend(markups),
            None => frame.inherits.push((kind, markups)),
        }
    }

    pub fn add_node_info(&mut self, info: NodeInfo) {
        self.node_info.push(info);
    }

    // -----------------------------------------------------------------------
    // Frame bookkeeping
    // -----------------------------------------------------------------------

    fn remove_at(&mut self, index: usize) {
        let piece = self.pieces.remove(index);
        self.record(Change::Remove, index, piece);
    }

    fn record(&mut self, change: Change, index: usize, piece: Piece<G>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.changes.push((change, index, piece));
        }
    }

    /// Opens the frame for a new node and clears the per-node scratch.
    pub(crate) fn init_step(&mut self) {
        self.frames.push(Frame::default());
        self.node_info.clear();
        self.markup.clear();
        self.variations.clear();
        self.variation_markup.clear();
        self.color_just_set = None;
        self.move_number_just_set = None;
    }

    /// Undoes the last two frames. The caller reprocesses the node it lands
    /// on, which opens a fresh frame and restores that node's scratch.
    pub(crate) fn step_back(&mut self) {
        for _ in 0..2 {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            for (change, index, piece) in frame.changes.into_iter().rev() {
                match change {
                    Change::Add => {
                        if self.pieces.get(index) == Some(&piece) {
                            self.pieces.remove(index);
                        } else if let Some(found) = self.pieces.iter().position(|p| *p == piece) {
                            self.pieces.remove(found);
                        }
                    }
                    Change::Remove => {
                        let index = index.min(self.pieces.len());
                        self.pieces.insert(index, piece);
                    }
                }
            }
        }
    }

    /// Folds a move delta into the running totals.
    pub(crate) fn add_move_info(&mut self, delta: MoveInfo<G>) {
        let (number, prisoners) = self
            .last_move_info()
            .map_or((0, Prisoners::default()), |m| (m.move_number, m.prisoners));
        let info = MoveInfo {
            move_number: self
                .move_number_just_set
                .unwrap_or(number.saturating_add(delta.move_number)),
            prisoners: prisoners + delta.prisoners,
            ..delta
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.move_info = Some(info);
        }
    }

    pub(crate) fn set_move_number(&mut self, number: i64) {
        self.move_number_just_set = Some(number);
        if let Some(info) = self.frames.last_mut().and_then(|f| f.move_info.as_mut()) {
            info.move_number = number;
        }
    }

    pub(crate) fn set_color(&mut self, color: Color) {
        self.color_just_set = Some(color);
    }

    pub(crate) fn set_game(&mut self, game_id: i64) {
        let side = if game_id == game::GO { 19 } else { 8 };
        self.config = BoardConfig { game_id, columns: side, rows: side };
    }

    pub(crate) fn set_board_size(&mut self, columns: i64, rows: i64) {
        self.config.columns = columns;
        self.config.rows = rows;
    }

    /// `ST`: bit 0 picks siblings over successors, bit 1 hides the markers.
    pub(crate) fn configure_variations(&mut self, style: i64) {
        self.variation_mode = if style % 2 == 0 {
            VariationMode::Successors
        } else {
            VariationMode::Siblings
        };
        self.show_variations = style < 2;
    }

    pub(crate) fn set_variations(
        &mut self,
        variations: Vec<Option<G::Move>>,
        markers: Vec<Markup<G>>,
    ) {
        self.variations = variations;
        self.variation_markup = markers;
    }
}
