use std::{
    fmt::{Display, Formatter},
    ops::Add,
};

use crate::sgf::{
    coord::CoordinateCodec,
    value::{Color, Emphasis},
};

/// A stone of one color on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece<G: CoordinateCodec> {
    pub color: Color,
    pub stone: G::Stone,
}

/// Stones captured by each player.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Prisoners {
    pub by_black: u32,
    pub by_white: u32,
}

/// What the last move did. Move handlers return this as a delta (move number
/// `1`, prisoners taken by this move) and the board state keeps running
/// totals.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveInfo<G: CoordinateCodec> {
    pub move_number: i64,
    pub color: Color,
    pub played: G::Move,
    pub prisoners: Prisoners,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MarkupType {
    /// A label for one of the variations that can be played next.
    Variation,
    Arrow,
    Circle,
    Dim,
    Label,
    Line,
    X,
    Select,
    Square,
    Triangle,
    /// Restricts the displayed area to the marked points.
    Visible,
    BlackTerritory,
    WhiteTerritory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Markup<G: CoordinateCodec> {
    pub kind: MarkupType,
    pub point: G::Point,
    /// Second end point of arrows and lines.
    pub to: Option<G::Point>,
    pub label: Option<String>,
}

/// Where a piece of node information came from.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoKey {
    Comment,
    NodeName,
    Value,
    ToPlay(Color),
    Even(Emphasis),
    GoodForBlack(Emphasis),
    GoodForWhite(Emphasis),
    Hotspot(Emphasis),
    Unclear(Emphasis),
    BadMove(Emphasis),
    Doubtful,
    Interesting,
    Tesuji(Emphasis),
    ApplicationName,
    ApplicationVersion,
    Annotator,
    BlackRank,
    BlackTeam,
    Copyright,
    Date,
    Event,
    GameName,
    GameComment,
    Opening,
    Overtime,
    BlackPlayer,
    Place,
    WhitePlayer,
    Result,
    Round,
    Rules,
    Source,
    TimeLimit,
    EnteredBy,
    WhiteRank,
    WhiteTeam,
    BlackTimeLeft,
    BlackMovesLeft,
    WhiteMovesLeft,
    WhiteTimeLeft,
    Handicap,
    Komi,
    /// Emitted by custom property handlers.
    Custom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub key: InfoKey,
    pub message: Option<String>,
}

/// Game and board dimensions in effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub game_id: i64,
    pub columns: i64,
    pub rows: i64,
}

/// Everything a view needs to draw the current position.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardData<G: CoordinateCodec> {
    pub pieces: Vec<Piece<G>>,
    pub node_info: Vec<NodeInfo>,
    pub markup: Vec<Markup<G>>,
    pub variations: Vec<Markup<G>>,
    pub inherited: Vec<Markup<G>>,
    pub config: BoardConfig,
    pub last_move: Option<MoveInfo<G>>,
}

/// One presentation record, for consumers that want a flat stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SgfData<G: CoordinateCodec> {
    Piece(Piece<G>),
    NodeInfo(NodeInfo),
    Markup(Markup<G>),
    Config(BoardConfig),
    LastMove(MoveInfo<G>),
}

impl Prisoners {
    /// `count` stones taken by `color`.
    pub fn taken_by(color: Color, count: u32) -> Self {
        match color {
            Color::Black => Self { by_black: count, by_white: 0 },
            Color::White => Self { by_black: 0, by_white: count },
        }
    }
}

impl Add for Prisoners {
    type Output = Prisoners;

    fn add(self, rhs: Prisoners) -> Prisoners {
        Prisoners {
            by_black: self.by_black.saturating_add(rhs.by_black),
            by_white: self.by_white.saturating_add(rhs.by_white),
        }
    }
}

impl<G: CoordinateCodec> Markup<G> {
    pub fn at(kind: MarkupType, point: G::Point) -> Self {
        Self { kind, point, to: None, label: None }
    }

    pub fn between(kind: MarkupType, from: G::Point, to: G::Point) -> Self {
        Self { kind, point: from, to: Some(to), label: None }
    }

    pub fn labelled(kind: MarkupType, point: G::Point, label: impl Into<String>) -> Self {
        Self { kind, point, to: None, label: Some(label.into()) }
    }
}

impl NodeInfo {
    pub fn new(key: InfoKey, message: Option<String>) -> Self {
        Self { key, message }
    }
}

fn very(e: &Emphasis) -> &'static str {
    match e {
        Emphasis::Normal => "",
        Emphasis::Strong => "very ",
    }
}

impl Display for InfoKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Comment | Self::NodeName | Self::GameComment => Ok(()),
            Self::Value => write!(f, "Score"),
            Self::ToPlay(Color::Black) => write!(f, "black to play"),
            Self::ToPlay(Color::White) => write!(f, "white to play"),
            Self::Even(e) => write!(f, "{}even position", very(e)),
            Self::GoodForBlack(e) => write!(f, "{}good for black", very(e)),
            Self::GoodForWhite(e) => write!(f, "{}good for white", very(e)),
            Self::Hotspot(e) => write!(f, "{}interesting position", very(e)),
            Self::Unclear(e) => write!(f, "{}unclear position", very(e)),
            Self::BadMove(e) => write!(f, "{}bad move", very(e)),
            Self::Doubtful => write!(f, "doubtful move"),
            Self::Interesting => write!(f, "interesting move"),
            Self::Tesuji(e) => write!(f, "{}good move", very(e)),
            Self::ApplicationName => write!(f, "Application name"),
            Self::ApplicationVersion => write!(f, "Application version"),
            Self::Annotator => write!(f, "Annotations by"),
            Self::BlackRank => write!(f, "Black player rank"),
            Self::BlackTeam => write!(f, "Black team"),
            Self::Copyright => write!(f, "Copyright"),
            Self::Date => write!(f, "Date of game"),
            Self::Event => write!(f, "Event"),
            Self::GameName => write!(f, "Game"),
            Self::Opening => write!(f, "Opening"),
            Self::Overtime => write!(f, "Byo-yomi"),
            Self::BlackPlayer => write!(f, "Black player"),
            Self::Place => write!(f, "Place"),
            Self::WhitePlayer => write!(f, "White player"),
            Self::Result => write!(f, "Result"),
            Self::Round => write!(f, "Round"),
            Self::Rules => write!(f, "Rule set"),
            Self::Source => write!(f, "Source"),
            Self::TimeLimit => write!(f, "Time limits"),
            Self::EnteredBy => write!(f, "Game entered by"),
            Self::WhiteRank => write!(f, "White player rank"),
            Self::WhiteTeam => write!(f, "White team"),
            Self::BlackTimeLeft => write!(f, "Time left for black/s"),
            Self::BlackMovesLeft => write!(f, "Moves left for black"),
            Self::WhiteMovesLeft => write!(f, "Moves left for white"),
            Self::WhiteTimeLeft => write!(f, "Time left for white/s"),
            Self::Handicap => write!(f, "Handicap"),
            Self::Komi => write!(f, "Komi"),
            Self::Custom(key) => write!(f, "{}", key),
        }
    }
}

impl Display for NodeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let key = self.key.to_string();
        match (key.is_empty(), &self.message) {
            (_, None) => write!(f, "{}", key),
            (true, Some(message)) => write!(f, "{}", message),
            (false, Some(message)) => write!(f, "{}: {}", key, message),
        }
    }
}

impl<G: CoordinateCodec> BoardData<G> {
    /// The board flattened into records: config first, then pieces, markup
    /// (node, inherited, variations), node information and the last move.
    pub fn records(&self) -> Vec<SgfData<G>> {
        let mut records = vec![SgfData::Config(self.config)];
        records.extend(self.pieces.iter().cloned().map(SgfData::Piece));
        records.extend(
            self.markup
                .iter()
                .chain(&self.inherited)
                .chain(&self.variations)
                .cloned()
                .map(SgfData::Markup),
        );
        records.extend(self.node_info.iter().cloned().map(SgfData::NodeInfo));
        records.extend(self.last_move.iter().cloned().map(SgfData::LastMove));
        records
    }
}
