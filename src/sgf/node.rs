use std::fmt::{Display, Formatter};

use crate::sgf::{
    coord::CoordinateCodec,
    value::{
        Color, Emphasis, SimpleText, Text, parse_board_size, parse_color, parse_compose,
        parse_emphasis, parse_number, parse_real, parse_simple_text, parse_text,
    },
};

/// One typed SGF property. Variants are named after their FF[4] identifier.
///
/// Properties holding a list accumulate when their identifier shows up again
/// in the same node; all others are replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum Property<G: CoordinateCodec> {
    /// Black move
    B(G::Move),

    /// Execute the move even if it is illegal
    KO,

    /// Set the move number
    MN(i64),

    /// White move
    W(G::Move),

    /// Add black stones
    AB(Vec<G::Stone>),

    /// Clear points
    AE(Vec<G::Point>),

    /// Add white stones
    AW(Vec<G::Stone>),

    /// Player to move
    PL(Color),

    /// Comment
    C(Text),

    /// Even position
    DM(Emphasis),

    /// Good for black
    GB(Emphasis),

    /// Good for white
    GW(Emphasis),

    /// Hotspot
    HO(Emphasis),

    /// Node name
    N(SimpleText),

    /// Unclear position
    UC(Emphasis),

    /// Node value (estimated score)
    V(f64),

    /// Bad move
    BM(Emphasis),

    /// Doubtful move
    DO,

    /// Interesting move
    IT,

    /// Tesuji
    TE(Emphasis),

    /// Arrows, from the first point to the second
    AR(Vec<(G::Point, G::Point)>),

    /// Circles
    CR(Vec<G::Point>),

    /// Dim points (inherited)
    DD(Vec<G::Point>),

    /// Labels
    LB(Vec<(G::Point, SimpleText)>),

    /// Lines
    LN(Vec<(G::Point, G::Point)>),

    /// X marks
    MA(Vec<G::Point>),

    /// Selected points
    SL(Vec<G::Point>),

    /// Squares
    SQ(Vec<G::Point>),

    /// Triangles
    TR(Vec<G::Point>),

    /// Application name and version
    AP((SimpleText, SimpleText)),

    /// Charset
    CA(SimpleText),

    /// File format
    FF(i64),

    /// Game
    GM(i64),

    /// Variation display style
    ST(i64),

    /// Board size, columns and rows
    SZ((i64, i64)),

    /// Annotator
    AN(SimpleText),

    /// Black rank
    BR(SimpleText),

    /// Black team
    BT(SimpleText),

    /// Copyright
    CP(SimpleText),

    /// Date
    DT(SimpleText),

    /// Event
    EV(SimpleText),

    /// Game name
    GN(SimpleText),

    /// Game comment
    GC(Text),

    /// Opening
    ON(SimpleText),

    /// Overtime method
    OT(SimpleText),

    /// Black player name
    PB(SimpleText),

    /// Place
    PC(SimpleText),

    /// White player name
    PW(SimpleText),

    /// Result
    RE(SimpleText),

    /// Round
    RO(SimpleText),

    /// Rules
    RU(SimpleText),

    /// Source
    SO(SimpleText),

    /// Time limit in seconds
    TM(f64),

    /// User who entered the game
    US(SimpleText),

    /// White rank
    WR(SimpleText),

    /// White team
    WT(SimpleText),

    /// Time left for black
    BL(f64),

    /// Black moves left in the byo-yomi period
    OB(i64),

    /// White moves left in the byo-yomi period
    OW(i64),

    /// Time left for white
    WL(f64),

    /// Figure
    FG((i64, SimpleText)),

    /// Print move mode
    PM(i64),

    /// Visible points (inherited)
    VW(Vec<G::Point>),

    /// Handicap
    HA(i64),

    /// Komi
    KM(f64),

    /// Black territory
    TB(Vec<G::Point>),

    /// White territory
    TW(Vec<G::Point>),

    /// Application-specific or unrecognized property
    Custom(String, Vec<String>),
}

/// An SGF node: the properties between one `;` and the next delimiter.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<G: CoordinateCodec> {
    pub properties: Vec<Property<G>>,
}

impl<G: CoordinateCodec> Property<G> {
    pub fn ident(&self) -> &str {
        match self {
            Self::B(_) => "B",
            Self::KO => "KO",
            Self::MN(_) => "MN",
            Self::W(_) => "W",
            Self::AB(_) => "AB",
            Self::AE(_) => "AE",
            Self::AW(_) => "AW",
            Self::PL(_) => "PL",
            Self::C(_) => "C",
            Self::DM(_) => "DM",
            Self::GB(_) => "GB",
            Self::GW(_) => "GW",
            Self::HO(_) => "HO",
            Self::N(_) => "N",
            Self::UC(_) => "UC",
            Self::V(_) => "V",
            Self::BM(_) => "BM",
            Self::DO => "DO",
            Self::IT => "IT",
            Self::TE(_) => "TE",
            Self::AR(_) => "AR",
            Self::CR(_) => "CR",
            Self::DD(_) => "DD",
            Self::LB(_) => "LB",
            Self::LN(_) => "LN",
            Self::MA(_) => "MA",
            Self::SL(_) => "SL",
            Self::SQ(_) => "SQ",
            Self::TR(_) => "TR",
            Self::AP(_) => "AP",
            Self::CA(_) => "CA",
            Self::FF(_) => "FF",
            Self::GM(_) => "GM",
            Self::ST(_) => "ST",
            Self::SZ(_) => "SZ",
            Self::AN(_) => "AN",
            Self::BR(_) => "BR",
            Self::BT(_) => "BT",
            Self::CP(_) => "CP",
            Self::DT(_) => "DT",
            Self::EV(_) => "EV",
            Self::GN(_) => "GN",
            Self::GC(_) => "GC",
            Self::ON(_) => "ON",
            Self::OT(_) => "OT",
            Self::PB(_) => "PB",
            Self::PC(_) => "PC",
            Self::PW(_) => "PW",
            Self::RE(_) => "RE",
            Self::RO(_) => "RO",
            Self::RU(_) => "RU",
            Self::SO(_) => "SO",
            Self::TM(_) => "TM",
            Self::US(_) => "US",
            Self::WR(_) => "WR",
            Self::WT(_) => "WT",
            Self::BL(_) => "BL",
            Self::OB(_) => "OB",
            Self::OW(_) => "OW",
            Self::WL(_) => "WL",
            Self::FG(_) => "FG",
            Self::PM(_) => "PM",
            Self::VW(_) => "VW",
            Self::HA(_) => "HA",
            Self::KM(_) => "KM",
            Self::TB(_) => "TB",
            Self::TW(_) => "TW",
            Self::Custom(ident, _) => ident,
        }
    }

    /// The move carried by a `B` or `W` property.
    pub fn as_move(&self) -> Option<&G::Move> {
        match self {
            Self::B(mv) | Self::W(mv) => Some(mv),
            _ => None,
        }
    }

    /// Appends the elements of `other` if both are the same list property.
    /// Otherwise `other` is handed back untouched.
    fn extend_list(&mut self, other: Self) -> Option<Self> {
        match (self, other) {
            (Self::AB(a), Self::AB(b)) | (Self::AW(a), Self::AW(b)) => a.extend(b),
            (Self::AE(a), Self::AE(b))
            | (Self::CR(a), Self::CR(b))
            | (Self::DD(a), Self::DD(b))
            | (Self::MA(a), Self::MA(b))
            | (Self::SL(a), Self::SL(b))
            | (Self::SQ(a), Self::SQ(b))
            | (Self::TR(a), Self::TR(b))
            | (Self::VW(a), Self::VW(b))
            | (Self::TB(a), Self::TB(b))
            | (Self::TW(a), Self::TW(b)) => a.extend(b),
            (Self::AR(a), Self::AR(b)) | (Self::LN(a), Self::LN(b)) => a.extend(b),
            (Self::LB(a), Self::LB(b)) => a.extend(b),
            (Self::Custom(i, a), Self::Custom(j, b)) if *i == j => a.extend(b),
            (_, other) => return Some(other),
        }
        None
    }

    /// The bracketed values of this property, escaped for SGF output.
    fn values(&self) -> Vec<String> {
        let text = |s: &str| escape(s, false);
        let point_pair = |(a, b): &(G::Point, G::Point)| format!("{}:{}", a, b);
        match self {
            Self::KO | Self::DO | Self::IT => vec![String::new()],
            Self::B(mv) | Self::W(mv) => vec![mv.to_string()],
            Self::AB(stones) | Self::AW(stones) => stones.iter().map(|s| s.to_string()).collect(),
            Self::AE(points)
            | Self::CR(points)
            | Self::DD(points)
            | Self::MA(points)
            | Self::SL(points)
            | Self::SQ(points)
            | Self::TR(points)
            | Self::VW(points)
            | Self::TB(points)
            | Self::TW(points) => {
                if points.is_empty() {
                    vec![String::new()]
                } else {
                    points.iter().map(|p| p.to_string()).collect()
                }
            }
            Self::AR(pairs) | Self::LN(pairs) => pairs.iter().map(point_pair).collect(),
            Self::LB(labels) => labels
                .iter()
                .map(|(p, label)| format!("{}:{}", p, text(label.as_str())))
                .collect(),
            Self::PL(color) => vec![color.to_string()],
            Self::DM(e)
            | Self::GB(e)
            | Self::GW(e)
            | Self::HO(e)
            | Self::UC(e)
            | Self::BM(e)
            | Self::TE(e) => vec![e.to_string()],
            Self::MN(n)
            | Self::FF(n)
            | Self::GM(n)
            | Self::ST(n)
            | Self::OB(n)
            | Self::OW(n)
            | Self::PM(n)
            | Self::HA(n) => vec![n.to_string()],
            Self::V(r) | Self::TM(r) | Self::BL(r) | Self::WL(r) | Self::KM(r) => {
                vec![r.to_string()]
            }
            Self::C(t) | Self::GC(t) => vec![text(t.as_str())],
            Self::N(t)
            | Self::CA(t)
            | Self::AN(t)
            | Self::BR(t)
            | Self::BT(t)
            | Self::CP(t)
            | Self::DT(t)
            | Self::EV(t)
            | Self::GN(t)
            | Self::ON(t)
            | Self::OT(t)
            | Self::PB(t)
            | Self::PC(t)
            | Self::PW(t)
            | Self::RE(t)
            | Self::RO(t)
            | Self::RU(t)
            | Self::SO(t)
            | Self::US(t)
            | Self::WR(t)
            | Self::WT(t) => vec![text(t.as_str())],
            Self::AP((name, version)) => {
                vec![format!("{}:{}", escape(name.as_str(), true), text(version.as_str()))]
            }
            Self::SZ((cols, rows)) if cols == rows => vec![cols.to_string()],
            Self::SZ((cols, rows)) => vec![format!("{}:{}", cols, rows)],
            Self::FG((n, name)) => vec![format!("{}:{}", n, text(name.as_str()))],
            Self::Custom(_, values) => values.iter().map(|v| text(v.as_str())).collect(),
        }
    }
}

fn escape(s: &str, colon: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == ']' || c == '\\' || (colon && c == ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl<G: CoordinateCodec> Display for Property<G> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ident())?;
        for value in self.values() {
            write!(f, "[{}]", value)?;
        }
        Ok(())
    }
}

impl<G: CoordinateCodec> Default for Node<G> {
    fn default() -> Self {
        Self { properties: Vec::new() }
    }
}

impl<G: CoordinateCodec> Node<G> {
    pub fn new(properties: Vec<Property<G>>) -> Self {
        Self { properties }
    }

    /// Adds `property` to the node. A property with the same identifier
    /// already present absorbs the new elements if it is a list, and is
    /// replaced in place otherwise.
    pub fn merge(&mut self, property: Property<G>) {
        let existing = self
            .properties
            .iter_mut()
            .find(|p| p.ident() == property.ident());

        match existing {
            Some(existing) => {
                if let Some(replacement) = existing.extend_list(property) {
                    *existing = replacement;
                }
            }
            None => self.properties.push(property),
        }
    }

    pub fn contains(&self, property: &Property<G>) -> bool {
        self.properties.contains(property)
    }

    /// The first move (`B` or `W`) in this node.
    pub fn find_move(&self) -> Option<&G::Move> {
        self.properties.iter().find_map(Property::as_move)
    }
}

impl<G: CoordinateCodec> Display for Node<G> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ";")?;
        for prop in &self.properties {
            write!(f, "{}", prop)?;
        }
        Ok(())
    }
}

/// Decodes one raw property value. `None` means the value did not make sense
/// for the identifier and the property is left out.
pub fn decode_property<G: CoordinateCodec>(
    codec: &G,
    ident: &str,
    value: &str,
) -> Option<Property<G>> {
    let point = |s: &str| codec.parse_point(s);
    let label = |s: &str| Some(parse_simple_text(s));
    let simple = || parse_simple_text(value);

    Some(match ident {
        "B" => Property::B(codec.parse_move(value)),
        "KO" => Property::KO,
        "MN" => Property::MN(parse_number(value)?),
        "W" => Property::W(codec.parse_move(value)),
        "AB" => Property::AB(codec.parse_stone_list(value)),
        "AE" => Property::AE(codec.parse_point_list(value)),
        "AW" => Property::AW(codec.parse_stone_list(value)),
        "PL" => Property::PL(parse_color(value)?),
        "C" => Property::C(parse_text(value)),
        "DM" => Property::DM(parse_emphasis(value)?),
        "GB" => Property::GB(parse_emphasis(value)?),
        "GW" => Property::GW(parse_emphasis(value)?),
        "HO" => Property::HO(parse_emphasis(value)?),
        "N" => Property::N(simple()),
        "UC" => Property::UC(parse_emphasis(value)?),
        "V" => Property::V(parse_real(value)?),
        "BM" => Property::BM(parse_emphasis(value)?),
        "DO" => Property::DO,
        "IT" => Property::IT,
        "TE" => Property::TE(parse_emphasis(value)?),
        "AR" => Property::AR(parse_compose(value, point, point).into_iter().collect()),
        "CR" => Property::CR(codec.parse_point_list(value)),
        "DD" => Property::DD(codec.parse_point_list(value)),
        "LB" => Property::LB(parse_compose(value, point, label).into_iter().collect()),
        "LN" => Property::LN(parse_compose(value, point, point).into_iter().collect()),
        "MA" => Property::MA(codec.parse_point_list(value)),
        "SL" => Property::SL(codec.parse_point_list(value)),
        "SQ" => Property::SQ(codec.parse_point_list(value)),
        "TR" => Property::TR(codec.parse_point_list(value)),
        "AP" => Property::AP(parse_compose(value, label, label)?),
        "CA" => Property::CA(simple()),
        "FF" => Property::FF(parse_number(value)?),
        "GM" => Property::GM(parse_number(value)?),
        "ST" => Property::ST(parse_number(value)?),
        "SZ" => Property::SZ(parse_board_size(value)?),
        "AN" => Property::AN(simple()),
        "BR" => Property::BR(simple()),
        "BT" => Property::BT(simple()),
        "CP" => Property::CP(simple()),
        "DT" => Property::DT(simple()),
        "EV" => Property::EV(simple()),
        "GN" => Property::GN(simple()),
        "GC" => Property::GC(parse_text(value)),
        "ON" => Property::ON(simple()),
        "OT" => Property::OT(simple()),
        "PB" => Property::PB(simple()),
        "PC" => Property::PC(simple()),
        "PW" => Property::PW(simple()),
        "RE" => Property::RE(simple()),
        "RO" => Property::RO(simple()),
        "RU" => Property::RU(simple()),
        "SO" => Property::SO(simple()),
        "TM" => Property::TM(parse_real(value)?),
        "US" => Property::US(simple()),
        "WR" => Property::WR(simple()),
        "WT" => Property::WT(simple()),
        "BL" => Property::BL(parse_real(value)?),
        "OB" => Property::OB(parse_number(value)?),
        "OW" => Property::OW(parse_number(value)?),
        "WL" => Property::WL(parse_real(value)?),
        "FG" => Property::FG(parse_compose(value, parse_number, label)?),
        "PM" => Property::PM(parse_number(value)?),
        "VW" => Property::VW(codec.parse_point_list(value)),
        "HA" => Property::HA(parse_number(value)?),
        "KM" => Property::KM(parse_real(value)?),
        "TB" => Property::TB(codec.parse_point_list(value)),
        "TW" => Property::TW(codec.parse_point_list(value)),
        _ => Property::Custom(ident.to_string(), vec![value.to_string()]),
    })
}
