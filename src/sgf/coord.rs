use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use anyhow::{Context, Result};

/// Game-specific conversion between SGF coordinate text and typed positions.
///
/// The parser only knows that `B`, `W` hold a `Move`, that `AB`, `AW` hold
/// `Stone`s and that markup properties hold `Point`s. What those look like is
/// up to the codec. A value of the form `from:to` inside a point or stone
/// list is a compressed rectangle and is expanded with [`range`].
///
/// [`range`]: CoordinateCodec::range
pub trait CoordinateCodec: Clone + Debug + PartialEq {
    type Point: Clone + Debug + PartialEq + Display;
    type Stone: Clone + Debug + PartialEq + Display;
    type Move: Clone + Debug + PartialEq + Display;

    fn parse_point(&self, from: &str) -> Option<Self::Point>;

    fn parse_stone(&self, from: &str) -> Option<Self::Stone>;

    /// Invalid input must come back as a pass.
    fn parse_move(&self, from: &str) -> Self::Move;

    /// Every point of the rectangle spanned by the upper left `from` and the
    /// lower right `to`. Empty if `to` lies left of or above `from`.
    fn range(&self, from: &Self::Point, to: &Self::Point) -> Vec<Self::Point>;

    /// Only games whose stones are plain points can cast; this is what makes
    /// compressed stone lists possible.
    fn point_to_stone(&self, _point: Self::Point) -> Option<Self::Stone> {
        None
    }

    /// The position a stone occupies. Two stones on the same point replace
    /// each other on the board.
    fn stone_point(stone: &Self::Stone) -> &Self::Point;

    /// The target of a move, `None` for a pass.
    fn move_point(mv: &Self::Move) -> Option<&Self::Point>;

    fn parse_point_list(&self, from: &str) -> Vec<Self::Point> {
        match from.split_once(':') {
            Some((fst, snd)) => match (self.parse_point(fst), self.parse_point(snd)) {
                (Some(fst), Some(snd)) => self.range(&fst, &snd),
                _ => Vec::new(),
            },
            None => self.parse_point(from).into_iter().collect(),
        }
    }

    fn parse_stone_list(&self, from: &str) -> Vec<Self::Stone> {
        match from.split_once(':') {
            Some((fst, snd)) => match (self.parse_point(fst), self.parse_point(snd)) {
                (Some(fst), Some(snd)) => self
                    .range(&fst, &snd)
                    .into_iter()
                    .filter_map(|p| self.point_to_stone(p))
                    .collect(),
                _ => Vec::new(),
            },
            None => self.parse_stone(from).into_iter().collect(),
        }
    }
}

/// A board position counted from 1 at the top left. Column first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XYPoint {
    pub x: i64,
    pub y: i64,
}

/// A move to an [`XYPoint`], or a pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct XYMove(pub Option<XYPoint>);

/// Codec for Go, where points, stones and moves are all the same thing.
///
/// Each axis is one letter: `a`..`z` map to 1..26 and `A`..`Z` to 27..52.
/// Characters after the first two are ignored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct GoCodec;

impl XYPoint {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The four orthogonal neighbours: left, top, right, bottom.
    pub fn neighbors(self) -> [XYPoint; 4] {
        [
            Self::new(self.x - 1, self.y),
            Self::new(self.x, self.y - 1),
            Self::new(self.x + 1, self.y),
            Self::new(self.x, self.y + 1),
        ]
    }
}

impl XYMove {
    /// `tt`, the conventional pass on boards up to 19×19.
    pub const PASS_SENTINEL: XYPoint = XYPoint::new(20, 20);

    pub const fn pass() -> Self {
        Self(None)
    }

    pub const fn to(x: i64, y: i64) -> Self {
        Self(Some(XYPoint::new(x, y)))
    }
}

fn decode_axis(c: char) -> Option<i64> {
    match c {
        'a'..='z' => Some((c as u32 - 'a' as u32) as i64 + 1),
        'A'..='Z' => Some((c as u32 - 'A' as u32) as i64 + 27),
        _ => None,
    }
}

fn encode_axis(n: i64) -> char {
    match n {
        1..=26 => (b'a' + (n - 1) as u8) as char,
        27..=52 => (b'A' + (n - 27) as u8) as char,
        _ => '?',
    }
}

impl FromStr for XYPoint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let a = chars
            .next()
            .context(format!("Invalid coordinate {:?}: too short", s))?;
        let b = chars
            .next()
            .context(format!("Invalid coordinate {:?}: too short", s))?;

        let x = decode_axis(a).context(format!("Invalid coordinate: first char {:?}", a))?;
        let y = decode_axis(b).context(format!("Invalid coordinate: second char {:?}", b))?;

        Ok(Self::new(x, y))
    }
}

impl Display for XYPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", encode_axis(self.x), encode_axis(self.y))
    }
}

impl Display for XYMove {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(point) => write!(f, "{}", point),
            None => Ok(()),
        }
    }
}

impl CoordinateCodec for GoCodec {
    type Point = XYPoint;
    type Stone = XYPoint;
    type Move = XYMove;

    fn parse_point(&self, from: &str) -> Option<XYPoint> {
        from.parse().ok()
    }

    fn parse_stone(&self, from: &str) -> Option<XYPoint> {
        from.parse().ok()
    }

    fn parse_move(&self, from: &str) -> XYMove {
        XYMove(from.parse().ok())
    }

    fn range(&self, from: &XYPoint, to: &XYPoint) -> Vec<XYPoint> {
        (from.x..=to.x)
            .flat_map(|x| (from.y..=to.y).map(move |y| XYPoint::new(x, y)))
            .collect()
    }

    fn point_to_stone(&self, point: XYPoint) -> Option<XYPoint> {
        Some(point)
    }

    fn stone_point(stone: &XYPoint) -> &XYPoint {
        stone
    }

    fn move_point(mv: &XYMove) -> Option<&XYPoint> {
        mv.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_one_based_axes() {
        assert_eq!(GoCodec.parse_point("aa"), Some(XYPoint::new(1, 1)));
        assert_eq!(GoCodec.parse_point("sd"), Some(XYPoint::new(19, 4)));
        assert_eq!(GoCodec.parse_point("zA"), Some(XYPoint::new(26, 27)));
        assert_eq!(GoCodec.parse_point("a"), None);
        assert_eq!(GoCodec.parse_point("a1"), None);
    }

    #[test]
    fn trailing_characters_are_ignored() {
        assert_eq!(GoCodec.parse_point("cdxyz"), Some(XYPoint::new(3, 4)));
    }

    #[test]
    fn invalid_move_is_a_pass() {
        assert_eq!(GoCodec.parse_move(""), XYMove::pass());
        assert_eq!(GoCodec.parse_move("?!"), XYMove::pass());
        assert_eq!(GoCodec.parse_move("tt"), XYMove(Some(XYMove::PASS_SENTINEL)));
    }

    #[test]
    fn compressed_list_covers_the_rectangle() {
        let mut points = GoCodec.parse_point_list("aa:bb");
        points.sort();
        assert_eq!(
            points,
            vec![
                XYPoint::new(1, 1),
                XYPoint::new(1, 2),
                XYPoint::new(2, 1),
                XYPoint::new(2, 2),
            ]
        );
        assert_eq!(GoCodec.parse_stone_list("aa:bb").len(), 4);
    }

    #[test]
    fn reversed_rectangle_is_empty() {
        assert!(GoCodec.parse_point_list("bb:aa").is_empty());
        assert!(GoCodec.parse_point_list("bb:??").is_empty());
    }

    #[test]
    fn display_inverts_parsing() {
        for s in ["aa", "sS", "Zz"] {
            let p: XYPoint = s.parse().unwrap();
            assert_eq!(p.to_string(), s);
        }
        assert_eq!(XYMove::pass().to_string(), "");
    }
}
