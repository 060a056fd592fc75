use std::{
    fmt::{Display, Formatter},
    ops::Not,
};

use chrono::{Datelike, NaiveDate};

/// The SGF `Color` value type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

/// The SGF `Double` value type: `1` is normal emphasis, `2` strong.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Normal,
    Strong,
}

/// Formatted text; line breaks are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Text(pub String);

/// Single-line text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleText(pub String);

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Black => write!(f, "B"),
            Self::White => write!(f, "W"),
        }
    }
}

impl Display for Emphasis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "1"),
            Self::Strong => write!(f, "2"),
        }
    }
}

impl Text {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SimpleText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Text {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for SimpleText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Value decoding. None of these fail loudly: a value that does not parse is
// reported as `None` and the caller drops the property.
// ---------------------------------------------------------------------------

pub fn parse_number(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

pub fn parse_real(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

pub fn parse_color(s: &str) -> Option<Color> {
    match s {
        "B" => Some(Color::Black),
        "W" => Some(Color::White),
        _ => None,
    }
}

pub fn parse_emphasis(s: &str) -> Option<Emphasis> {
    match s {
        "1" => Some(Emphasis::Normal),
        "2" => Some(Emphasis::Strong),
        _ => None,
    }
}

/// Whitespace other than a line break becomes a space.
pub fn parse_text(s: &str) -> Text {
    Text(
        s.chars()
            .map(|c| if c.is_whitespace() && c != '\n' { ' ' } else { c })
            .collect(),
    )
}

/// All whitespace becomes a space.
pub fn parse_simple_text(s: &str) -> SimpleText {
    SimpleText(s.chars().map(|c| if c.is_whitespace() { ' ' } else { c }).collect())
}

/// Splits a composed value at its first `:` and decodes both halves.
/// A value without a colon is not a composition.
pub fn parse_compose<S, T>(
    s: &str,
    parse_fst: impl FnOnce(&str) -> Option<S>,
    parse_snd: impl FnOnce(&str) -> Option<T>,
) -> Option<(S, T)> {
    let (fst, snd) = s.split_once(':')?;
    Some((parse_fst(fst)?, parse_snd(snd)?))
}

/// `SZ` takes either a single number for square boards or `columns:rows`.
pub fn parse_board_size(s: &str) -> Option<(i64, i64)> {
    if s.contains(':') {
        parse_compose(s, parse_number, parse_number)
    } else {
        parse_number(s).map(|n| (n, n))
    }
}

/// Reads a `DT` value: comma separated ISO dates where later entries may drop
/// the year (`MM-DD`) or the year and month (`DD`) of the entry before them.
/// Returns `None` if any part is not a full calendar date.
pub fn parse_game_dates(s: &str) -> Option<Vec<NaiveDate>> {
    let mut dates = Vec::new();
    let mut last: Option<NaiveDate> = None;

    for part in s.split(',').map(str::trim) {
        let date = match (part.split('-').count(), last) {
            (3, _) => NaiveDate::parse_from_str(part, "%Y-%m-%d").ok()?,
            (2, Some(prev)) => {
                NaiveDate::parse_from_str(&format!("{}-{}", prev.year(), part), "%Y-%m-%d").ok()?
            }
            (1, Some(prev)) => {
                NaiveDate::from_ymd_opt(prev.year(), prev.month(), part.parse().ok()?)?
            }
            _ => return None,
        };
        dates.push(date);
        last = Some(date);
    }

    Some(dates)
}
