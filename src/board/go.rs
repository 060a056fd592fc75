//! Go rules: captures, suicide and variation markers.

use std::collections::{BTreeSet, HashMap};

use crate::{
    board::{BoardState, Markup, MarkupType, MoveHandler, MoveInfo, Piece, Prisoners},
    sgf::{
        coord::{GoCodec, XYMove, XYPoint},
        value::Color,
    },
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct GoMoveHandler;

type Board = HashMap<XYPoint, Color>;

/// The point a move is played on. `tt` is a pass on boards up to 19×19.
fn board_point(state: &BoardState<GoCodec>, mv: &XYMove) -> Option<XYPoint> {
    let point = mv.0?;
    let small = state.columns() <= 19 && state.rows() <= 19;
    if small && point == XYMove::PASS_SENTINEL { None } else { Some(point) }
}

fn snapshot(state: &BoardState<GoCodec>) -> Board {
    state.pieces().iter().map(|p| (p.stone, p.color)).collect()
}

/// Whether the group of `color` containing `point` can breathe. Points not
/// holding a stone of `color` count as alive. `visited` ends up holding the
/// group when there is no liberty.
fn has_liberty(
    board: &Board,
    (columns, rows): (i64, i64),
    color: Color,
    point: XYPoint,
    visited: &mut BTreeSet<XYPoint>,
) -> bool {
    if point.x < 1 || point.x > columns || point.y < 1 || point.y > rows {
        return false;
    }
    if board.get(&point) != Some(&color) {
        return true;
    }

    let [left, top, right, bottom] = point.neighbors();
    let empty = |p: &XYPoint| !board.contains_key(p);
    if (empty(&left) && point.x > 1)
        || (empty(&top) && point.y > 1)
        || (empty(&right) && point.x < columns)
        || (empty(&bottom) && point.y < rows)
    {
        return true;
    }

    visited.insert(point);
    point.neighbors().into_iter().any(|n| {
        board.get(&n) == Some(&color)
            && !visited.contains(&n)
            && has_liberty(board, (columns, rows), color, n, visited)
    })
}

/// Removes the group of `color` at `point` if it has no liberty and returns
/// how many stones went.
fn capture_if_dead(state: &mut BoardState<GoCodec>, color: Color, point: XYPoint) -> u32 {
    let board = snapshot(state);
    let mut group = BTreeSet::new();
    if has_liberty(&board, (state.columns(), state.rows()), color, point, &mut group) {
        return 0;
    }
    for stone in &group {
        state.remove_piece(&Piece { color, stone: *stone });
    }
    group.len() as u32
}

fn variation_label(index: usize) -> String {
    char::from_u32('A' as u32 + index as u32).map(String::from).unwrap_or_default()
}

impl MoveHandler<GoCodec> for GoMoveHandler {
    fn make_move(
        &self,
        state: &mut BoardState<GoCodec>,
        color: Color,
        mv: &XYMove,
    ) -> Option<MoveInfo<GoCodec>> {
        let Some(point) = board_point(state, mv) else {
            return Some(MoveInfo {
                move_number: 1,
                color,
                played: XYMove::pass(),
                prisoners: Prisoners::default(),
            });
        };

        state.add_piece(Piece { color, stone: point });

        let captured: u32 = point
            .neighbors()
            .into_iter()
            .map(|n| capture_if_dead(state, !color, n))
            .sum();
        let suicide = capture_if_dead(state, color, point);

        Some(MoveInfo {
            move_number: 1,
            color,
            played: XYMove(Some(point)),
            prisoners: Prisoners::taken_by(color, captured) + Prisoners::taken_by(!color, suicide),
        })
    }

    /// Variations are lettered in order. Those starting with a move are marked
    /// on its point; the rest are spread along the middle row, skipping points
    /// that already carry a marker.
    fn mark_variations(
        &self,
        state: &BoardState<GoCodec>,
        variations: &[Option<XYMove>],
    ) -> Vec<Markup<GoCodec>> {
        let mut markers = Vec::new();
        let mut unplaced = Vec::new();
        for (index, variation) in variations.iter().enumerate() {
            match variation.as_ref().and_then(|mv| board_point(state, mv)) {
                Some(point) => markers.push(Markup::labelled(
                    MarkupType::Variation,
                    point,
                    variation_label(index),
                )),
                None => unplaced.push(index),
            }
        }

        let columns = state.columns();
        let mut y = (state.rows().saturating_add(1) / 2).max(1);
        let dx = (columns.saturating_sub(1) / (unplaced.len() as i64 + 1)).max(1);
        for (n, index) in unplaced.into_iter().enumerate() {
            let start = (n as i64 + 1).saturating_mul(dx);
            let mut x = start.saturating_add(1);
            while markers.iter().any(|m| m.point == XYPoint::new(x, y)) {
                x = x.saturating_add(1);
                if x > columns {
                    x = start;
                    y = y.saturating_add(1);
                }
            }
            let point = XYPoint::new(x, y);
            markers.push(Markup::labelled(MarkupType::Variation, point, variation_label(index)));
        }

        markers.sort_by(|a, b| a.label.cmp(&b.label));
        markers
    }
}
