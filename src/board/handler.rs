use std::collections::HashMap;

use log::trace;

use crate::{
    board::{
        BoardState, GoMoveHandler, InfoKey, Markup, MarkupType, MoveInfo, NodeInfo, Piece, game,
    },
    sgf::{
        coord::{CoordinateCodec, GoCodec},
        node::{Node, Property},
        value::{Color, SimpleText, Text, parse_game_dates},
    },
};

/// Game rules: how a move changes the board.
pub trait MoveHandler<G: CoordinateCodec> {
    /// Plays `mv` for `color`, changing `state` through
    /// [`BoardState::add_piece`] and [`BoardState::remove_piece`]. Returns the
    /// delta the move contributes (move number `1`, prisoners taken by this
    /// move), or `None` to ignore the move.
    fn make_move(&self, state: &mut BoardState<G>, color: Color, mv: &G::Move)
    -> Option<MoveInfo<G>>;

    /// Markers for the variations that can be played from the current node,
    /// given as the first move of each (if any).
    fn mark_variations(
        &self,
        _state: &BoardState<G>,
        _variations: &[Option<G::Move>],
    ) -> Vec<Markup<G>> {
        Vec::new()
    }
}

/// Receives each value of an application-specific property.
pub trait CustomPropertyHandler<G: CoordinateCodec> {
    fn handle(&self, state: &mut BoardState<G>, ident: &str, value: &str);
}

impl<G, F> CustomPropertyHandler<G> for F
where
    G: CoordinateCodec,
    F: Fn(&mut BoardState<G>, &str, &str),
{
    fn handle(&self, state: &mut BoardState<G>, ident: &str, value: &str) {
        self(state, ident, value)
    }
}

/// The rules in effect for one session: a move handler per game id, one for
/// every other game, and what to do with unknown properties.
pub struct NodeHandler<G: CoordinateCodec> {
    fallback: Box<dyn MoveHandler<G>>,
    move_handlers: HashMap<i64, Box<dyn MoveHandler<G>>>,
    custom: Option<Box<dyn CustomPropertyHandler<G>>>,
}

impl Default for NodeHandler<GoCodec> {
    fn default() -> Self {
        Self::new(GoMoveHandler).with_move_handler(game::GO, GoMoveHandler)
    }
}

impl<G: CoordinateCodec> NodeHandler<G> {
    pub fn new(fallback: impl MoveHandler<G> + 'static) -> Self {
        Self { fallback: Box::new(fallback), move_handlers: HashMap::new(), custom: None }
    }

    pub fn with_move_handler(
        mut self,
        game_id: i64,
        handler: impl MoveHandler<G> + 'static,
    ) -> Self {
        self.move_handlers.insert(game_id, Box::new(handler));
        self
    }

    pub fn with_custom_handler(mut self, handler: impl CustomPropertyHandler<G> + 'static) -> Self {
        self.custom = Some(Box::new(handler));
        self
    }

    pub fn move_handler(&self, game_id: i64) -> &dyn MoveHandler<G> {
        self.move_handlers.get(&game_id).unwrap_or(&self.fallback).as_ref()
    }
}

fn text(t: &Text) -> Option<String> {
    Some(t.0.clone())
}

fn simple(t: &SimpleText) -> Option<String> {
    Some(t.0.clone())
}

/// `DT` as ISO dates when it parses, verbatim otherwise.
fn game_dates(t: &SimpleText) -> Option<String> {
    match parse_game_dates(t.as_str()) {
        Some(dates) => Some(
            dates
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        None => simple(t),
    }
}

impl<G: CoordinateCodec> BoardState<G> {
    /// Folds `node` into the state as a new frame.
    pub fn process_node(&mut self, node: &Node<G>, handler: &NodeHandler<G>) {
        trace!("folding node with {} properties", node.properties.len());
        self.init_step();
        for property in &node.properties {
            self.fold(property, handler);
        }
    }

    /// Computes and stores the markers for `variations`.
    pub fn mark_variations(&mut self, variations: Vec<Option<G::Move>>, handler: &NodeHandler<G>) {
        let markers = handler
            .move_handler(self.config().game_id)
            .mark_variations(self, &variations);
        self.set_variations(variations, markers);
    }

    fn fold(&mut self, property: &Property<G>, handler: &NodeHandler<G>) {
        match property {
            Property::B(mv) => self.play(handler, Color::Black, mv),
            Property::W(mv) => self.play(handler, Color::White, mv),
            Property::MN(n) => self.set_move_number(*n),
            Property::AB(stones) => self.add_stones(Color::Black, stones),
            Property::AW(stones) => self.add_stones(Color::White, stones),
            Property::AE(points) => self.clear_points(points),
            Property::PL(color) => {
                self.set_color(*color);
                self.info(InfoKey::ToPlay(*color), None);
            }

            Property::C(t) => self.info(InfoKey::Comment, text(t)),
            Property::N(t) => self.info(InfoKey::NodeName, simple(t)),
            Property::V(v) => self.info(InfoKey::Value, Some(v.to_string())),
            Property::DM(e) => self.info(InfoKey::Even(*e), None),
            Property::GB(e) => self.info(InfoKey::GoodForBlack(*e), None),
            Property::GW(e) => self.info(InfoKey::GoodForWhite(*e), None),
            Property::HO(e) => self.info(InfoKey::Hotspot(*e), None),
            Property::UC(e) => self.info(InfoKey::Unclear(*e), None),
            Property::BM(e) => self.info(InfoKey::BadMove(*e), None),
            Property::TE(e) => self.info(InfoKey::Tesuji(*e), None),
            Property::DO => self.info(InfoKey::Doubtful, None),
            Property::IT => self.info(InfoKey::Interesting, None),

            Property::AR(pairs) => self.line_markup(MarkupType::Arrow, pairs),
            Property::LN(pairs) => self.line_markup(MarkupType::Line, pairs),
            Property::LB(labels) => self.add_markups(labels.iter().map(|(p, label)| {
                Markup::labelled(MarkupType::Label, p.clone(), label.as_str())
            })),
            Property::CR(points) => self.point_markup(MarkupType::Circle, points),
            Property::MA(points) => self.point_markup(MarkupType::X, points),
            Property::SL(points) => self.point_markup(MarkupType::Select, points),
            Property::SQ(points) => self.point_markup(MarkupType::Square, points),
            Property::TR(points) => self.point_markup(MarkupType::Triangle, points),
            Property::TB(points) => self.point_markup(MarkupType::BlackTerritory, points),
            Property::TW(points) => self.point_markup(MarkupType::WhiteTerritory, points),
            Property::DD(points) => self.point_inherits(MarkupType::Dim, points),
            Property::VW(points) => self.point_inherits(MarkupType::Visible, points),

            Property::GM(id) => self.set_game(*id),
            Property::SZ((columns, rows)) => self.set_board_size(*columns, *rows),
            Property::ST(style) => self.configure_variations(*style),
            Property::AP((name, version)) => {
                self.info(InfoKey::ApplicationName, simple(name));
                self.info(InfoKey::ApplicationVersion, simple(version));
            }

            Property::AN(t) => self.info(InfoKey::Annotator, simple(t)),
            Property::BR(t) => self.info(InfoKey::BlackRank, simple(t)),
            Property::BT(t) => self.info(InfoKey::BlackTeam, simple(t)),
            Property::CP(t) => self.info(InfoKey::Copyright, simple(t)),
            Property::DT(t) => self.info(InfoKey::Date, game_dates(t)),
            Property::EV(t) => self.info(InfoKey::Event, simple(t)),
            Property::GN(t) => self.info(InfoKey::GameName, simple(t)),
            Property::GC(t) => self.info(InfoKey::GameComment, text(t)),
            Property::ON(t) => self.info(InfoKey::Opening, simple(t)),
            Property::OT(t) => self.info(InfoKey::Overtime, simple(t)),
            Property::PB(t) => self.info(InfoKey::BlackPlayer, simple(t)),
            Property::PC(t) => self.info(InfoKey::Place, simple(t)),
            Property::PW(t) => self.info(InfoKey::WhitePlayer, simple(t)),
            Property::RE(t) => self.info(InfoKey::Result, simple(t)),
            Property::RO(t) => self.info(InfoKey::Round, simple(t)),
            Property::RU(t) => self.info(InfoKey::Rules, simple(t)),
            Property::SO(t) => self.info(InfoKey::Source, simple(t)),
            Property::US(t) => self.info(InfoKey::EnteredBy, simple(t)),
            Property::WR(t) => self.info(InfoKey::WhiteRank, simple(t)),
            Property::WT(t) => self.info(InfoKey::WhiteTeam, simple(t)),
            Property::TM(r) => self.info(InfoKey::TimeLimit, Some(r.to_string())),
            Property::BL(r) => self.info(InfoKey::BlackTimeLeft, Some(r.to_string())),
            Property::WL(r) => self.info(InfoKey::WhiteTimeLeft, Some(r.to_string())),
            Property::OB(n) => self.info(InfoKey::BlackMovesLeft, Some(n.to_string())),
            Property::OW(n) => self.info(InfoKey::WhiteMovesLeft, Some(n.to_string())),
            Property::HA(n) => self.info(InfoKey::Handicap, Some(n.to_string())),
            Property::KM(r) => self.info(InfoKey::Komi, Some(r.to_string())),

            // Nothing to show for these.
            Property::KO
            | Property::CA(_)
            | Property::FF(_)
            | Property::FG(_)
            | Property::PM(_) => {}

            Property::Custom(ident, values) => {
                if let Some(custom) = &handler.custom {
                    for value in values {
                        custom.handle(self, ident, value);
                    }
                }
            }
        }
    }

    fn play(&mut self, handler: &NodeHandler<G>, color: Color, mv: &G::Move) {
        let rules = handler.move_handler(self.config().game_id);
        if let Some(delta) = rules.make_move(self, color, mv) {
            self.add_move_info(delta);
        }
    }

    fn add_stones(&mut self, color: Color, stones: &[G::Stone]) {
        for stone in stones {
            self.add_piece(Piece { color, stone: stone.clone() });
        }
    }

    fn clear_points(&mut self, points: &[G::Point]) {
        for point in points {
            if let Some(piece) = self.piece_at(point).cloned() {
                self.remove_piece(&piece);
            }
        }
    }

    fn info(&mut self, key: InfoKey, message: Option<String>) {
        self.add_node_info(NodeInfo::new(key, message));
    }

    fn point_markup(&mut self, kind: MarkupType, points: &[G::Point]) {
        self.add_markups(points.iter().map(|p| Markup::at(kind, p.clone())));
    }

    fn line_markup(&mut self, kind: MarkupType, pairs: &[(G::Point, G::Point)]) {
        self.add_markups(pairs.iter().map(|(a, b)| Markup::between(kind, a.clone(), b.clone())));
    }

    fn point_inherits(&mut self, kind: MarkupType, points: &[G::Point]) {
        self.add_inherits(kind, points.iter().map(|p| Markup::at(kind, p.clone())).collect());
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        board::{BoardConfig, Prisoners},
        sgf::{XYMove, XYPoint, parse_sgf, value::Emphasis},
    };

    fn fold_all(source: &str, handler: &NodeHandler<GoCodec>) -> BoardState<GoCodec> {
        let tree = parse_sgf(source, &GoCodec);
        let mut state = BoardState::new();
        for node in tree.iter_mainline(tree.roots[0]) {
            state.process_node(node, handler);
        }
        state
    }

    #[test]
    fn root_properties_configure_the_board() {
        let state = fold_all("(;GM[1]SZ[13:9]ST[2])", &NodeHandler::default());
        assert_eq!(state.config(), BoardConfig { game_id: 1, columns: 13, rows: 9 });
        assert!(!state.show_variations());
    }

    #[test]
    fn moves_count_and_alternate() {
        let state = fold_all("(;SZ[9];B[aa];W[bb];B[cc])", &NodeHandler::default());
        let last = state.last_move_info().unwrap();
        assert_eq!(last.move_number, 3);
        assert_eq!(last.played, XYMove::to(3, 3));
        assert_eq!(state.next_color(), Color::White);
        assert_eq!(state.pieces().len(), 3);
    }

    #[test]
    fn move_number_override_applies_in_either_order() {
        let state = fold_all("(;SZ[9];B[aa];W[bb]MN[40])", &NodeHandler::default());
        assert_eq!(state.last_move_info().unwrap().move_number, 40);
        let state = fold_all("(;SZ[9];B[aa];MN[40]W[bb];B[cc])", &NodeHandler::default());
        assert_eq!(state.last_move_info().unwrap().move_number, 41);
    }

    #[test]
    fn move_number_saturates() {
        let source = "(;SZ[9];B[aa]MN[9223372036854775807];W[bb])";
        let state = fold_all(source, &NodeHandler::default());
        assert_eq!(state.last_move_info().unwrap().move_number, i64::MAX);
    }

    #[test]
    fn player_to_move_overrides_alternation() {
        let state = fold_all("(;SZ[9];B[aa]PL[B])", &NodeHandler::default());
        assert_eq!(state.next_color(), Color::Black);
        assert!(state.node_info().contains(&NodeInfo::new(InfoKey::ToPlay(Color::Black), None)));
    }

    #[test]
    fn setup_and_clear() {
        let state = fold_all("(;AB[aa:ab]AW[cc];AE[ab][cc])", &NodeHandler::default());
        assert_eq!(
            state.pieces(),
            &[Piece { color: Color::Black, stone: XYPoint::new(1, 1) }]
        );
        assert!(state.last_move_info().is_none());
    }

    #[test]
    fn annotations_become_node_info() {
        let state = fold_all("(;C[note]TE[2]DT[1996-05-06,07])", &NodeHandler::default());
        assert_eq!(
            state.node_info(),
            &[
                NodeInfo::new(InfoKey::Comment, Some("note".into())),
                NodeInfo::new(InfoKey::Tesuji(Emphasis::Strong), None),
                NodeInfo::new(InfoKey::Date, Some("1996-05-06, 1996-05-07".into())),
            ]
        );
    }

    #[test]
    fn node_markup_is_per_node_and_dim_persists() {
        let state = fold_all("(;CR[aa]DD[bb];TR[cc])", &NodeHandler::default());
        assert_eq!(
            state.markup(),
            &[Markup::at(MarkupType::Triangle, XYPoint::new(3, 3))]
        );
        assert_eq!(
            state.inherited(),
            vec![Markup::at(MarkupType::Dim, XYPoint::new(2, 2))]
        );
        let cleared = fold_all("(;DD[bb];DD[])", &NodeHandler::default());
        assert!(cleared.inherited().is_empty());
    }

    #[test]
    fn custom_properties_reach_the_custom_handler() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let handler = NodeHandler::default().with_custom_handler(
            move |state: &mut BoardState<GoCodec>, ident: &str, value: &str| {
                sink.borrow_mut().push(format!("{}={}", ident, value));
                let info = NodeInfo::new(InfoKey::Custom(ident.into()), Some(value.into()));
                state.add_node_info(info);
            },
        );
        let state = fold_all("(;XY[1][2])", &handler);
        assert_eq!(*seen.borrow(), vec!["XY=1", "XY=2"]);
        assert_eq!(state.node_info().len(), 2);
    }

    struct Nothing;

    impl MoveHandler<GoCodec> for Nothing {
        fn make_move(
            &self,
            _: &mut BoardState<GoCodec>,
            color: Color,
            mv: &XYMove,
        ) -> Option<MoveInfo<GoCodec>> {
            Some(MoveInfo { move_number: 1, color, played: *mv, prisoners: Prisoners::default() })
        }
    }

    #[test]
    fn move_handler_follows_the_game_id() {
        let handler = NodeHandler::default().with_move_handler(game::OTHELLO, Nothing);
        let state = fold_all("(;GM[2];B[aa];W[bb])", &handler);
        assert!(state.pieces().is_empty());
        assert_eq!(state.last_move_info().unwrap().move_number, 2);
        assert_eq!(state.columns(), 8);
    }
}
