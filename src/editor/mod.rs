mod navigator;
pub use navigator::{NavPath, Navigator};

use anyhow::Result;
use log::debug;

use crate::{
    board::{BoardData, BoardState, NodeHandler, VariationMode},
    sgf::{
        coord::CoordinateCodec,
        node::Property,
        parse_sgf,
        value::Color,
    },
};

/// How the editor reacts to moves played on the board.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Moves follow the record where they can and open user branches where
    /// they cannot.
    #[default]
    FreePlay,
    /// Like `FreePlay`, then the reply from the record is played right away.
    Countermove,
    /// Moves are ignored.
    Disable,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct EditorOptions {
    /// Overrides the `ST` property when set.
    pub show_variations: Option<bool>,
    pub interaction_mode: InteractionMode,
}

/// Everything needed to rebuild an editor: the record, where it was and how
/// it was set up. User branches are not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub source: String,
    pub path: NavPath,
    pub options: EditorOptions,
}

pub enum EditCommand<G: CoordinateCodec> {
    Advance,
    Retreat,
    Play { mv: G::Move, variation: Option<usize> },
    GoTo(NavPath),
}

/// Ties the navigator to the board state: every step through the tree is
/// mirrored on the board, and the result handed back as [`BoardData`].
pub struct Editor<G: CoordinateCodec> {
    source: String,
    navigator: Navigator<G>,
    state: BoardState<G>,
    handler: NodeHandler<G>,
    pub options: EditorOptions,
}

impl<G: CoordinateCodec> Editor<G> {
    /// Reads `source` and shows the root node of its first game.
    pub fn load(
        source: impl Into<String>,
        codec: G,
        handler: NodeHandler<G>,
        options: EditorOptions,
    ) -> Self {
        Self::load_at(source, codec, handler, options, &NavPath::default())
    }

    pub fn load_at(
        source: impl Into<String>,
        codec: G,
        handler: NodeHandler<G>,
        options: EditorOptions,
        path: &NavPath,
    ) -> Self {
        let source = source.into();
        let navigator = Navigator::new(parse_sgf(&source, &codec));
        let mut editor = Self { source, navigator, state: BoardState::new(), handler, options };
        editor.jump(path);
        debug!("loaded game at {}", editor.navigator.path());
        editor
    }

    pub fn restore(snapshot: Snapshot, codec: G, handler: NodeHandler<G>) -> Self {
        Self::load_at(snapshot.source, codec, handler, snapshot.options, &snapshot.path)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { source: self.source.clone(), path: self.navigator.path(), options: self.options }
    }

    pub fn navigator(&self) -> &Navigator<G> {
        &self.navigator
    }

    pub fn state(&self) -> &BoardState<G> {
        &self.state
    }

    pub fn data(&self) -> BoardData<G> {
        self.state.data()
    }

    pub fn path(&self) -> NavPath {
        self.navigator.path()
    }

    /// The variations on offer at the current node, in the mode `ST` asks for.
    pub fn variations(&self) -> Vec<Option<G::Move>> {
        self.navigator.variations(self.state.variation_mode() == VariationMode::Successors)
    }

    /// Replays the board from scratch up to `path`.
    pub fn jump(&mut self, path: &NavPath) -> BoardData<G> {
        self.state = BoardState::new();
        for node in self.navigator.go_to(path) {
            self.state.process_node(node, &self.handler);
        }
        self.finish_step()
    }

    pub fn advance(&mut self) -> Option<BoardData<G>> {
        let node = self.navigator.next_node()?;
        self.state.process_node(node, &self.handler);
        Some(self.finish_step())
    }

    /// Steps back one node. The board drops the last two frames and then
    /// folds the node it lands on again, which restores its node-level state.
    pub fn retreat(&mut self) -> Option<BoardData<G>> {
        let node = self.navigator.previous_node()?;
        self.state.step_back();
        self.state.process_node(node, &self.handler);
        Some(self.finish_step())
    }

    /// Plays `mv` for whoever is to move. `variation` names the variation the
    /// move was chosen from, if any; with sibling variations on display that
    /// means going back one node first.
    pub fn play(&mut self, mv: G::Move, variation: Option<usize>) -> Option<BoardData<G>> {
        if self.options.interaction_mode == InteractionMode::Disable {
            return None;
        }

        let mut changed = None;
        if variation.is_some()
            && self.state.variation_mode() == VariationMode::Siblings
            && self.shows_variations()
        {
            changed = self.retreat();
        }

        let property = match self.state.next_color() {
            Color::Black => Property::B(mv),
            Color::White => Property::W(mv),
        };
        let Some(node) = self.navigator.make_move(property, variation) else {
            return changed;
        };
        self.state.process_node(node, &self.handler);
        let data = self.finish_step();

        if self.options.interaction_mode == InteractionMode::Countermove {
            return self.advance().or(Some(data));
        }
        Some(data)
    }

    pub fn apply(&mut self, command: EditCommand<G>) -> Option<BoardData<G>> {
        match command {
            EditCommand::Advance => self.advance(),
            EditCommand::Retreat => self.retreat(),
            EditCommand::Play { mv, variation } => self.play(mv, variation),
            EditCommand::GoTo(path) => Some(self.jump(&path)),
        }
    }

    fn shows_variations(&self) -> bool {
        self.options.show_variations.unwrap_or(self.state.show_variations())
    }

    fn finish_step(&mut self) -> BoardData<G> {
        if self.shows_variations() {
            let variations = self.variations();
            self.state.mark_variations(variations, &self.handler);
        }
        self.state.data()
    }
}

/// A front-end driving an [`Editor`].
pub trait Adapter<G: CoordinateCodec> {
    fn render(&mut self, editor: &Editor<G>) -> Result<()>;

    /// `None` ends the session.
    fn next_command(&mut self) -> Result<Option<EditCommand<G>>>;
}

pub fn run_editor<G: CoordinateCodec, A: Adapter<G>>(
    mut editor: Editor<G>,
    adapter: &mut A,
) -> Result<()> {
    adapter.render(&editor)?;
    while let Some(command) = adapter.next_command()? {
        match editor.apply(command) {
            Some(_) => adapter.render(&editor)?,
            None => debug!("command changed nothing at {}", editor.path()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        board::{MarkupType, Prisoners},
        sgf::{GoCodec, XYMove, XYPoint},
    };

    const GAME: &str = "(;GM[1]SZ[9]C[start];B[cc];W[gg](;B[cg]C[main])(;B[gc]LB[ee:x]))";

    fn editor(source: &str, options: EditorOptions) -> Editor<GoCodec> {
        Editor::load(source, GoCodec, NodeHandler::default(), options)
    }

    #[test]
    fn load_shows_the_root() {
        let editor = editor(GAME, EditorOptions::default());
        let data = editor.data();
        assert!(data.pieces.is_empty());
        assert_eq!(data.config.columns, 9);
        assert_eq!(data.node_info[0].message.as_deref(), Some("start"));
        assert_eq!(editor.path(), NavPath::default());
    }

    #[test]
    fn walking_forward_and_back_restores_every_board() {
        let mut editor = editor(GAME, EditorOptions::default());
        let mut boards = vec![editor.data()];
        while let Some(data) = editor.advance() {
            boards.push(data);
        }
        assert_eq!(boards.len(), 4);
        boards.pop();
        while let Some(data) = editor.retreat() {
            assert_eq!(Some(&data), boards.last());
            boards.pop();
        }
        assert!(boards.is_empty());
    }

    #[test]
    fn successor_variations_are_marked() {
        let mut editor = editor(GAME, EditorOptions::default());
        editor.advance();
        let data = editor.advance().unwrap();
        let labels: Vec<(Option<String>, XYPoint)> =
            data.variations.iter().map(|m| (m.label.clone(), m.point)).collect();
        assert_eq!(
            labels,
            vec![(Some("A".into()), XYPoint::new(3, 7)), (Some("B".into()), XYPoint::new(7, 3))]
        );
        assert!(data.variations.iter().all(|m| m.kind == MarkupType::Variation));

        let mut hidden = Editor::load(
            GAME,
            GoCodec,
            NodeHandler::default(),
            EditorOptions { show_variations: Some(false), ..Default::default() },
        );
        hidden.advance();
        assert!(hidden.advance().unwrap().variations.is_empty());
    }

    #[test]
    fn playing_off_the_record_and_back_is_symmetric() {
        let mut editor = editor(GAME, EditorOptions::default());
        editor.advance();
        let before = editor.data();
        let tree_before = editor.navigator().tree().clone();

        let played = editor.play(XYMove::to(5, 5), None).unwrap();
        assert!(editor.navigator().in_user_branch());
        assert_eq!(played.last_move.as_ref().unwrap().played, XYMove::to(5, 5));
        assert_eq!(played.last_move.as_ref().unwrap().color, Color::White);
        editor.play(XYMove::to(6, 6), None).unwrap();

        editor.retreat();
        let back = editor.retreat().unwrap();
        assert_eq!(back, before);
        assert!(!editor.navigator().in_user_branch());
        let tree = editor.navigator().tree();
        assert_eq!(
            tree.iter_mainline(tree.roots[0]).count(),
            tree_before.iter_mainline(tree_before.roots[0]).count()
        );
    }

    #[test]
    fn recorded_move_follows_the_record() {
        let mut editor = editor(GAME, EditorOptions::default());
        editor.advance();
        editor.advance();
        let data = editor.play(XYMove::to(7, 3), None).unwrap();
        assert!(!editor.navigator().in_user_branch());
        assert_eq!(editor.path(), NavPath { variations: vec![1], node: 0 });
        assert_eq!(data.markup[0].label.as_deref(), Some("x"));
    }

    #[test]
    fn countermove_answers_from_the_record() {
        let mut editor = editor(
            GAME,
            EditorOptions { interaction_mode: InteractionMode::Countermove, ..Default::default() },
        );
        let data = editor.play(XYMove::to(3, 3), None).unwrap();
        let last = data.last_move.unwrap();
        assert_eq!(last.played, XYMove::to(7, 7));
        assert_eq!(last.move_number, 2);
    }

    #[test]
    fn disabled_editor_ignores_moves() {
        let mut editor = editor(
            GAME,
            EditorOptions { interaction_mode: InteractionMode::Disable, ..Default::default() },
        );
        assert!(editor.play(XYMove::to(3, 3), None).is_none());
        assert!(editor.advance().is_some());
    }

    #[test]
    fn sibling_variations_step_back_before_playing() {
        let source = "(;ST[1]SZ[9];B[aa](;W[bb])(;W[cc]))";
        let mut editor = editor(source, EditorOptions::default());
        editor.advance();
        let data = editor.advance().unwrap();
        assert_eq!(data.variations.len(), 2);

        let data = editor.play(XYMove::to(3, 3), Some(1)).unwrap();
        assert_eq!(data.last_move.unwrap().played, XYMove::to(3, 3));
        assert_eq!(editor.path(), NavPath { variations: vec![1], node: 0 });
        assert!(!editor.navigator().in_user_branch());
    }

    #[test]
    fn player_to_move_survives_a_step_back() {
        let source = "(;SZ[9];B[aa]PL[B];B[bb])";
        let mut editor = editor(source, EditorOptions::default());
        editor.advance();
        editor.advance();
        editor.retreat();
        assert_eq!(editor.state().next_color(), Color::Black);
    }

    #[test]
    fn snapshot_and_restore() {
        let mut editor = editor(GAME, EditorOptions::default());
        editor.advance();
        editor.advance();
        editor.advance();
        let snapshot = editor.snapshot();
        assert_eq!(snapshot.path, NavPath { variations: vec![0], node: 0 });

        let restored = Editor::restore(snapshot, GoCodec, NodeHandler::default());
        assert_eq!(restored.data(), editor.data());
    }

    #[test]
    fn captures_accumulate_across_moves() {
        let source = "(;SZ[9];B[aa];W[ba];B[ii];W[ab])";
        let mut editor = editor(source, EditorOptions::default());
        let mut last = None;
        while let Some(data) = editor.advance() {
            last = data.last_move;
        }
        assert_eq!(last.unwrap().prisoners, Prisoners { by_black: 0, by_white: 1 });
    }

    #[test]
    fn retreating_over_a_capture_restores_stones_and_prisoners() {
        let source = "(;SZ[9];B[aa];W[ba];B[ii];W[ab];B[cc])";
        let mut editor = editor(source, EditorOptions::default());
        let mut boards = vec![editor.data()];
        while let Some(data) = editor.advance() {
            boards.push(data);
        }
        let captured = &boards[4];
        assert_eq!(
            captured.last_move.as_ref().unwrap().prisoners,
            Prisoners { by_black: 0, by_white: 1 }
        );
        assert!(!captured.pieces.iter().any(|p| p.stone == XYPoint::new(1, 1)));

        editor.retreat();
        let before_capture = editor.retreat().unwrap();
        assert_eq!(before_capture, boards[3]);
        assert_eq!(before_capture.last_move.unwrap().prisoners, Prisoners::default());
        assert!(before_capture.pieces.iter().any(|p| p.stone == XYPoint::new(1, 1)));

        while editor.retreat().is_some() {}
        assert_eq!(editor.data(), boards[0]);
    }

    #[test]
    fn capture_in_a_user_branch_is_undone() {
        let source = "(;SZ[9];B[aa];W[ba];B[ii])";
        let mut editor = editor(source, EditorOptions::default());
        while editor.advance().is_some() {}
        let before = editor.data();

        let played = editor.play(XYMove::to(1, 2), None).unwrap();
        assert!(editor.navigator().in_user_branch());
        assert_eq!(
            played.last_move.as_ref().unwrap().prisoners,
            Prisoners { by_black: 0, by_white: 1 }
        );
        assert!(!played.pieces.iter().any(|p| p.stone == XYPoint::new(1, 1)));

        let back = editor.retreat().unwrap();
        assert_eq!(back, before);
        assert_eq!(back.last_move.unwrap().prisoners, Prisoners::default());
        assert!(!editor.navigator().in_user_branch());
    }

    struct Script {
        commands: Vec<EditCommand<GoCodec>>,
        renders: Vec<NavPath>,
    }

    impl Adapter<GoCodec> for Script {
        fn render(&mut self, editor: &Editor<GoCodec>) -> Result<()> {
            self.renders.push(editor.path());
            Ok(())
        }

        fn next_command(&mut self) -> Result<Option<EditCommand<GoCodec>>> {
            Ok(if self.commands.is_empty() { None } else { Some(self.commands.remove(0)) })
        }
    }

    #[test]
    fn run_editor_renders_after_each_change() {
        let mut script = Script {
            commands: vec![
                EditCommand::Retreat,
                EditCommand::Advance,
                EditCommand::GoTo(NavPath { variations: vec![1], node: 0 }),
            ],
            renders: Vec::new(),
        };
        run_editor(editor(GAME, EditorOptions::default()), &mut script).unwrap();
        assert_eq!(
            script.renders,
            vec![
                NavPath::default(),
                NavPath { variations: vec![], node: 1 },
                NavPath { variations: vec![1], node: 0 },
            ]
        );
    }
}
