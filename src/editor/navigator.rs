use std::{
    fmt::{Display, Formatter},
    mem,
    str::FromStr,
};

use anyhow::{Context, Result};
use log::debug;

use crate::sgf::{
    coord::CoordinateCodec,
    node::{Node, Property},
    tree::{GameTree, TreeId},
};

/// A position in the game tree: the variation taken at each branching point
/// from the root, then the index of the node within the last sequence.
///
/// Written as `1.0:7`, or just `7` when no variation is taken.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavPath {
    pub variations: Vec<usize>,
    pub node: usize,
}

/// Walks the first game of a collection. Playing a move that is not in the
/// record opens a temporary *user branch*, which is removed again as soon as
/// the navigator steps back out of it.
#[derive(Debug, Clone)]
pub struct Navigator<G: CoordinateCodec> {
    tree: GameTree<G>,
    current: Option<TreeId>,
    index: usize,
    user_branch: bool,
}

impl<G: CoordinateCodec> Navigator<G> {
    /// Starts at the root node of the first game.
    pub fn new(tree: GameTree<G>) -> Self {
        let current = tree.roots.first().copied();
        Self { tree, current, index: 0, user_branch: false }
    }

    pub fn tree(&self) -> &GameTree<G> {
        &self.tree
    }

    /// The current subtree and node index, `None` for an empty collection.
    pub fn position(&self) -> Option<(TreeId, usize)> {
        self.current.map(|id| (id, self.index))
    }

    pub fn in_user_branch(&self) -> bool {
        self.user_branch
    }

    pub fn current_node(&self) -> Option<&Node<G>> {
        self.tree.node(self.current?, self.index)
    }

    /// Steps forward along the first variation.
    pub fn next_node(&mut self) -> Option<&Node<G>> {
        let subtree = self.tree.subtree(self.current?);
        if self.index + 1 < subtree.sequence.len() {
            self.index += 1;
        } else if let Some(&child) = subtree.children.first() {
            self.current = Some(child);
            self.index = 0;
        } else {
            return None;
        }
        self.current_node()
    }

    /// Steps back, leaving the current variation at its first node. Leaving a
    /// user branch deletes it.
    pub fn previous_node(&mut self) -> Option<&Node<G>> {
        let id = self.current?;
        if self.index > 0 {
            self.index -= 1;
        } else {
            let parent = self.tree.subtree(id).parent?;
            self.current = Some(parent);
            self.index = self.tree.subtree(parent).sequence.len().saturating_sub(1);
            if self.user_branch {
                self.delete_user_branch();
            }
        }
        self.current_node()
    }

    /// Moves to the node reached by playing `property`.
    ///
    /// The next node in the sequence is taken if it contains the move. At the
    /// end of a sequence `variation` picks a child outright (nothing happens if
    /// it does not exist); without it the first child starting with the move
    /// is taken. Anything else opens or extends a user branch.
    pub fn make_move(
        &mut self,
        property: Property<G>,
        variation: Option<usize>,
    ) -> Option<&Node<G>> {
        let id = self.current?;

        if self.user_branch {
            self.extend_user_branch(property);
            return self.current_node();
        }

        let subtree = self.tree.subtree(id);
        let at_last = self.index + 1 >= subtree.sequence.len();
        if subtree.sequence.get(self.index + 1).is_some_and(|n| n.contains(&property)) {
            self.index += 1;
            return self.current_node();
        }

        let child = match variation {
            Some(_) if !at_last => return None,
            Some(i) => Some(*subtree.children.get(i)?),
            None if at_last => subtree.children.iter().copied().find(|&c| {
                self.tree.subtree(c).sequence.first().is_some_and(|n| n.contains(&property))
            }),
            None => None,
        };

        match child {
            Some(child) => {
                self.current = Some(child);
                self.index = 0;
            }
            None => self.create_user_branch(property),
        }
        self.current_node()
    }

    /// The first move of each variation on offer: the children at the end of
    /// a sequence (`successors`), or the alternatives to the current node at
    /// the start of one. Variations starting without a move give `None`.
    pub fn variations(&self, successors: bool) -> Vec<Option<G::Move>> {
        let Some(id) = self.current else {
            return Vec::new();
        };
        let subtree = self.tree.subtree(id);
        let first_moves = |children: &[TreeId]| -> Vec<Option<G::Move>> {
            children
                .iter()
                .map(|&c| self.tree.subtree(c).sequence.first().and_then(Node::find_move).cloned())
                .collect()
        };

        if successors {
            if self.index + 1 < subtree.sequence.len() {
                Vec::new()
            } else {
                first_moves(subtree.children.as_slice())
            }
        } else if self.user_branch || self.index != 0 {
            Vec::new()
        } else {
            subtree
                .parent
                .map(|p| first_moves(self.tree.subtree(p).children.as_slice()))
                .unwrap_or_default()
        }
    }

    /// Where the navigator is. Inside a user branch this is the point the
    /// branch left the record.
    pub fn path(&self) -> NavPath {
        let Some(mut id) = self.current else {
            return NavPath::default();
        };
        let mut node = self.index;
        if self.user_branch {
            if let Some(parent) = self.tree.subtree(id).parent {
                id = parent;
                node = self.tree.subtree(parent).sequence.len().saturating_sub(1);
            }
        }
        NavPath { variations: self.tree.path_to(id), node }
    }

    /// Jumps to `path` from the root and returns every node from the root up
    /// to and including the one it lands on. A variation that does not exist
    /// stops the descent; the node index is clamped to the sequence.
    pub fn go_to(&mut self, path: &NavPath) -> Vec<&Node<G>> {
        if self.user_branch {
            if let Some(parent) = self.current.and_then(|id| self.tree.subtree(id).parent) {
                self.current = Some(parent);
                self.delete_user_branch();
            }
            self.user_branch = false;
        }

        let Some(mut id) = self.tree.roots.first().copied() else {
            self.current = None;
            return Vec::new();
        };

        let mut trail = Vec::new();
        for &variation in &path.variations {
            let subtree = self.tree.subtree(id);
            match subtree.children.get(variation) {
                Some(&child) => {
                    trail.push((id, subtree.sequence.len()));
                    id = child;
                }
                None => break,
            }
        }

        let len = self.tree.subtree(id).sequence.len();
        self.index = path.node.min(len.saturating_sub(1));
        self.current = Some(id);
        trail.push((id, (self.index + 1).min(len)));

        let tree = &self.tree;
        trail
            .into_iter()
            .flat_map(move |(id, count)| tree.subtree(id).sequence[..count].iter())
            .collect()
    }

    // -----------------------------------------------------------------------
    // User branches
    // -----------------------------------------------------------------------

    /// Splits the current sequence after the cursor. The nodes after it and
    /// the old variations move into a new subtree at child index 1, and the
    /// move goes into a new subtree at index 0.
    fn create_user_branch(&mut self, property: Property<G>) {
        let Some(id) = self.current else {
            return;
        };

        let current = self.tree.subtree_mut(id);
        let split = (self.index + 1).min(current.sequence.len());
        let rest = current.sequence.split_off(split);
        let old_children = mem::take(&mut current.children);

        let remainder = self.tree.new_subtree(Some(id), rest);
        for &child in &old_children {
            self.tree.subtree_mut(child).parent = Some(remainder);
        }
        self.tree.subtree_mut(remainder).children = old_children;

        let branch = self.tree.new_subtree(Some(id), vec![Node::new(vec![property])]);
        self.tree.subtree_mut(id).children = vec![branch, remainder];

        debug!("opened user branch {} off subtree {} at node {}", branch, id, self.index);
        self.current = Some(branch);
        self.index = 0;
        self.user_branch = true;
    }

    fn extend_user_branch(&mut self, property: Property<G>) {
        let Some(id) = self.current else {
            return;
        };
        let sequence = &mut self.tree.subtree_mut(id).sequence;
        sequence.truncate(self.index + 1);
        sequence.push(Node::new(vec![property]));
        self.index = sequence.len() - 1;
    }

    /// Undoes [`create_user_branch`] once the navigator is back at the branch
    /// point.
    ///
    /// [`create_user_branch`]: Self::create_user_branch
    fn delete_user_branch(&mut self) {
        self.user_branch = false;
        let Some(id) = self.current else {
            return;
        };
        let &[branch, remainder] = self.tree.subtree(id).children.as_slice() else {
            return;
        };

        let mut rest = mem::take(&mut self.tree.subtree_mut(remainder).sequence);
        let children = mem::take(&mut self.tree.subtree_mut(remainder).children);
        for &child in &children {
            self.tree.subtree_mut(child).parent = Some(id);
        }

        let current = self.tree.subtree_mut(id);
        current.sequence.append(&mut rest);
        current.children = children;

        self.tree.release(branch);
        self.tree.release(remainder);
        debug!("deleted user branch {} off subtree {}", branch, id);
    }
}

impl Display for NavPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.variations.is_empty() {
            return write!(f, "{}", self.node);
        }
        let variations: Vec<String> = self.variations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}:{}", variations.join("."), self.node)
    }
}

impl FromStr for NavPath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (variations, node) = match s.split_once(':') {
            Some((variations, node)) => (Some(variations), node),
            None => (None, s),
        };

        let variations = match variations {
            Some(list) => list
                .split('.')
                .map(|v| {
                    v.trim()
                        .parse::<usize>()
                        .with_context(|| format!("Invalid variation index {:?} in path {:?}", v, s))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        let node = node
            .trim()
            .parse()
            .with_context(|| format!("Invalid node index {:?} in path {:?}", node, s))?;

        Ok(Self { variations, node })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sgf::{GoCodec, Subtree, XYMove, parse_sgf};

    const GAME: &str = "(;SZ[9];B[aa];W[bb](;B[cc];W[dd])(;B[ee]))";

    fn navigator(source: &str) -> Navigator<GoCodec> {
        Navigator::new(parse_sgf(source, &GoCodec))
    }

    fn black(x: i64, y: i64) -> Property<GoCodec> {
        Property::B(XYMove::to(x, y))
    }

    fn white(x: i64, y: i64) -> Property<GoCodec> {
        Property::W(XYMove::to(x, y))
    }

    fn shape(nav: &Navigator<GoCodec>) -> Vec<Subtree<GoCodec>> {
        let tree = nav.tree();
        tree.iter_subtree(tree.roots[0]).map(|(_, s)| s.clone()).collect()
    }

    #[test]
    fn next_and_previous_walk_the_main_line() {
        let mut nav = navigator(GAME);
        let moves: Vec<String> =
            std::iter::from_fn(|| nav.next_node().map(|n| n.to_string())).collect();
        assert_eq!(moves, [";B[aa]", ";W[bb]", ";B[cc]", ";W[dd]"]);
        assert!(nav.next_node().is_none());

        let back: Vec<String> =
            std::iter::from_fn(|| nav.previous_node().map(|n| n.to_string())).collect();
        assert_eq!(back, [";B[cc]", ";W[bb]", ";B[aa]", ";SZ[9]"]);
        assert!(nav.previous_node().is_none());
    }

    #[test]
    fn playing_the_recorded_move_follows_the_record() {
        let mut nav = navigator(GAME);
        nav.make_move(black(1, 1), None);
        nav.make_move(white(2, 2), None);
        let node = nav.make_move(black(5, 5), None).cloned();
        assert_eq!(node.unwrap().properties, vec![black(5, 5)]);
        assert!(!nav.in_user_branch());
        assert_eq!(nav.path(), NavPath { variations: vec![1], node: 0 });
    }

    #[test]
    fn explicit_variation_index() {
        let mut nav = navigator(GAME);
        nav.next_node();
        nav.next_node();
        assert_eq!(nav.variations(true), vec![Some(XYMove::to(3, 3)), Some(XYMove::to(5, 5))]);
        assert!(nav.make_move(black(9, 9), Some(7)).is_none());
        assert_eq!(nav.path(), NavPath { variations: vec![], node: 2 });
        assert!(nav.make_move(black(9, 9), Some(1)).is_some());
        assert_eq!(nav.path(), NavPath { variations: vec![1], node: 0 });
        assert!(!nav.in_user_branch());
    }

    #[test]
    fn variation_index_before_the_end_of_a_sequence_is_ignored() {
        let mut nav = navigator(GAME);
        assert!(nav.make_move(white(4, 4), Some(0)).is_none());
        assert_eq!(nav.position(), Some((nav.tree().roots[0], 0)));
    }

    #[test]
    fn sibling_variations_at_the_start_of_a_sequence() {
        let mut nav = navigator(GAME);
        nav.go_to(&"1:0".parse().unwrap());
        assert_eq!(nav.variations(false), vec![Some(XYMove::to(3, 3)), Some(XYMove::to(5, 5))]);
        assert!(nav.variations(true).is_empty());
        nav.previous_node();
        assert!(nav.variations(false).is_empty());
    }

    #[test]
    fn user_branch_mid_sequence_is_removed_on_the_way_back() {
        let mut nav = navigator(GAME);
        let before = shape(&nav);

        nav.next_node();
        let node = nav.make_move(white(7, 7), None).cloned();
        assert_eq!(node.unwrap().properties, vec![white(7, 7)]);
        assert!(nav.in_user_branch());
        assert_eq!(nav.path(), NavPath { variations: vec![], node: 1 });

        let root = nav.tree().subtree(nav.tree().roots[0]);
        assert_eq!(root.sequence.len(), 2);
        assert_eq!(root.children.len(), 2);
        let remainder = nav.tree().subtree(root.children[1]);
        assert_eq!(remainder.sequence[0].properties, vec![white(2, 2)]);
        assert_eq!(remainder.children.len(), 2);

        nav.make_move(black(8, 8), None);
        nav.make_move(white(9, 9), None);
        nav.previous_node();
        nav.previous_node();
        assert!(nav.in_user_branch());

        let back = nav.previous_node().cloned();
        assert_eq!(back.unwrap().properties, vec![black(1, 1)]);
        assert!(!nav.in_user_branch());
        assert_eq!(shape(&nav), before);
    }

    #[test]
    fn user_branch_at_the_end_of_a_sequence() {
        let mut nav = navigator(GAME);
        let before = shape(&nav);
        nav.go_to(&"0:1".parse().unwrap());
        nav.make_move(white(9, 9), None);
        assert!(nav.in_user_branch());
        let root = nav.tree().subtree(nav.tree().roots[0]);
        let remainder = nav.tree().subtree(root.children[1]);
        assert!(remainder.sequence.is_empty());
        assert!(remainder.children.is_empty());

        nav.previous_node();
        assert_eq!(shape(&nav), before);
        assert_eq!(nav.path(), NavPath { variations: vec![0], node: 1 });
    }

    #[test]
    fn moves_inside_a_user_branch_replace_what_follows() {
        let mut nav = navigator(GAME);
        nav.make_move(black(9, 9), None);
        nav.make_move(white(8, 8), None);
        nav.make_move(black(7, 7), None);
        nav.previous_node();
        nav.make_move(black(6, 6), None);
        let (id, index) = nav.position().unwrap();
        let sequence = &nav.tree().subtree(id).sequence;
        assert_eq!(index, 2);
        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence[2].properties, vec![black(6, 6)]);
        assert!(nav.next_node().is_none());
    }

    #[test]
    fn go_to_returns_the_line_and_clamps() {
        let mut nav = navigator(GAME);
        let nodes: Vec<String> = nav
            .go_to(&NavPath { variations: vec![0], node: 99 })
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(nodes, [";SZ[9]", ";B[aa]", ";W[bb]", ";B[cc]", ";W[dd]"]);
        assert_eq!(nav.path(), NavPath { variations: vec![0], node: 1 });

        let nodes = nav.go_to(&NavPath { variations: vec![5, 0], node: 1 });
        assert_eq!(nodes.len(), 2);
        assert_eq!(nav.path(), NavPath { variations: vec![], node: 1 });
    }

    #[test]
    fn go_to_leaves_a_user_branch() {
        let mut nav = navigator(GAME);
        let before = shape(&nav);
        nav.make_move(white(9, 9), None);
        assert!(nav.in_user_branch());
        nav.go_to(&NavPath::default());
        assert!(!nav.in_user_branch());
        assert_eq!(shape(&nav), before);
    }

    #[test]
    fn empty_collection() {
        let mut nav = navigator("no game here");
        assert!(nav.next_node().is_none());
        assert!(nav.previous_node().is_none());
        assert!(nav.make_move(black(1, 1), None).is_none());
        assert!(nav.variations(true).is_empty());
        assert_eq!(nav.path(), NavPath::default());
        assert!(nav.go_to(&NavPath::default()).is_empty());
    }

    #[test]
    fn path_text() {
        let path: NavPath = "1.0:7".parse().unwrap();
        assert_eq!(path, NavPath { variations: vec![1, 0], node: 7 });
        assert_eq!(path.to_string(), "1.0:7");
        assert_eq!("3".parse::<NavPath>().unwrap(), NavPath { variations: vec![], node: 3 });
        assert_eq!(NavPath::default().to_string(), "0");
        assert!("1.x:2".parse::<NavPath>().is_err());
        assert!("1:".parse::<NavPath>().is_err());
    }
}
