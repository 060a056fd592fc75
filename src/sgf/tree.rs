use std::mem;

use crate::sgf::{coord::CoordinateCodec, node::Node};

pub type TreeId = usize;

/// An SGF `GameTree`: a sequence of nodes followed by its variations.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtree<G: CoordinateCodec> {
    pub sequence: Vec<Node<G>>,
    pub parent: Option<TreeId>,
    pub children: Vec<TreeId>,
}

/// A parsed collection. All subtrees live in one arena and refer to each
/// other by index; the parent link is for navigation only, ownership follows
/// the child lists.
#[derive(Debug, Clone)]
pub struct GameTree<G: CoordinateCodec> {
    /// Arena storage, indexed by `TreeId`.
    pub(crate) trees: Vec<Subtree<G>>,
    /// Released slots, reused before the arena grows.
    free: Vec<TreeId>,
    /// One root per top-level game record in the file.
    pub roots: Vec<TreeId>,
}

impl<G: CoordinateCodec> Default for GameTree<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: CoordinateCodec> GameTree<G> {
    pub fn new() -> Self {
        Self { trees: Vec::new(), free: Vec::new(), roots: Vec::new() }
    }

    pub fn subtree(&self, id: TreeId) -> &Subtree<G> {
        &self.trees[id]
    }

    pub(crate) fn subtree_mut(&mut self, id: TreeId) -> &mut Subtree<G> {
        &mut self.trees[id]
    }

    pub fn node(&self, id: TreeId, index: usize) -> Option<&Node<G>> {
        self.trees.get(id)?.sequence.get(index)
    }

    /// Creates an unlinked subtree. The caller is responsible for putting it
    /// into a child list or into `roots`.
    pub(crate) fn new_subtree(&mut self, parent: Option<TreeId>, sequence: Vec<Node<G>>) -> TreeId {
        let subtree = Subtree { sequence, parent, children: Vec::new() };
        match self.free.pop() {
            Some(id) => {
                self.trees[id] = subtree;
                id
            }
            None => {
                self.trees.push(subtree);
                self.trees.len() - 1
            }
        }
    }

    /// Creates a subtree as the last child of `parent`, or as a new root.
    pub(crate) fn push_child(&mut self, parent: Option<TreeId>) -> TreeId {
        let id = self.new_subtree(parent, Vec::new());
        match parent {
            Some(p) => self.trees[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Frees `id` and everything below it. The caller must already have
    /// removed it from its parent's child list.
    pub(crate) fn release(&mut self, id: TreeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            stack.append(&mut self.trees[id].children);
            self.trees[id].sequence.clear();
            self.trees[id].parent = None;
            self.free.push(id);
        }
    }

    /// Removes subtrees without nodes, handing their variations to their
    /// parent in their place.
    pub(crate) fn hoist_empty(&mut self) {
        let order: Vec<TreeId> =
            self.roots.iter().flat_map(|&root| self.post_order(root)).collect();

        for id in order {
            if !self.trees[id].sequence.is_empty() {
                continue;
            }
            let children = mem::take(&mut self.trees[id].children);
            let parent = self.trees[id].parent;
            for &child in &children {
                self.trees[child].parent = parent;
            }
            let siblings = match parent {
                Some(p) => &mut self.trees[p].children,
                None => &mut self.roots,
            };
            if let Some(pos) = siblings.iter().position(|&c| c == id) {
                siblings.splice(pos..=pos, children);
            }
            self.release(id);
        }
    }

    /// Children before parents. Nesting can run as deep as the input is
    /// long, so the walk keeps its own stack.
    fn post_order(&self, root: TreeId) -> Vec<TreeId> {
        let mut out = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            stack.extend(self.trees[id].children.iter().rev().map(|&c| (c, false)));
        }
        out
    }

    /// Child indices leading from the root down to `id`.
    pub fn path_to(&self, id: TreeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.trees[current].parent {
            if let Some(pos) = self.trees[parent].children.iter().position(|&c| c == current) {
                path.push(pos);
            }
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn iter_mainline(&self, start: TreeId) -> MainlineIter<'_, G> {
        MainlineIter { tree: self, position: Some((start, 0)) }
    }

    pub fn iter_subtree(&self, start: TreeId) -> SubtreeIter<'_, G> {
        SubtreeIter { tree: self, stack: vec![start] }
    }
}

/// Every node on the main line of play, following the first variation at
/// each branching point.
pub struct MainlineIter<'a, G: CoordinateCodec> {
    tree: &'a GameTree<G>,
    position: Option<(TreeId, usize)>,
}

impl<'a, G: CoordinateCodec> Iterator for MainlineIter<'a, G> {
    type Item = &'a Node<G>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, index) = self.position?;
            let subtree = &self.tree.trees[id];
            if let Some(node) = subtree.sequence.get(index) {
                self.position = Some((id, index + 1));
                return Some(node);
            }
            self.position = subtree.children.first().map(|&child| (child, 0));
        }
    }
}

/// DFS pre-order traversal over every subtree reachable from a given root.
pub struct SubtreeIter<'a, G: CoordinateCodec> {
    tree: &'a GameTree<G>,
    stack: Vec<TreeId>,
}

impl<'a, G: CoordinateCodec> Iterator for SubtreeIter<'a, G> {
    type Item = (TreeId, &'a Subtree<G>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let subtree = &self.tree.trees[id];
        // Push children in reverse so the leftmost child is visited first.
        self.stack.extend(subtree.children.iter().rev().copied());
        Some((id, subtree))
    }
}

#[cfg(test)]
mod tests {
    use crate::sgf::{GoCodec, parse_sgf};

    #[test]
    fn mainline_follows_first_variations() {
        let tree = parse_sgf("(;SZ[9];B[aa](;W[bb];B[cc])(;W[dd]))", &GoCodec);
        let moves: Vec<String> = tree
            .iter_mainline(tree.roots[0])
            .filter_map(|n| n.find_move().map(|m| m.to_string()))
            .collect();
        assert_eq!(moves, ["aa", "bb", "cc"]);
    }

    #[test]
    fn subtree_walk_is_preorder() {
        let tree = parse_sgf("(;C[r](;C[a](;C[aa])(;C[ab]))(;C[b]))", &GoCodec);
        let firsts: Vec<String> = tree
            .iter_subtree(tree.roots[0])
            .map(|(_, s)| s.sequence[0].to_string())
            .collect();
        assert_eq!(firsts, [";C[r]", ";C[a]", ";C[aa]", ";C[ab]", ";C[b]"]);
    }

    #[test]
    fn path_to_lists_child_indices() {
        let tree = parse_sgf("(;C[r](;C[a])(;C[b](;C[ba])(;C[bb])))", &GoCodec);
        let (id, _) = tree
            .iter_subtree(tree.roots[0])
            .find(|(_, s)| s.sequence[0].to_string() == ";C[bb]")
            .unwrap();
        assert_eq!(tree.path_to(id), vec![1, 1]);
        assert!(tree.path_to(tree.roots[0]).is_empty());
    }

    #[test]
    fn released_slots_are_reused() {
        let mut tree = parse_sgf::<GoCodec>("(;B[aa](;W[bb])(;W[cc]))", &GoCodec);
        let root = tree.roots[0];
        let second = tree.subtree(root).children[1];
        tree.subtree_mut(root).children.pop();
        tree.release(second);
        let reused = tree.new_subtree(Some(root), Vec::new());
        assert_eq!(reused, second);
    }

    #[test]
    fn deeply_nested_variations() {
        const DEPTH: usize = 100_000;
        let source = format!("(;GM[1]{}{})", "(;B[aa]".repeat(DEPTH), ")".repeat(DEPTH));
        let tree = parse_sgf(&source, &GoCodec);
        assert_eq!(tree.iter_mainline(tree.roots[0]).count(), DEPTH + 1);
        assert_eq!(tree.iter_subtree(tree.roots[0]).count(), DEPTH + 1);
    }

    #[test]
    fn deeply_nested_empty_trees_are_hoisted() {
        const DEPTH: usize = 100_000;
        let source = format!("(;C[r]{};B[aa]{})", "(".repeat(DEPTH), ")".repeat(DEPTH));
        let mut tree = parse_sgf(&source, &GoCodec);
        let root = tree.roots[0];
        assert_eq!(tree.subtree(root).children.len(), 1);
        let leaf = tree.subtree(root).children[0];
        assert_eq!(tree.subtree(leaf).sequence[0].to_string(), ";B[aa]");
        assert_eq!(tree.path_to(leaf), vec![0]);

        tree.subtree_mut(root).children.clear();
        tree.release(leaf);
        assert_eq!(tree.new_subtree(None, Vec::new()), leaf);
    }
}
