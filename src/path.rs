use crate::{
    key::Key,
    node::{Cell, CellIndex, Node},
};
use std::sync::Arc;

/// A node visited by a search together with where the key fell in it.
#[derive(Debug)]
pub struct Step<'a, K, V> {
    pub node: &'a Arc<Node<K, V>>,
    pub index: CellIndex,
    /// Depth of the step above this one; `None` at the root of the search.
    pub parent: Option<u8>,
}

impl<K, V> Clone for Step<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Step<'_, K, V> {}

/// Outcome of a search, detached from the nodes it visited.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EditPoint {
    pub min_depth: u8,
    pub max_depth: u8,
    /// Depth at which an insertion must begin. Differs from `max_depth` when
    /// the key diverges from the deepest node, and is `None` when it diverges
    /// from the root of the search itself.
    pub edit_depth: Option<u8>,
    pub value_found: bool,
}

impl EditPoint {
    /// Whether inserting the key requires joining a new twig with the deepest
    /// node rather than adding a cell to it.
    pub fn is_disjoint(&self) -> bool {
        !self.value_found && self.edit_depth != Some(self.max_depth)
    }
}

/// Depth-indexed stack of the nodes visited by a search or an iteration.
#[derive(Debug)]
pub struct Path<'a, K, V> {
    steps: Vec<Option<Step<'a, K, V>>>,
    point: EditPoint,
}

impl<'a, K: Key, V> Path<'a, K, V> {
    pub(crate) fn new(min_depth: u8) -> Self {
        Self {
            steps: vec![None; K::LEVELS],
            point: EditPoint {
                min_depth,
                max_depth: min_depth,
                edit_depth: Some(min_depth),
                value_found: false,
            },
        }
    }

    pub fn point(&self) -> EditPoint {
        self.point
    }

    pub fn value_found(&self) -> bool {
        self.point.value_found
    }

    pub fn min_depth(&self) -> u8 {
        self.point.min_depth
    }

    pub fn max_depth(&self) -> u8 {
        self.point.max_depth
    }

    /// # Panics
    ///
    /// Panics if the search never visited `depth`.
    pub fn step(&self, depth: u8) -> Step<'a, K, V> {
        match self.steps[depth as usize] {
            Some(step) => step,
            None => panic!("path has no step at depth {depth}"),
        }
    }

    pub fn deepest(&self) -> Step<'a, K, V> {
        self.step(self.point.max_depth)
    }

    /// Key of the value the path currently points at.
    pub fn key(&self) -> K {
        let step = self.deepest();

        step.node.key_at(step.index.bit_index)
    }

    pub(crate) fn record(&mut self, step: Step<'a, K, V>) {
        let depth = step.node.depth;

        assert!(
            step.parent.map_or(depth == self.point.min_depth, |parent| parent < depth),
            "step at depth {depth} does not descend from {:?}",
            step.parent
        );

        self.steps[depth as usize] = Some(step);
    }

    pub(crate) fn point_mut(&mut self) -> &mut EditPoint {
        &mut self.point
    }

    pub(crate) fn step_mut(&mut self, depth: u8) -> &mut Step<'a, K, V> {
        match &mut self.steps[depth as usize] {
            Some(step) => step,
            None => panic!("path has no step at depth {depth}"),
        }
    }
}

/// Searches `root` for `key`, recording every visited node.
pub fn find<'a, K: Key, V>(
    root: &'a Arc<Node<K, V>>,
    key: K,
) -> (Option<&'a V>, Path<'a, K, V>) {
    let mut path = Path::new(root.depth);
    let mut node = root;
    let mut parent = None;

    loop {
        let depth = node.depth;
        let index = node.cell_index(key);

        path.record(Step {
            node,
            index,
            parent,
        });

        if !index.is_found {
            let point = path.point_mut();

            point.max_depth = depth;
            point.edit_depth = if index.is_beneath {
                Some(depth)
            } else {
                parent
            };
            point.value_found = false;

            return (None, path);
        }

        match node.cell(index) {
            Cell::Node(child) => {
                parent = Some(depth);
                node = child;
            }
            Cell::Value(value) => {
                let point = path.point_mut();

                point.max_depth = depth;
                point.edit_depth = Some(depth);
                point.value_found = true;

                return (Some(value), path);
            }
            Cell::Empty => panic!("occupied slot {} holds no cell", index.bit_index),
        }
    }
}

/// Searches `root` for `key` without recording a path.
pub fn lookup<K: Key, V>(root: &Arc<Node<K, V>>, key: K) -> Option<&V> {
    let mut node = root;

    loop {
        let index = node.cell_index(key);

        if !index.is_found {
            return None;
        }

        match node.cell(index) {
            Cell::Node(child) => node = child,
            Cell::Value(value) => return Some(value),
            Cell::Empty => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent;

    fn tree(keys: &[u64]) -> Arc<Node<u64, u64>> {
        let mut root = None;

        for &key in keys {
            root = Some(persistent::assoc(root.as_ref(), key, key.wrapping_mul(10)));
        }

        root.expect("at least one key")
    }

    #[test]
    fn find_in_twig() {
        let root = tree(&[1, 2, 3]);
        let (value, path) = find(&root, 2);

        assert_eq!(value, Some(&20));
        assert!(path.value_found());
        assert_eq!(path.min_depth(), u64::TWIG_DEPTH);
        assert_eq!(path.max_depth(), u64::TWIG_DEPTH);
        assert_eq!(path.point().edit_depth, Some(u64::TWIG_DEPTH));
        assert_eq!(path.key(), 2);
    }

    #[test]
    fn find_missing_slot_in_twig() {
        let root = tree(&[1, 2, 3]);
        let (value, path) = find(&root, 7);

        assert_eq!(value, None);
        assert!(!path.value_found());
        assert_eq!(path.point().edit_depth, Some(u64::TWIG_DEPTH));
        assert!(!path.point().is_disjoint());
    }

    #[test]
    fn find_diverging_from_root() {
        let root = tree(&[1, 2, 3]);
        let (value, path) = find(&root, 1 << 40);

        assert_eq!(value, None);
        assert_eq!(path.max_depth(), u64::TWIG_DEPTH);
        assert_eq!(path.point().edit_depth, None);
        assert!(path.point().is_disjoint());
    }

    #[test]
    fn find_through_internal_nodes() {
        let root = tree(&[0, 1, 1 << 40]);
        let (value, path) = find(&root, 1);

        assert_eq!(value, Some(&10));
        assert_eq!(path.min_depth(), root.depth);
        assert!(root.depth < u64::TWIG_DEPTH);
        assert_eq!(path.deepest().parent, Some(root.depth));
        assert_eq!(path.step(root.depth).node.len(), 3);
    }

    #[test]
    fn find_diverging_below_root() {
        let root = tree(&[0, 1 << 40]);
        let (value, path) = find(&root, 64);

        assert_eq!(value, None);
        assert_eq!(path.max_depth(), u64::TWIG_DEPTH);
        assert_eq!(path.point().edit_depth, Some(root.depth));
        assert!(path.point().is_disjoint());
    }

    #[test]
    fn lookup_keys() {
        let root = tree(&[0, 1, 1 << 40, u64::MAX]);

        assert_eq!(lookup(&root, 0), Some(&0));
        assert_eq!(lookup(&root, 1 << 40), Some(&(10 << 40)));
        assert_eq!(lookup(&root, u64::MAX), Some(&u64::MAX.wrapping_mul(10)));
        assert_eq!(lookup(&root, 2), None);
        assert_eq!(lookup(&root, 1 << 41), None);
    }

    #[test]
    fn lookup_agrees_with_find() {
        let keys = (0..1000u64).map(|key| key * 7919).collect::<Vec<_>>();
        let root = tree(&keys);

        for key in 0..8000 {
            assert_eq!(lookup(&root, key), find(&root, key).0, "{key}");
        }
    }
}
