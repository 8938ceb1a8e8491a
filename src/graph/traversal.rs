//! Graph traversal and diamond validation

use crate::machine::TERMINAL_DEPTH;
use crate::model::{Node, NodeIndex, MAX_NODES, ROOT, TERMINAL};
use crate::store::NodeStore;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Which references a traversal follows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalDirection {
    /// Left and right children only
    Children,
    /// Children and siblings
    All,
}

/// Read-only view over a node store
pub struct GraphView<'a, S: NodeStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: NodeStore + ?Sized> GraphView<'a, S> {
    pub fn new(store: &'a S) -> Self {
        GraphView { store }
    }

    /// Read a node, failing if it was never written
    pub fn node(&self, index: NodeIndex) -> Result<Node> {
        self.store.read(index)
    }

    fn neighbors(&self, node: &Node, direction: TraversalDirection) -> Vec<NodeIndex> {
        let mut out = node.children();
        if direction == TraversalDirection::All {
            out.extend(node.siblings.iter().copied().filter(|&s| s != 0));
        }
        out
    }

    /// Breadth-first traversal from `start`, returning each node with its
    /// distance in edges
    pub fn bfs(
        &self,
        start: NodeIndex,
        direction: TraversalDirection,
    ) -> Result<Vec<(NodeIndex, usize)>> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut results = Vec::new();

        visited.insert(start);
        queue.push_back((start, 0));

        while let Some((current, depth)) = queue.pop_front() {
            let node = self.node(current)?;
            results.push((current, depth));
            for next in self.neighbors(&node, direction) {
                if visited.insert(next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        Ok(results)
    }

    /// Group nodes by child-edge distance from the root.
    ///
    /// A node reachable at several distances is listed at each of them.
    /// Fails if any level beyond the terminal depth is non-empty, which
    /// means a cycle or an over-long path.
    pub fn levels(&self) -> Result<Vec<Vec<NodeIndex>>> {
        let mut levels = Vec::new();
        let mut frontier: BTreeSet<NodeIndex> = BTreeSet::from([ROOT]);

        while !frontier.is_empty() {
            if levels.len() > TERMINAL_DEPTH as usize {
                return Err(Error::InvalidGraph(format!(
                    "child paths longer than {} steps (cycle?)",
                    TERMINAL_DEPTH
                )));
            }
            let mut next = BTreeSet::new();
            for &index in &frontier {
                next.extend(self.node(index)?.children());
            }
            levels.push(frontier.into_iter().collect());
            frontier = next;
        }

        Ok(levels)
    }

    /// Number of distinct child-only paths from the root to the terminal
    pub fn count_paths(&self) -> Result<u64> {
        // rejects cycles before recursing
        self.levels()?;
        let mut memo = BTreeMap::new();
        self.paths_from(ROOT, &mut memo)
    }

    fn paths_from(&self, index: NodeIndex, memo: &mut BTreeMap<NodeIndex, u64>) -> Result<u64> {
        if let Some(&known) = memo.get(&index) {
            return Ok(known);
        }
        let count = if index == TERMINAL {
            1
        } else {
            let mut sum = 0u64;
            for child in self.node(index)?.children() {
                sum = sum.saturating_add(self.paths_from(child, memo)?);
            }
            sum
        };
        memo.insert(index, count);
        Ok(count)
    }

    /// Check that the stored graph is a converging diamond:
    /// - root and terminal are stored, terminal has no children
    /// - every referenced node is stored
    /// - every child path ends at the terminal within the depth budget
    /// - every stored node is reachable from the root
    pub fn validate_diamond(&self) -> Result<()> {
        let terminal = self.node(TERMINAL)?;
        if !terminal.children().is_empty() {
            return Err(Error::InvalidGraph(format!(
                "terminal node {} must not have children",
                TERMINAL
            )));
        }

        for level in self.levels()? {
            for index in level {
                let node = self.node(index)?;
                if node.children().is_empty() && index != TERMINAL {
                    return Err(Error::InvalidGraph(format!(
                        "node {} is a dead end before the terminal",
                        index
                    )));
                }
            }
        }

        let reached: HashSet<NodeIndex> = self
            .bfs(ROOT, TraversalDirection::All)?
            .into_iter()
            .map(|(index, _)| index)
            .collect();
        for index in 1..=MAX_NODES {
            if self.store.contains(index) && !reached.contains(&index) {
                return Err(Error::InvalidGraph(format!(
                    "node {} is unreachable from the root",
                    index
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{default_poem, GraphBuilder};
    use crate::model::NodeSpec;
    use crate::store::Encoding;

    #[test]
    fn test_default_levels() {
        let store = default_poem(Encoding::Packed).unwrap();
        let view = GraphView::new(&store);
        let levels = view.levels().unwrap();
        assert_eq!(levels.len(), 9);
        assert_eq!(levels[0], vec![1]);
        assert_eq!(levels[4], vec![11, 12, 13, 14, 15]);
        assert_eq!(levels[8], vec![25]);
    }

    #[test]
    fn test_default_path_count() {
        let store = default_poem(Encoding::Structured).unwrap();
        // binomial(8, 4) paths through a 1-2-3-4-5-4-3-2-1 diamond
        assert_eq!(GraphView::new(&store).count_paths().unwrap(), 70);
    }

    #[test]
    fn test_bfs_reaches_everything() {
        let store = default_poem(Encoding::Packed).unwrap();
        let view = GraphView::new(&store);
        let all = view.bfs(ROOT, TraversalDirection::All).unwrap();
        assert_eq!(all.len(), 25);
        let children_only = view.bfs(ROOT, TraversalDirection::Children).unwrap();
        assert_eq!(children_only.len(), 25);
        assert_eq!(children_only.last().unwrap(), &(25, 8));
    }

    #[test]
    fn test_validate_default_graph() {
        let store = default_poem(Encoding::Packed).unwrap();
        GraphView::new(&store).validate_diamond().unwrap();
    }

    #[test]
    fn test_dead_end_is_rejected() {
        let mut store = Encoding::Packed.new_store();
        GraphBuilder::new()
            .node(NodeSpec::new(1, "a").children(2, 3))
            .node(NodeSpec::new(2, "b").children(25, 0))
            .node(NodeSpec::new(3, "c"))
            .node(NodeSpec::new(25, "z"))
            .write_into(&mut store)
            .unwrap();
        let err = GraphView::new(&store).validate_diamond().unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut store = Encoding::Structured.new_store();
        GraphBuilder::new()
            .node(NodeSpec::new(1, "a").children(2, 0))
            .node(NodeSpec::new(2, "b").children(1, 25))
            .node(NodeSpec::new(25, "z"))
            .write_into(&mut store)
            .unwrap();
        let err = GraphView::new(&store).levels().unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
    }

    #[test]
    fn test_missing_child_is_reported() {
        let mut store = Encoding::Packed.new_store();
        GraphBuilder::new()
            .node(NodeSpec::new(1, "a").children(2, 25))
            .node(NodeSpec::new(25, "z"))
            .write_into(&mut store)
            .unwrap();
        let err = GraphView::new(&store).validate_diamond().unwrap_err();
        assert!(matches!(err, Error::NoNodeStored(2)));
    }
}
