//! Dependency graph storage.
//!
//! The graph is a DAG with shared subtrees: one artifact requested by many
//! parents in the same context is one node with many parents. Nodes live in an
//! arena ([`DependencyGraph`]) and refer to each other by [`NodeId`]; children
//! are an ordered list (declaration order drives rendering), parents an
//! unordered set. Every edge is recorded on both ends.
//!
//! Nodes are never removed. When conflict resolution swaps the children of a
//! node, the previous subtree may become unreachable from the root; such
//! *orphans* stay in the arena and are skipped by every traversal that starts
//! at the root.
//!
//! - [`node`]: the closed [`NodeKind`] enum and node messages
//! - [`traversal`]: distinct breadth-first traversal and sub-graph views
//! - [`pretty`]: the stable textual tree rendering

pub mod node;
pub mod pretty;
pub mod traversal;

pub use node::{
    ArtifactNode, BomVersion, ConstraintNode, ExpansionState, FragmentNode, Message, ModuleNode,
    Node, NodeId, NodeKind, RootNode, Severity,
};
pub use pretty::pretty_print;
pub use traversal::{DistinctBfs, GraphView, Subgraph, SubgraphView};

use crate::core::DrError;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Arena of graph nodes with a designated root.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl DependencyGraph {
    /// Creates a graph holding only a root node labelled `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root(RootNode {
                label: label.into(),
            }))],
            root: NodeId(0),
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, orphans included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// All node ids of the arena in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    /// Records `parent -> child` on both ends. Returns `false` if the edge
    /// already existed.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.nodes[parent.index()].children.contains(&child) {
            return false;
        }
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parents.insert(parent);
        true
    }

    pub fn remove_edge(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.retain(|c| *c != child);
        self.nodes[child.index()].parents.remove(&parent);
    }

    /// Detaches all children of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        let children = std::mem::take(&mut self.nodes[parent.index()].children);
        for child in children {
            self.nodes[child.index()].parents.remove(&parent);
        }
    }

    /// Whether `ancestor` reaches `node` through child edges (or is `node`).
    ///
    /// Walks parent edges upward from `node`; orphaned parents are included,
    /// which can only make the answer more conservative.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        if ancestor == node {
            return true;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([node]);
        while let Some(current) = queue.pop_front() {
            for &parent in &self.nodes[current.index()].parents {
                if parent == ancestor {
                    return true;
                }
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        false
    }

    /// Nodes reachable from the root, each once, breadth-first.
    pub fn distinct_bfs(&self) -> DistinctBfs<'_, Self, fn(NodeId, NodeId) -> bool> {
        let always: fn(NodeId, NodeId) -> bool = |_, _| true;
        DistinctBfs::new(self, vec![self.root], always)
    }

    /// Like [`distinct_bfs`](Self::distinct_bfs), entering a child only when
    /// `predicate(child, parent)` holds.
    pub fn distinct_bfs_filtered<P>(&self, predicate: P) -> DistinctBfs<'_, Self, P>
    where
        P: FnMut(NodeId, NodeId) -> bool,
    {
        DistinctBfs::new(self, vec![self.root], predicate)
    }

    /// Set of nodes reachable from the root.
    #[must_use]
    pub fn reachable(&self) -> HashSet<NodeId> {
        self.distinct_bfs().collect()
    }

    /// Whether `id` can no longer be reached from the root.
    #[must_use]
    pub fn is_orphan(&self, id: NodeId) -> bool {
        id != self.root && !self.distinct_bfs().any(|n| n == id)
    }

    /// Projects the reachable part of the graph into a petgraph graph.
    #[must_use]
    pub fn to_petgraph(&self) -> (DiGraph<NodeId, ()>, HashMap<NodeId, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();
        let order: Vec<NodeId> = self.distinct_bfs().collect();
        for &id in &order {
            indices.insert(id, graph.add_node(id));
        }
        for &id in &order {
            for child in self.children(id) {
                if let (Some(&from), Some(&to)) = (indices.get(&id), indices.get(child)) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        (graph, indices)
    }

    /// Checks edge consistency of the reachable graph and that it is acyclic.
    pub fn validate(&self) -> Result<(), DrError> {
        for id in self.distinct_bfs() {
            let node = self.node(id);
            for &child in &node.children {
                let Some(child_node) = self.get(child) else {
                    return Err(DrError::GraphIntegrity {
                        reason: format!("{id} has dangling child {child}"),
                    });
                };
                if !child_node.parents.contains(&id) {
                    return Err(DrError::GraphIntegrity {
                        reason: format!(
                            "'{}' lists '{}' as child but is not among its parents",
                            node.entry_name(),
                            child_node.entry_name()
                        ),
                    });
                }
            }
            for &parent in &node.parents {
                let Some(parent_node) = self.get(parent) else {
                    return Err(DrError::GraphIntegrity {
                        reason: format!("{id} has dangling parent {parent}"),
                    });
                };
                if !parent_node.children.contains(&id) {
                    return Err(DrError::GraphIntegrity {
                        reason: format!(
                            "'{}' lists '{}' as parent but is not among its children",
                            node.entry_name(),
                            parent_node.entry_name()
                        ),
                    });
                }
            }
            if id != self.root && node.parents.is_empty() {
                return Err(DrError::GraphIntegrity {
                    reason: format!("'{}' is reachable but has no parents", node.entry_name()),
                });
            }
        }

        let (graph, _) = self.to_petgraph();
        toposort(&graph, None).map_err(|cycle| DrError::GraphIntegrity {
            reason: format!(
                "cycle through '{}'",
                self.node(graph[cycle.node_id()]).entry_name()
            ),
        })?;
        Ok(())
    }
}
