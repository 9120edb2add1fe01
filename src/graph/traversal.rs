//! Traversal and sub-graph views.
//!
//! [`GraphView`] abstracts over "something with a top line and children":
//! the full graph, or a [`Subgraph`] whose synthetic holder lists references
//! into the original arena. Both the breadth-first traversal and the pretty
//! printer work over any view, so extracted module trees and insight results
//! render exactly like the full graph.

use super::{DependencyGraph, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Read access to a tree-shaped view over a [`DependencyGraph`].
pub trait GraphView {
    /// Backing arena.
    fn graph(&self) -> &DependencyGraph;

    /// First line of the rendered view.
    fn label(&self) -> String;

    /// Nodes directly below the top line.
    fn top_level(&self) -> &[NodeId];

    /// Children of `node` as seen through this view.
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Distinct breadth-first traversal starting at the top-level nodes.
    fn view_bfs(&self) -> DistinctBfs<'_, Self, fn(NodeId, NodeId) -> bool>
    where
        Self: Sized,
    {
        let always: fn(NodeId, NodeId) -> bool = |_, _| true;
        DistinctBfs::new(self, self.top_level().to_vec(), always)
    }
}

impl GraphView for DependencyGraph {
    fn graph(&self) -> &DependencyGraph {
        self
    }

    fn label(&self) -> String {
        self.node(self.root()).entry_name()
    }

    fn top_level(&self) -> &[NodeId] {
        self.get(self.root()).map(|n| n.children()).unwrap_or(&[])
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(|n| n.children()).unwrap_or(&[])
    }
}

/// Lazy breadth-first sequence visiting every reachable node exactly once.
///
/// Each call to a `distinct_bfs*` method builds a fresh sequence, so the
/// traversal can be restarted at will.
pub struct DistinctBfs<'a, V: ?Sized, P> {
    view: &'a V,
    queue: VecDeque<NodeId>,
    visited: HashSet<NodeId>,
    predicate: P,
}

impl<'a, V, P> DistinctBfs<'a, V, P>
where
    V: GraphView + ?Sized,
    P: FnMut(NodeId, NodeId) -> bool,
{
    pub fn new(view: &'a V, start: Vec<NodeId>, predicate: P) -> Self {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        for id in start {
            if visited.insert(id) {
                queue.push_back(id);
            }
        }
        Self {
            view,
            queue,
            visited,
            predicate,
        }
    }
}

impl<V, P> Iterator for DistinctBfs<'_, V, P>
where
    V: GraphView + ?Sized,
    P: FnMut(NodeId, NodeId) -> bool,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.queue.pop_front()?;
        for &child in self.view.children(node) {
            if !self.visited.contains(&child) && (self.predicate)(child, node) {
                self.visited.insert(child);
                self.queue.push_back(child);
            }
        }
        Some(node)
    }
}

/// An extracted sub-graph: a synthetic holder whose entries reference nodes of
/// the original graph.
///
/// Without filtering, the children of every referenced node are its original
/// children. With filtering (as produced by dependency insight), only nodes
/// present in the filter map have children, and only those listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    label: String,
    entries: Vec<NodeId>,
    filtered: Option<HashMap<NodeId, Vec<NodeId>>>,
}

impl Subgraph {
    /// Holder over `entries` keeping their original subtrees.
    #[must_use]
    pub fn references(label: impl Into<String>, entries: Vec<NodeId>) -> Self {
        Self {
            label: label.into(),
            entries,
            filtered: None,
        }
    }

    /// Holder over `entries` where each node only shows the listed children.
    #[must_use]
    pub fn filtered(
        label: impl Into<String>,
        entries: Vec<NodeId>,
        children: HashMap<NodeId, Vec<NodeId>>,
    ) -> Self {
        Self {
            label: label.into(),
            entries,
            filtered: Some(children),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds the sub-graph to the arena it references.
    #[must_use]
    pub fn view<'a>(&'a self, graph: &'a DependencyGraph) -> SubgraphView<'a> {
        SubgraphView {
            graph,
            subgraph: self,
        }
    }
}

/// A [`Subgraph`] bound to its arena.
#[derive(Debug, Clone, Copy)]
pub struct SubgraphView<'a> {
    graph: &'a DependencyGraph,
    subgraph: &'a Subgraph,
}

impl SubgraphView<'_> {
    /// Every node of the view, each once.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        self.view_bfs().collect()
    }
}

impl GraphView for SubgraphView<'_> {
    fn graph(&self) -> &DependencyGraph {
        self.graph
    }

    fn label(&self) -> String {
        self.subgraph.label.clone()
    }

    fn top_level(&self) -> &[NodeId] {
        &self.subgraph.entries
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        match &self.subgraph.filtered {
            Some(map) => map.get(&node).map(Vec::as_slice).unwrap_or(&[]),
            None => GraphView::children(self.graph, node),
        }
    }
}
