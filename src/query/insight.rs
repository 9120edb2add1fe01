//! Dependency insight: why a library ended up at its version.
//!
//! The insight for a `group:module` key keeps every path from the root to the
//! matching artifacts that sit at their own version. When some instance was
//! overridden, it also keeps one path to the node that declared the winning
//! version. If no instance sits at its own version, the overridden instances
//! are the targets instead.
//!
//! Results are memoized per key for the lifetime of one resolved graph.

use crate::graph::{DependencyGraph, NodeId, NodeKind, Subgraph, pretty::pretty_print_for};
use crate::models::DependencyKey;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Memoized insight computations of one resolution run.
#[derive(Debug, Default)]
pub struct InsightCache {
    results: DashMap<DependencyKey, Arc<Subgraph>>,
    walks: AtomicUsize,
}

impl InsightCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insight sub-graph for `key`, computed at most once per cache.
    pub fn insight(&self, graph: &DependencyGraph, key: &DependencyKey) -> Arc<Subgraph> {
        if let Some(hit) = self.results.get(key) {
            return Arc::clone(hit.value());
        }
        // The entry lock is held across the walk so racing callers wait for it.
        let entry = self.results.entry(key.clone()).or_insert_with(|| {
            self.walks.fetch_add(1, Ordering::Relaxed);
            debug!(target: "resolver", dependency = %key, "computing dependency insight");
            Arc::new(compute(graph, key))
        });
        Arc::clone(entry.value())
    }

    /// Rendered insight tree for `key`.
    pub fn render(&self, graph: &DependencyGraph, key: &DependencyKey) -> String {
        let subgraph = self.insight(graph, key);
        pretty_print_for(&subgraph.view(graph), Some(key))
    }

    /// Number of graph walks performed so far.
    #[must_use]
    pub fn walks(&self) -> usize {
        self.walks.load(Ordering::Relaxed)
    }
}

fn compute(graph: &DependencyGraph, key: &DependencyKey) -> Subgraph {
    let order: Vec<NodeId> = graph.distinct_bfs().collect();
    let position: HashMap<NodeId, usize> = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut effective = Vec::new();
    let mut overridden = Vec::new();
    for &id in &order {
        let Some(artifact) = graph.node(id).as_artifact() else {
            continue;
        };
        if artifact.key() != *key {
            continue;
        }
        if artifact.is_overridden() {
            overridden.push(id);
        } else {
            effective.push(id);
        }
    }

    let targets = if effective.is_empty() { &overridden } else { &effective };
    let mut keep = ancestors_or_self(graph, &position, targets);

    if let Some(cause) = winning_cause(graph, &overridden) {
        if !targets.contains(&cause) {
            keep.extend(single_path(graph, &position, cause));
        }
    }

    let root = graph.root();
    let entries: Vec<NodeId> = graph
        .children(root)
        .iter()
        .copied()
        .filter(|c| keep.contains(c))
        .collect();
    let children: HashMap<NodeId, Vec<NodeId>> = keep
        .iter()
        .map(|&id| {
            let kept = graph
                .children(id)
                .iter()
                .copied()
                .filter(|c| keep.contains(c))
                .collect();
            (id, kept)
        })
        .collect();

    Subgraph::filtered(graph.node(root).entry_name(), entries, children)
}

/// Every reachable ancestor of `targets`, targets included.
fn ancestors_or_self(
    graph: &DependencyGraph,
    position: &HashMap<NodeId, usize>,
    targets: &[NodeId],
) -> HashSet<NodeId> {
    let mut keep: HashSet<NodeId> = targets.iter().copied().collect();
    let mut queue: VecDeque<NodeId> = targets.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        for &parent in graph.node(current).parents() {
            if position.contains_key(&parent) && keep.insert(parent) {
                queue.push_back(parent);
            }
        }
    }
    keep
}

/// Node that declared the effective version, preferring a constraint.
fn winning_cause(graph: &DependencyGraph, overridden: &[NodeId]) -> Option<NodeId> {
    let causes = overridden
        .iter()
        .find_map(|&id| graph.node(id).overridden_by())?;
    causes
        .iter()
        .copied()
        .find(|&c| matches!(graph.node(c).kind(), NodeKind::Constraint(_)))
        .or_else(|| causes.iter().next().copied())
}

/// One path from the root down to `node`, following the earliest-visited
/// parent at every step.
fn single_path(graph: &DependencyGraph, position: &HashMap<NodeId, usize>, node: NodeId) -> Vec<NodeId> {
    let mut path = vec![node];
    let mut current = node;
    while current != graph.root() {
        let Some(parent) = graph
            .node(current)
            .parents()
            .iter()
            .copied()
            .filter(|p| position.contains_key(p) && !path.contains(p))
            .min_by_key(|p| position[p])
        else {
            break;
        };
        path.push(parent);
        current = parent;
    }
    path
}
