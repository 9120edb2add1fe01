//! Version conflict resolution.
//!
//! Per `(DependencyKey, ResolutionContext)` among reachable nodes, the highest
//! candidate version wins. Candidates are the original versions of the
//! artifact nodes (declared, else from a BOM) and the versions of constraint
//! nodes on keys that have at least one artifact node.
//!
//! Every node not at the effective version gets `resolved_version` rewritten
//! and `overridden_by` set to the nodes that declared the effective version.
//! A node at the effective version has `overridden_by` cleared, so the pass
//! can run repeatedly as the graph grows.

use crate::graph::{DependencyGraph, NodeId, NodeKind};
use crate::models::{DependencyKey, ResolutionContext};
use crate::version::VersionComparator;
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

#[derive(Default)]
struct Group {
    artifacts: Vec<NodeId>,
    constraints: Vec<NodeId>,
}

/// Applies highest-version-wins to the reachable graph. Returns whether any
/// node changed.
pub(crate) fn resolve_conflicts(graph: &mut DependencyGraph) -> bool {
    let mut groups: HashMap<(DependencyKey, ResolutionContext), Group> = HashMap::new();
    for id in graph.distinct_bfs() {
        match graph.node(id).kind() {
            NodeKind::Artifact(a) => groups
                .entry((a.key(), a.context.clone()))
                .or_default()
                .artifacts
                .push(id),
            NodeKind::Constraint(c) => groups
                .entry((c.coordinates.key(), c.context.clone()))
                .or_default()
                .constraints
                .push(id),
            _ => {}
        }
    }

    let mut changed = false;
    for ((key, context), group) in groups {
        if group.artifacts.is_empty() {
            for id in group.constraints {
                changed |= reset_constraint(graph, id);
            }
            continue;
        }

        let Some(effective) = effective_version(graph, &group) else {
            continue;
        };
        trace!(target: "resolver", dependency = %key, %context, %effective, "effective version");

        let causes: BTreeSet<NodeId> = group
            .artifacts
            .iter()
            .chain(group.constraints.iter())
            .copied()
            .filter(|&id| original_version(graph, id).as_deref() == Some(effective.as_str()))
            .collect();

        for &id in group.artifacts.iter().chain(group.constraints.iter()) {
            changed |= apply(graph, id, &effective, &causes);
        }
    }
    changed
}

fn original_version(graph: &DependencyGraph, id: NodeId) -> Option<String> {
    match graph.node(id).kind() {
        NodeKind::Artifact(a) => a.original_version().map(str::to_string),
        NodeKind::Constraint(c) => c.coordinates.version.clone(),
        _ => None,
    }
}

fn effective_version(graph: &DependencyGraph, group: &Group) -> Option<String> {
    let candidates: Vec<String> = group
        .artifacts
        .iter()
        .chain(group.constraints.iter())
        .filter_map(|&id| original_version(graph, id))
        .collect();
    VersionComparator::get_latest(candidates.iter().map(String::as_str)).map(str::to_string)
}

fn apply(graph: &mut DependencyGraph, id: NodeId, effective: &str, causes: &BTreeSet<NodeId>) -> bool {
    let original = original_version(graph, id);
    let overridden_by = (original.as_deref() != Some(effective)).then(|| causes.clone());
    let resolved = Some(effective.to_string());

    match &mut graph.node_mut(id).kind {
        NodeKind::Artifact(a) => {
            let changed = a.resolved_version != resolved || a.overridden_by != overridden_by;
            a.resolved_version = resolved;
            a.overridden_by = overridden_by;
            changed
        }
        NodeKind::Constraint(c) => {
            let changed = c.resolved_version != resolved || c.overridden_by != overridden_by;
            c.resolved_version = resolved;
            c.overridden_by = overridden_by;
            changed
        }
        _ => false,
    }
}

fn reset_constraint(graph: &mut DependencyGraph, id: NodeId) -> bool {
    if let NodeKind::Constraint(c) = &mut graph.node_mut(id).kind {
        let changed = c.resolved_version != c.coordinates.version || c.overridden_by.is_some();
        c.resolved_version = c.coordinates.version.clone();
        c.overridden_by = None;
        return changed;
    }
    false
}
