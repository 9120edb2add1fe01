//! BOM version lookup for dependencies declared without a version.
//!
//! A BOM artifact node has one constraint child per managed coordinate. Its
//! constraints are visible to every descendant, in the same context, of the
//! node that declared the BOM:
//!
//! - a BOM child of an artifact covers that artifact's subtree
//! - a BOM declared in a fragment covers every declaration of that fragment
//!
//! Lookup walks ancestors breadth-first from the unversioned node, so the
//! nearest declaring node wins.

use crate::graph::{BomVersion, DependencyGraph, NodeId, NodeKind};
use crate::models::{DependencyKey, ResolutionContext};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Attaches `version_from_bom` to every reachable unversioned artifact that a
/// visible BOM manages. Returns whether anything changed.
///
/// Nodes that already carry a BOM version are left alone, so running the
/// pass again never changes a recorded BOM source.
pub(crate) fn resolve_bom_versions(graph: &mut DependencyGraph) -> bool {
    let reachable = graph.reachable();
    let order: Vec<NodeId> = graph.distinct_bfs().collect();
    let mut changed = false;

    for id in order {
        let Some(artifact) = graph.node(id).as_artifact() else {
            continue;
        };
        if artifact.coordinates.version.is_some() || artifact.version_from_bom.is_some() {
            continue;
        }
        let key = artifact.key();
        let context = artifact.context.clone();

        if let Some(found) = find_bom_version(graph, &reachable, id, &key, &context) {
            debug!(
                target: "resolver",
                dependency = %key,
                version = %found.version,
                "version taken from BOM"
            );
            if let Some(artifact) = graph.node_mut(id).as_artifact_mut() {
                if artifact.resolved_version.is_none() {
                    artifact.resolved_version = Some(found.version.clone());
                }
                artifact.version_from_bom = Some(found);
            }
            changed = true;
        }
    }
    changed
}

/// Nearest BOM constraint on `key` visible from `node`.
pub(crate) fn find_bom_version(
    graph: &DependencyGraph,
    reachable: &HashSet<NodeId>,
    node: NodeId,
    key: &DependencyKey,
    context: &ResolutionContext,
) -> Option<BomVersion> {
    let mut visited = HashSet::new();
    let mut queue: VecDeque<NodeId> = graph
        .node(node)
        .parents()
        .iter()
        .copied()
        .filter(|p| reachable.contains(p))
        .collect();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }

        for bom in visible_boms(graph, current, context) {
            if let Some(version) = managed_version(graph, bom, key, context) {
                return Some(BomVersion { version, bom });
            }
        }

        queue.extend(
            graph
                .node(current)
                .parents()
                .iter()
                .copied()
                .filter(|p| reachable.contains(p) && !visited.contains(p)),
        );
    }
    None
}

/// BOM artifacts declared by `declarer` for its subtree.
fn visible_boms(graph: &DependencyGraph, declarer: NodeId, context: &ResolutionContext) -> Vec<NodeId> {
    match graph.node(declarer).kind() {
        NodeKind::Artifact(_) => graph
            .children(declarer)
            .iter()
            .copied()
            .filter(|c| is_bom_in(graph, *c, context))
            .collect(),
        NodeKind::Fragment(fragment) => {
            // Sibling bindings of the same fragment under the module node.
            let mut boms = Vec::new();
            for &module in graph.node(declarer).parents() {
                for &binding in graph.children(module) {
                    let Some(sibling) = graph.node(binding).as_fragment() else {
                        continue;
                    };
                    if sibling.module != fragment.module || sibling.fragment != fragment.fragment {
                        continue;
                    }
                    boms.extend(
                        graph
                            .children(binding)
                            .iter()
                            .copied()
                            .filter(|c| is_bom_in(graph, *c, context)),
                    );
                }
            }
            boms
        }
        _ => Vec::new(),
    }
}

fn is_bom_in(graph: &DependencyGraph, id: NodeId, context: &ResolutionContext) -> bool {
    graph
        .node(id)
        .as_artifact()
        .is_some_and(|a| a.is_bom && a.context == *context)
}

fn managed_version(
    graph: &DependencyGraph,
    bom: NodeId,
    key: &DependencyKey,
    context: &ResolutionContext,
) -> Option<String> {
    graph.children(bom).iter().find_map(|&c| {
        let constraint = graph.node(c).as_constraint()?;
        (constraint.coordinates.key() == *key && constraint.context == *context)
            .then(|| constraint.coordinates.version.clone())
            .flatten()
    })
}
