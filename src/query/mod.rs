//! Read-only queries over a resolved graph.
//!
//! Extracted sub-graphs are [`Subgraph`] holders whose entries reference nodes
//! of the original arena; nothing is copied, so they render exactly like the
//! full graph and stay cheap to build.

pub mod insight;

pub use insight::InsightCache;

use crate::core::DrError;
use crate::graph::{DependencyGraph, NodeId, Subgraph};
use strsim::levenshtein;

/// Maximum edit distance, as a percentage of the requested name, for a
/// "did you mean" suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Module node named `name`, if it is part of the graph.
#[must_use]
pub fn find_module(graph: &DependencyGraph, name: &str) -> Option<NodeId> {
    graph
        .distinct_bfs()
        .find(|&id| graph.node(id).as_module().is_some_and(|m| m.name == name))
}

/// Names of every module in the graph, in traversal order.
#[must_use]
pub fn module_names(graph: &DependencyGraph) -> Vec<String> {
    graph
        .distinct_bfs()
        .filter_map(|id| graph.node(id).as_module().map(|m| m.name.clone()))
        .collect()
}

/// Sub-tree of the module `name`: one entry per declaration of the module.
pub fn module_deps(graph: &DependencyGraph, name: &str) -> Result<Subgraph, DrError> {
    let module = find_module(graph, name).ok_or_else(|| DrError::ModuleNotFound {
        name: name.to_string(),
        suggestion: suggest(name, &module_names(graph)),
    })?;
    Ok(Subgraph::references(
        graph.node(module).entry_name(),
        graph.children(module).to_vec(),
    ))
}

/// Direct bindings of one fragment of a module.
///
/// A fragment the module defines without declaring anything yields an empty
/// sub-graph; only fragments the module does not define are an error.
pub fn fragment_deps(graph: &DependencyGraph, module: &str, fragment: &str) -> Result<Subgraph, DrError> {
    let module_id = find_module(graph, module).ok_or_else(|| DrError::ModuleNotFound {
        name: module.to_string(),
        suggestion: suggest(module, &module_names(graph)),
    })?;

    let bindings: Vec<NodeId> = graph
        .children(module_id)
        .iter()
        .copied()
        .filter(|&id| {
            graph
                .node(id)
                .as_fragment()
                .is_some_and(|f| f.module == module && f.fragment == fragment)
        })
        .collect();

    let defined = graph
        .node(module_id)
        .as_module()
        .is_some_and(|m| m.has_fragment(fragment));
    if bindings.is_empty() && !defined {
        return Err(DrError::FragmentNotFound {
            module: module.to_string(),
            fragment: fragment.to_string(),
        });
    }
    Ok(Subgraph::references(format!("{module}:{fragment}"), bindings))
}

fn suggest(target: &str, available: &[String]) -> Option<String> {
    available
        .iter()
        .map(|name| (name, levenshtein(target, name)))
        .filter(|(_, distance)| *distance <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name.clone())
}
