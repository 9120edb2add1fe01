//! Common helpers for the depgraph test targets.

// Not every target uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use depgraph_cli::graph::{DependencyGraph, NodeId};
use depgraph_cli::metadata::MetadataFetcher;
use depgraph_cli::resolver::{Resolver, ResolverSettings};
use depgraph_cli::test_utils::coords;
use std::path::Path;
use std::sync::Arc;

/// Resolver with fast retries, so failure paths don't slow the suite down.
pub fn resolver(fetcher: Arc<dyn MetadataFetcher>) -> Resolver {
    let mut settings = ResolverSettings::default();
    settings.retry.base_delay_ms = 1;
    Resolver::with_settings(fetcher, settings)
}

/// Reachable artifact nodes declared with exactly `text`.
pub fn artifacts(graph: &DependencyGraph, text: &str) -> Vec<NodeId> {
    let wanted = coords(text);
    graph
        .distinct_bfs()
        .filter(|&id| graph.node(id).as_artifact().is_some_and(|a| a.coordinates == wanted))
        .collect()
}

/// The single reachable artifact node declared with `text`.
pub fn artifact(graph: &DependencyGraph, text: &str) -> NodeId {
    let found = artifacts(graph, text);
    assert_eq!(found.len(), 1, "expected exactly one node for {text}, found {}", found.len());
    found[0]
}

/// Every reachable node lists each child among the child's parents and the
/// other way round.
pub fn assert_edges_consistent(graph: &DependencyGraph) {
    for id in graph.distinct_bfs() {
        let node = graph.node(id);
        for &child in node.children() {
            assert!(
                graph.node(child).parents().contains(&id),
                "{} -> {} is missing its back edge",
                node,
                graph.node(child)
            );
        }
        for &parent in node.parents() {
            assert!(
                graph.node(parent).children().contains(&id),
                "{} <- {} is missing its forward edge",
                node,
                graph.node(parent)
            );
        }
    }
}

/// `depgraph` binary isolated from the user's configuration.
pub fn depgraph(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("depgraph").unwrap();
    cmd.current_dir(workdir)
        .env_remove("DEPGRAPH_CACHE_DIR")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(workdir.join("depgraph-config.toml"));
    cmd
}
