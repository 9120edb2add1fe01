//! Fetch deduplication, retries and cancellation.

use crate::common::{artifact, resolver};
use anyhow::Result;
use depgraph_cli::core::{DrError, OperationContext};
use depgraph_cli::diagnostics::ids;
use depgraph_cli::metadata::{ArtifactMetadata, InMemoryRepository, MetadataDependency};
use depgraph_cli::models::{DeclaredDependency, ResolutionRequest};
use depgraph_cli::test_utils::{coords, fixtures};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

fn shared_dependency(latency: Duration) -> InMemoryRepository {
    let mut repository = InMemoryRepository::new().with_latency(latency);
    for name in ["a", "b", "c", "d"] {
        repository.insert(
            coords(&format!("g:{name}:1.0")),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:shared:1.0"))),
        );
    }
    repository.insert(coords("g:shared:1.0"), ArtifactMetadata::default());
    repository
}

fn declaring_all() -> ResolutionRequest {
    ["a", "b", "c", "d"].iter().fold(ResolutionRequest::default(), |request, name| {
        request.with("app", "jvm", DeclaredDependency::maven(coords(&format!("g:{name}:1.0"))))
    })
}

#[tokio::test]
async fn test_shared_dependency_is_fetched_once_per_run() -> Result<()> {
    let repository = Arc::new(shared_dependency(Duration::from_millis(20)));
    let resolved = resolver(repository.clone()).resolve(&declaring_all()).await?;

    artifact(resolved.graph(), "g:shared:1.0");
    assert_eq!(repository.metadata_fetches(&coords("g:shared:1.0")), 1);
    assert_eq!(repository.metadata_fetches(&coords("g:a:1.0")), 1);
    Ok(())
}

#[tokio::test]
async fn test_runs_do_not_share_metadata() -> Result<()> {
    let repository = Arc::new(shared_dependency(Duration::ZERO));
    let resolver = resolver(repository.clone());
    resolver.resolve(&declaring_all()).await?;
    resolver.resolve(&declaring_all()).await?;

    assert_eq!(repository.metadata_fetches(&coords("g:shared:1.0")), 2);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_runs_on_one_resolver_agree() -> Result<()> {
    let resolver = resolver(Arc::new(fixtures::layered_repository(3, 4)));
    let request = fixtures::layered_request(4, 2);

    let runs = join_all((0..6).map(|_| resolver.resolve(&request))).await;
    let trees: Vec<String> = runs
        .into_iter()
        .map(|run| run.map(|resolved| resolved.pretty_print()))
        .collect::<Result<_, _>>()?;
    assert!(trees.windows(2).all(|pair| pair[0] == pair[1]));
    Ok(())
}

#[tokio::test]
async fn test_transient_failures_are_retried() -> Result<()> {
    let repository = Arc::new(
        InMemoryRepository::new()
            .with_artifact(coords("g:flaky:1.0"), ArtifactMetadata::default())
            .failing_transiently(coords("g:flaky:1.0"), 2),
    );
    let request = ResolutionRequest::default().with("app", "jvm", DeclaredDependency::maven(coords("g:flaky:1.0")));

    let resolved = resolver(repository.clone()).resolve(&request).await?;
    let graph = resolved.graph();
    assert!(graph.node(artifact(graph, "g:flaky:1.0")).messages().is_empty());
    assert_eq!(repository.metadata_fetches(&coords("g:flaky:1.0")), 3);
    Ok(())
}

#[tokio::test]
async fn test_exhausted_retries_become_a_problem() -> Result<()> {
    let repository = Arc::new(
        InMemoryRepository::new()
            .with_artifact(coords("g:down:1.0"), ArtifactMetadata::default())
            .with_artifact(coords("g:up:1.0"), ArtifactMetadata::default())
            .failing_transiently(coords("g:down:1.0"), 100),
    );
    let request = ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::maven(coords("g:down:1.0")))
        .with("app", "jvm", DeclaredDependency::maven(coords("g:up:1.0")));

    let resolved = resolver(repository.clone()).resolve(&request).await?;
    let graph = resolved.graph();
    assert!(graph.node(artifact(graph, "g:down:1.0")).has_message(ids::FETCH_FAILED));
    assert!(graph.node(artifact(graph, "g:up:1.0")).messages().is_empty());
    // First attempt plus the default three retries.
    assert!(repository.metadata_fetches(&coords("g:down:1.0")) >= 4);
    Ok(())
}

#[tokio::test]
async fn test_timeout_cancels_the_run() {
    let repository = Arc::new(shared_dependency(Duration::from_millis(500)));
    let result = resolver(repository)
        .resolve_with_timeout(&declaring_all(), Duration::from_millis(20))
        .await;

    assert!(matches!(result, Err(DrError::Cancelled { .. })));
}

#[tokio::test]
async fn test_cancelled_context_stops_resolution() {
    let operation = OperationContext::new();
    operation.cancel("user interrupt");
    let result = resolver(Arc::new(shared_dependency(Duration::ZERO)))
        .resolve_with_context(&declaring_all(), &operation)
        .await;

    match result {
        Err(DrError::Cancelled { reason }) => assert_eq!(reason, "user interrupt"),
        other => panic!("expected cancellation, got {other:?}"),
    }
}
