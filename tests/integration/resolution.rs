//! Graph construction through the public resolver API.

use crate::common::{artifact, artifacts, assert_edges_consistent, resolver};
use anyhow::Result;
use depgraph_cli::metadata::{ArtifactMetadata, InMemoryRepository, MetadataDependency};
use depgraph_cli::models::{
    DeclaredDependency, DependencyScope, ResolutionContext, ResolutionPlatform, ResolutionRequest,
    ResolutionScope,
};
use depgraph_cli::test_utils::{coords, fixtures, init_test_logging};
use std::sync::Arc;

#[tokio::test]
async fn test_bom_version_overridden_by_pinned_version() -> Result<()> {
    init_test_logging(None);
    let resolver = resolver(Arc::new(fixtures::bom_conflict_repository()));
    let resolved = resolver.resolve(&fixtures::bom_conflict_request()).await?;
    let graph = resolved.graph();

    let from_bom = graph.node(artifact(graph, "g:lib-x")).as_artifact().unwrap();
    let pinned = artifact(graph, "g:lib-x:2.0");
    assert_eq!(from_bom.resolved_version.as_deref(), Some("2.0"));
    assert_eq!(from_bom.version_from_bom.as_ref().unwrap().version, "1.5");
    assert!(from_bom.overridden_by.as_ref().unwrap().contains(&pinned));
    assert!(graph.node(pinned).as_artifact().unwrap().overridden_by.is_none());

    let tree = resolved.pretty_print();
    assert!(tree.contains("g:lib-x:unspecified -> 2.0"), "{tree}");
    assert!(tree.contains("g:lib-x:2.0 (*)"), "{tree}");
    Ok(())
}

#[tokio::test]
async fn test_highest_version_wins_across_fragments_of_one_context() -> Result<()> {
    let repository = InMemoryRepository::new()
        .with_artifact(
            coords("g:a:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:x:1.2"))),
        )
        .with_artifact(
            coords("g:b:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:x:1.10"))),
        )
        .with_artifact(coords("g:x:1.2"), ArtifactMetadata::default())
        .with_artifact(coords("g:x:1.10"), ArtifactMetadata::default());
    let request = ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::maven(coords("g:a:1.0")))
        .with("lib", "jvm", DeclaredDependency::maven(coords("g:b:1.0")));

    let resolved = resolver(Arc::new(repository)).resolve(&request).await?;
    let graph = resolved.graph();

    // Numeric segments compare as numbers: 1.10 > 1.2.
    let old = graph.node(artifact(graph, "g:x:1.2")).as_artifact().unwrap();
    assert_eq!(old.resolved_version.as_deref(), Some("1.10"));
    assert!(resolved.pretty_print().contains("g:x:1.2 -> 1.10"));
    Ok(())
}

#[tokio::test]
async fn test_contexts_resolve_independently() -> Result<()> {
    let repository = InMemoryRepository::new()
        .with_artifact(coords("g:x:1.0"), ArtifactMetadata::default())
        .with_artifact(coords("g:x:2.0"), ArtifactMetadata::default());
    let request = ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::maven(coords("g:x:1.0")))
        .with("app", "jvmTest", DeclaredDependency::maven(coords("g:x:2.0")))
        .with_fragment(depgraph_cli::models::FragmentSettings {
            module: "app".to_string(),
            fragment: "jvmTest".to_string(),
            platforms: Default::default(),
            is_test: Some(true),
        });

    let resolved = resolver(Arc::new(repository)).resolve(&request).await?;
    let graph = resolved.graph();
    let main = graph.node(artifact(graph, "g:x:1.0")).as_artifact().unwrap();
    assert_eq!(main.resolved_version.as_deref(), Some("1.0"), "test classpath does not leak into main");
    assert!(!main.is_overridden());
    Ok(())
}

#[tokio::test]
async fn test_kmp_variant_and_reverse_mapping() -> Result<()> {
    let resolved = resolver(Arc::new(fixtures::okio_repository()))
        .resolve(&fixtures::okio_request())
        .await?;

    let jvm = ResolutionContext::classpath(ResolutionScope::Compile, [ResolutionPlatform::Jvm], false);
    assert_eq!(
        resolved.variant_of(&coords("com.example:okio:3.9.0"), &jvm),
        Some(&coords("com.example:okio-jvm:3.9.0"))
    );
    assert_eq!(
        resolved.parent_kmp_library(&coords("com.example:okio-jvm:3.9.0")),
        Some(&coords("com.example:okio:3.9.0"))
    );
    Ok(())
}

#[tokio::test]
async fn test_multi_platform_context_keeps_common_library() -> Result<()> {
    let mut request = fixtures::okio_request();
    request.input.platforms = [ResolutionPlatform::Jvm, ResolutionPlatform::IosArm64].into();

    let resolved = resolver(Arc::new(fixtures::okio_repository())).resolve(&request).await?;
    let graph = resolved.graph();
    let okio = graph.node(artifact(graph, "com.example:okio:3.9.0")).as_artifact().unwrap();
    assert!(okio.publishing_coordinates.is_none());
    assert!(artifacts(graph, "com.example:okio-jvm:3.9.0").is_empty());
    assert!(resolved.variants().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_scopes_filter_transitive_dependencies() -> Result<()> {
    let repository = InMemoryRepository::new()
        .with_artifact(
            coords("g:a:1.0"),
            ArtifactMetadata::default()
                .with_dependency(MetadataDependency::compile(coords("g:api:1.0")))
                .with_dependency(MetadataDependency::compile(coords("g:impl:1.0")).with_scope(DependencyScope::Runtime))
                .with_dependency(MetadataDependency::compile(coords("g:junit:1.0")).with_scope(DependencyScope::Test)),
        )
        .with_artifact(coords("g:api:1.0"), ArtifactMetadata::default())
        .with_artifact(coords("g:impl:1.0"), ArtifactMetadata::default())
        .with_artifact(coords("g:junit:1.0"), ArtifactMetadata::default());
    let request = ResolutionRequest::default().with("app", "jvm", DeclaredDependency::maven(coords("g:a:1.0")));
    let repository = Arc::new(repository);

    let compile = resolver(repository.clone()).resolve(&request).await?;
    assert_eq!(artifacts(compile.graph(), "g:api:1.0").len(), 1);
    assert!(artifacts(compile.graph(), "g:impl:1.0").is_empty());
    assert!(artifacts(compile.graph(), "g:junit:1.0").is_empty());

    let mut runtime_request = request.clone();
    runtime_request.input.scope = ResolutionScope::Runtime;
    let runtime = resolver(repository).resolve(&runtime_request).await?;
    assert_eq!(artifacts(runtime.graph(), "g:impl:1.0").len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_overridden_subtree_becomes_orphaned() -> Result<()> {
    // g:x:1.0 brings g:old, g:x:2.0 does not; once 1.0 is overridden g:old
    // must disappear from every view.
    let repository = InMemoryRepository::new()
        .with_artifact(
            coords("g:x:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:old:1.0"))),
        )
        .with_artifact(coords("g:x:2.0"), ArtifactMetadata::default())
        .with_artifact(coords("g:old:1.0"), ArtifactMetadata::default())
        .with_artifact(
            coords("g:b:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:x:2.0"))),
        );
    let request = ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::maven(coords("g:x:1.0")))
        .with("app", "jvm", DeclaredDependency::maven(coords("g:b:1.0")));

    let resolved = resolver(Arc::new(repository)).resolve(&request).await?;
    let graph = resolved.graph();
    assert!(artifacts(graph, "g:old:1.0").is_empty());
    assert!(!resolved.pretty_print().contains("g:old"));
    let orphan = graph
        .ids()
        .find(|&id| graph.node(id).as_artifact().is_some_and(|a| a.coordinates == coords("g:old:1.0")));
    if let Some(orphan) = orphan {
        assert!(resolved.is_orphan(orphan));
    }
    resolved.validate()?;
    Ok(())
}

#[tokio::test]
async fn test_parent_child_consistency_on_layered_graph() -> Result<()> {
    let resolved = resolver(Arc::new(fixtures::layered_repository(4, 5)))
        .resolve(&fixtures::layered_request(5, 2))
        .await?;
    let graph = resolved.graph();
    assert_edges_consistent(graph);
    resolved.validate()?;

    // Level 0 asks for leaf 0.9, deeper levels for 1.0.
    let old_leaf = graph.node(artifact(graph, "g:leaf:0.9")).as_artifact().unwrap();
    assert_eq!(old_leaf.resolved_version.as_deref(), Some("1.0"));
    Ok(())
}

#[tokio::test]
async fn test_resolution_is_deterministic() -> Result<()> {
    let repository = Arc::new(fixtures::layered_repository(3, 6).with_latency(std::time::Duration::from_millis(1)));
    let request = fixtures::layered_request(6, 3);

    let first = resolver(repository.clone()).resolve(&request).await?;
    for _ in 0..3 {
        let again = resolver(repository.clone()).resolve(&request).await?;
        assert_eq!(again.pretty_print(), first.pretty_print());
        assert_eq!(again.encode()?, first.encode()?);
    }
    Ok(())
}
