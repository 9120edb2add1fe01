//! Resolved graphs written to disk and read back.

use crate::common::{artifact, resolver};
use anyhow::Result;
use depgraph_cli::core::DrError;
use depgraph_cli::graph::Severity;
use depgraph_cli::metadata::{ArtifactMetadata, MetadataDependency};
use depgraph_cli::models::{
    DeclaredDependency, FragmentSettings, ResolutionContext, ResolutionPlatform, ResolutionScope,
};
use depgraph_cli::resolver::ResolvedGraph;
use depgraph_cli::serialization;
use depgraph_cli::test_utils::{coords, fixtures};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_decoded_graph_answers_queries_like_the_original() -> Result<()> {
    let resolved = resolver(Arc::new(fixtures::bom_conflict_repository()))
        .resolve(&fixtures::bom_conflict_request())
        .await?;

    let decoded = ResolvedGraph::decode(&resolved.encode()?)?;
    decoded.validate()?;

    assert_eq!(decoded.pretty_print(), resolved.pretty_print());
    assert_eq!(
        decoded.render_insight("g", "lib-x"),
        resolved.render_insight("g", "lib-x")
    );
    assert_eq!(
        decoded.problems(Severity::Info).len(),
        resolved.problems(Severity::Info).len()
    );

    let graph = decoded.graph();
    let from_bom = graph.node(artifact(graph, "g:lib-x")).as_artifact().unwrap();
    assert_eq!(from_bom.version_from_bom.as_ref().map(|b| b.version.as_str()), Some("1.5"));
    assert!(from_bom.overridden_by.as_ref().is_some_and(|causes| !causes.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_variant_index_is_rebuilt_from_decoded_graph() -> Result<()> {
    let resolved = resolver(Arc::new(fixtures::okio_repository()))
        .resolve(&fixtures::okio_request())
        .await?;
    let decoded = ResolvedGraph::decode(&resolved.encode()?)?;

    let jvm = ResolutionContext::classpath(ResolutionScope::Compile, [ResolutionPlatform::Jvm], false);
    assert_eq!(
        decoded.variant_of(&coords("com.example:okio:3.9.0"), &jvm),
        Some(&coords("com.example:okio-jvm:3.9.0"))
    );
    assert_eq!(
        decoded.parent_kmp_library(&coords("com.example:okio-jvm:3.9.0")),
        Some(&coords("com.example:okio:3.9.0"))
    );
    Ok(())
}

#[tokio::test]
async fn test_overridden_kmp_library_keeps_indexes_in_agreement() -> Result<()> {
    let repository = fixtures::okio_repository()
        .with_artifact(
            coords("com.example:okio:3.10.0"),
            ArtifactMetadata::default().with_variant(ResolutionPlatform::Jvm, coords("com.example:okio-jvm:3.10.0")),
        )
        .with_artifact(coords("com.example:okio-jvm:3.10.0"), ArtifactMetadata::default())
        .with_artifact(
            coords("g:b:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("com.example:okio:3.10.0"))),
        );
    let request = fixtures::okio_request().with("app", "jvm", DeclaredDependency::maven(coords("g:b:1.0")));
    let resolved = resolver(Arc::new(repository)).resolve(&request).await?;
    let decoded = ResolvedGraph::decode(&resolved.encode()?)?;

    assert_eq!(resolved.variants(), decoded.variants());
    let jvm = ResolutionContext::classpath(ResolutionScope::Compile, [ResolutionPlatform::Jvm], false);
    assert_eq!(resolved.variant_of(&coords("com.example:okio:3.9.0"), &jvm), None);
    assert_eq!(resolved.parent_kmp_library(&coords("com.example:okio-jvm:3.9.0")), None);
    assert_eq!(
        resolved.variant_of(&coords("com.example:okio:3.10.0"), &jvm),
        Some(&coords("com.example:okio-jvm:3.10.0"))
    );
    Ok(())
}

#[tokio::test]
async fn test_fragment_without_declarations_survives_decoding() -> Result<()> {
    let request = fixtures::okio_request().with_fragment(FragmentSettings {
        module: "app".to_string(),
        fragment: "jvmTest".to_string(),
        platforms: Default::default(),
        is_test: Some(true),
    });
    let resolved = resolver(Arc::new(fixtures::okio_repository())).resolve(&request).await?;
    let decoded = ResolvedGraph::decode(&resolved.encode()?)?;

    for graph in [&resolved, &decoded] {
        assert!(graph.fragment_deps("app", "jvmTest")?.entries().is_empty());
        assert!(matches!(
            graph.fragment_deps("app", "js"),
            Err(DrError::FragmentNotFound { .. })
        ));
    }
    Ok(())
}

#[tokio::test]
async fn test_encoding_is_stable() -> Result<()> {
    let resolved = resolver(Arc::new(fixtures::bom_conflict_repository()))
        .resolve(&fixtures::bom_conflict_request())
        .await?;
    let encoded = resolved.encode()?;
    let again = ResolvedGraph::decode(&encoded)?.encode()?;
    assert_eq!(encoded, again);
    Ok(())
}

#[tokio::test]
async fn test_write_and_read_through_files() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("graphs").join("app.json");
    let resolved = resolver(Arc::new(fixtures::okio_repository()))
        .resolve(&fixtures::okio_request())
        .await?;

    serialization::write_to_path(resolved.graph(), &path)?;
    let read = ResolvedGraph::from_graph(serialization::read_from_path(&path)?);
    assert_eq!(read.pretty_print(), resolved.pretty_print());
    let read_fragment = read.fragment_deps("app", "jvm")?;
    let resolved_fragment = resolved.fragment_deps("app", "jvm")?;
    assert_eq!(
        read_fragment.view(read.graph()).nodes().len(),
        resolved_fragment.view(resolved.graph()).nodes().len()
    );
    Ok(())
}

#[test]
fn test_garbage_and_foreign_versions_are_rejected() {
    assert!(ResolvedGraph::decode("not json").is_err());
    assert!(matches!(
        ResolvedGraph::decode(r#"{"nodes": [], "edges": []}"#),
        Err(DrError::SerializationError { .. })
    ));
    assert!(matches!(
        ResolvedGraph::decode(r#"{"schema_version": 42, "root": 0, "nodes": [], "edges": [], "fingerprint": ""}"#),
        Err(DrError::UnsupportedSchemaVersion { found: 42, .. })
    ));
}
