//! Dependency insight on resolved graphs.

use crate::common::resolver;
use anyhow::Result;
use depgraph_cli::metadata::{ArtifactMetadata, InMemoryRepository, MetadataDependency};
use depgraph_cli::models::{DeclaredDependency, ResolutionRequest};
use depgraph_cli::test_utils::{coords, fixtures};
use std::sync::Arc;

#[tokio::test]
async fn test_insight_follows_effective_instances() -> Result<()> {
    let resolved = resolver(Arc::new(fixtures::bom_conflict_repository()))
        .resolve(&fixtures::bom_conflict_request())
        .await?;

    // The BOM-versioned instance under g:lib-a lost to the pin under g:lib-b,
    // which is already on the path to the effective instance.
    let expected = "\
root
╰─── module:app
     ╰─── app:jvm:g:lib-b:1.0
          ╰─── g:lib-b:1.0
               ╰─── g:lib-x:2.0
";
    assert_eq!(resolved.render_insight("g", "lib-x"), expected);
    Ok(())
}

#[tokio::test]
async fn test_insight_adds_path_to_winning_constraint() -> Result<()> {
    let repository = InMemoryRepository::new()
        .with_artifact(
            coords("g:bom:2.0"),
            ArtifactMetadata::default()
                .with_packaging("bom")
                .with_constraint(coords("g:x:2.0")),
        )
        .with_artifact(
            coords("g:platform:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:bom:2.0")).as_bom()),
        )
        .with_artifact(coords("g:x:1.0"), ArtifactMetadata::default())
        .with_artifact(coords("g:x:2.0"), ArtifactMetadata::default());
    let request = ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::maven(coords("g:x:1.0")))
        .with("app", "jvm", DeclaredDependency::maven(coords("g:platform:1.0")));

    let resolved = resolver(Arc::new(repository)).resolve(&request).await?;
    let expected = "\
root
╰─── module:app
     ├─── app:jvm:g:x:1.0
     │    ╰─── g:x:1.0 -> 2.0
     ╰─── app:jvm:g:platform:1.0
          ╰─── g:platform:1.0
               ╰─── g:bom:2.0
                    ╰─── g:x:2.0 (c)
";
    assert_eq!(resolved.render_insight("g", "x"), expected);
    Ok(())
}

#[tokio::test]
async fn test_insight_leaves_out_unrelated_branches() -> Result<()> {
    let repository = InMemoryRepository::new()
        .with_artifact(
            coords("g:a:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:target:1.0"))),
        )
        .with_artifact(
            coords("g:unrelated:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:other:1.0"))),
        )
        .with_artifact(coords("g:target:1.0"), ArtifactMetadata::default())
        .with_artifact(coords("g:other:1.0"), ArtifactMetadata::default());
    let request = ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::maven(coords("g:a:1.0")))
        .with("app", "jvm", DeclaredDependency::maven(coords("g:unrelated:1.0")))
        .with("tool", "jvm", DeclaredDependency::maven(coords("g:unrelated:1.0")));

    let resolved = resolver(Arc::new(repository)).resolve(&request).await?;
    let rendered = resolved.render_insight("g", "target");
    assert_eq!(
        rendered,
        "root\n╰─── module:app\n     ╰─── app:jvm:g:a:1.0\n          ╰─── g:a:1.0\n               ╰─── g:target:1.0\n"
    );
    assert!(resolved.dependency_insight("g", "absent").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_insight_is_computed_once_under_concurrent_queries() -> Result<()> {
    let resolved = Arc::new(
        resolver(Arc::new(fixtures::layered_repository(3, 4)))
            .resolve(&fixtures::layered_request(4, 2))
            .await?,
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let resolved = Arc::clone(&resolved);
        handles.push(tokio::spawn(async move { resolved.dependency_insight("g", "leaf") }));
    }
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await?);
    }

    assert!(results.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(resolved.insight_walks(), 1);

    resolved.dependency_insight("g", "lib-2-0");
    resolved.dependency_insight("g", "leaf");
    assert_eq!(resolved.insight_walks(), 2);
    Ok(())
}
