//! Artifact files collected for resolved graphs.

use crate::common::resolver;
use anyhow::Result;
use depgraph_cli::core::DrError;
use depgraph_cli::metadata::{ArtifactMetadata, MetadataDependency};
use depgraph_cli::models::{DeclaredDependency, ResolutionRequest};
use depgraph_cli::test_utils::{RepositoryFixture, coords, fixtures};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::test]
async fn test_variant_replaces_common_library_files() -> Result<()> {
    let repository = Arc::new(
        fixtures::okio_repository()
            .with_files(coords("com.example:okio:3.9.0"), vec![PathBuf::from("okio-3.9.0.klib")])
            .with_files(coords("com.example:okio-jvm:3.9.0"), vec![PathBuf::from("okio-jvm-3.9.0.jar")])
            .with_files(
                coords("org.jetbrains.kotlin:kotlin-stdlib:2.0.0"),
                vec![PathBuf::from("kotlin-stdlib-2.0.0.jar")],
            ),
    );
    let resolver = resolver(repository.clone());
    let resolved = resolver.resolve(&fixtures::okio_request()).await?;

    let report = resolver.download_files(&resolved).await;
    assert!(report.is_complete());
    assert_eq!(
        report.files,
        vec![PathBuf::from("okio-jvm-3.9.0.jar"), PathBuf::from("kotlin-stdlib-2.0.0.jar")]
    );
    assert_eq!(repository.file_fetches(&coords("com.example:okio:3.9.0")), 0);
    Ok(())
}

#[tokio::test]
async fn test_files_are_downloaded_once_per_resolver() -> Result<()> {
    let repository = Arc::new(
        fixtures::bom_conflict_repository()
            .with_files(coords("g:lib-a:1.0"), vec![PathBuf::from("lib-a-1.0.jar")])
            .with_files(coords("g:lib-b:1.0"), vec![PathBuf::from("lib-b-1.0.jar")])
            .with_files(coords("g:lib-x:2.0"), vec![PathBuf::from("lib-x-2.0.jar")])
            .with_files(coords("g:lib-y:1.0"), vec![PathBuf::from("lib-y-1.0.jar")]),
    );
    let resolver = resolver(repository.clone());
    let resolved = resolver.resolve(&fixtures::bom_conflict_request()).await?;

    let first = resolver.download_files(&resolved).await;
    let second = resolver.download_files(&resolved).await;
    assert!(first.is_complete());
    assert_eq!(first.files, second.files);
    // The BOM has no files, and the overridden lib-x resolves to the same 2.0 jar.
    assert_eq!(first.files.len(), 4);
    assert_eq!(repository.file_fetches(&coords("g:lib-x:2.0")), 1);
    assert_eq!(repository.file_fetches(&coords("g:bom:1.0")), 0);
    Ok(())
}

#[tokio::test]
async fn test_failure_is_recorded_per_artifact_and_retried_later() -> Result<()> {
    let repository = Arc::new(
        fixtures::okio_repository()
            .with_files(coords("com.example:okio-jvm:3.9.0"), vec![PathBuf::from("okio-jvm-3.9.0.jar")]),
    );
    let resolver = resolver(repository.clone());
    let resolved = resolver.resolve(&fixtures::okio_request()).await?;

    let report = resolver.download_files(&resolved).await;
    assert!(!report.is_complete());
    assert_eq!(report.files, vec![PathBuf::from("okio-jvm-3.9.0.jar")]);
    assert_eq!(report.failures.len(), 1);
    let (failed, error) = &report.failures[0];
    assert_eq!(failed, &coords("org.jetbrains.kotlin:kotlin-stdlib:2.0.0"));
    assert!(matches!(error, DrError::DownloadFailed { .. }));

    resolver.download_files(&resolved).await;
    let stdlib = coords("org.jetbrains.kotlin:kotlin-stdlib:2.0.0");
    assert_eq!(repository.file_fetches(&stdlib), 2);
    assert_eq!(repository.file_fetches(&coords("com.example:okio-jvm:3.9.0")), 1);
    Ok(())
}

#[tokio::test]
async fn test_local_repository_files_and_locks() -> Result<()> {
    let fixture = RepositoryFixture::new()?;
    let jar = fixture.publish_with_jar(
        "g:app-lib:1.0",
        &ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:util:2.0"))),
    )?;
    let util_jar = fixture.publish_with_jar("g:util:2.0", &ArtifactMetadata::default())?;

    let mut request =
        ResolutionRequest::default().with("app", "jvm", DeclaredDependency::maven(coords("g:app-lib:1.0")));
    request.input.file_cache.cache_dir = Some(fixture.path().join("cache"));

    let resolver = resolver(Arc::new(fixture.repository()));
    let resolved = resolver.resolve(&request).await?;
    let report = resolver.download_files(&resolved).await;

    assert!(report.is_complete(), "{:?}", report.failures);
    assert_eq!(report.files, vec![jar, util_jar]);
    assert!(fixture.path().join("cache").is_dir());
    Ok(())
}
