//! In-memory repositories and requests for the recurring scenarios.

use crate::metadata::{ArtifactMetadata, InMemoryRepository, MetadataDependency};
use crate::models::{Coordinates, DeclaredDependency, ResolutionPlatform, ResolutionRequest};

/// Parses coordinates, panicking on malformed test input.
#[must_use]
pub fn coords(text: &str) -> Coordinates {
    text.parse()
        .unwrap_or_else(|e| panic!("invalid test coordinates '{text}': {e}"))
}

fn depends_on(text: &str) -> MetadataDependency {
    MetadataDependency::compile(coords(text))
}

/// A multiplatform library published per platform:
///
/// - `com.example:okio:3.9.0` points at `okio-jvm` on the JVM and `okio-iosarm64` on iOS
/// - `com.example:okio-jvm:3.9.0` depends on `org.jetbrains.kotlin:kotlin-stdlib:2.0.0`
#[must_use]
pub fn okio_repository() -> InMemoryRepository {
    InMemoryRepository::new()
        .with_artifact(
            coords("com.example:okio:3.9.0"),
            ArtifactMetadata::default()
                .with_variant(ResolutionPlatform::Jvm, coords("com.example:okio-jvm:3.9.0"))
                .with_variant(ResolutionPlatform::IosArm64, coords("com.example:okio-iosarm64:3.9.0")),
        )
        .with_artifact(
            coords("com.example:okio-jvm:3.9.0"),
            ArtifactMetadata::default().with_dependency(depends_on("org.jetbrains.kotlin:kotlin-stdlib:2.0.0")),
        )
        .with_artifact(coords("com.example:okio-iosarm64:3.9.0"), ArtifactMetadata::default())
        .with_artifact(coords("org.jetbrains.kotlin:kotlin-stdlib:2.0.0"), ArtifactMetadata::default())
}

/// `app:jvm` declaring `com.example:okio:3.9.0`.
#[must_use]
pub fn okio_request() -> ResolutionRequest {
    ResolutionRequest::default().with("app", "jvm", DeclaredDependency::maven(coords("com.example:okio:3.9.0")))
}

/// A BOM pinning `g:lib-x` to 1.5 while another library asks for 2.0:
///
/// - `g:bom:1.0` is a BOM with the constraint `g:lib-x:1.5`
/// - `g:lib-a:1.0` depends on `g:lib-x` without a version
/// - `g:lib-b:1.0` depends on `g:lib-x:2.0`
#[must_use]
pub fn bom_conflict_repository() -> InMemoryRepository {
    InMemoryRepository::new()
        .with_artifact(
            coords("g:bom:1.0"),
            ArtifactMetadata::default()
                .with_packaging("bom")
                .with_constraint(coords("g:lib-x:1.5")),
        )
        .with_artifact(
            coords("g:lib-a:1.0"),
            ArtifactMetadata::default().with_dependency(depends_on("g:lib-x")),
        )
        .with_artifact(
            coords("g:lib-b:1.0"),
            ArtifactMetadata::default().with_dependency(depends_on("g:lib-x:2.0")),
        )
        .with_artifact(coords("g:lib-x:1.5"), ArtifactMetadata::default())
        .with_artifact(
            coords("g:lib-x:2.0"),
            ArtifactMetadata::default().with_dependency(depends_on("g:lib-y:1.0")),
        )
        .with_artifact(coords("g:lib-y:1.0"), ArtifactMetadata::default())
}

/// `app:jvm` importing `g:bom:1.0` and declaring `g:lib-a:1.0` and `g:lib-b:1.0`.
#[must_use]
pub fn bom_conflict_request() -> ResolutionRequest {
    ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::bom(coords("g:bom:1.0")))
        .with("app", "jvm", DeclaredDependency::maven(coords("g:lib-a:1.0")))
        .with("app", "jvm", DeclaredDependency::maven(coords("g:lib-b:1.0")))
}

/// A wide, layered repository: `layers` levels of `width` libraries, each
/// depending on every library of the next level, all sharing one leaf.
///
/// Every library of level `n` is `g:lib-n-i:1.0`; the leaf is `g:leaf:1.0`
/// and level 0 libraries ask for `g:leaf:0.9`.
#[must_use]
pub fn layered_repository(layers: usize, width: usize) -> InMemoryRepository {
    let mut repository = InMemoryRepository::new();
    for layer in 0..layers {
        for i in 0..width {
            let mut metadata = ArtifactMetadata::default();
            if layer + 1 < layers {
                for j in 0..width {
                    metadata = metadata.with_dependency(depends_on(&format!("g:lib-{}-{j}:1.0", layer + 1)));
                }
            }
            let leaf = if layer == 0 { "g:leaf:0.9" } else { "g:leaf:1.0" };
            metadata = metadata.with_dependency(depends_on(leaf));
            repository.insert(coords(&format!("g:lib-{layer}-{i}:1.0")), metadata);
        }
    }
    repository.insert(coords("g:leaf:0.9"), ArtifactMetadata::default());
    repository.insert(coords("g:leaf:1.0"), ArtifactMetadata::default());
    repository
}

/// One declaration of every level-0 library of [`layered_repository`],
/// spread over `modules` modules.
#[must_use]
pub fn layered_request(width: usize, modules: usize) -> ResolutionRequest {
    let mut request = ResolutionRequest::default();
    for i in 0..width {
        let module = format!("module-{}", i % modules.max(1));
        request.declare(module, "jvm", DeclaredDependency::maven(coords(&format!("g:lib-0-{i}:1.0"))));
    }
    request
}
