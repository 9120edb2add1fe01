//! Artifact metadata and the fetcher seam.
//!
//! The resolution engine never talks to a repository directly. Everything it
//! knows about an artifact comes through [`MetadataFetcher`]:
//!
//! - [`MetadataFetcher::fetch_metadata`] returns the declared dependencies,
//!   declared constraints (BOM entries) and platform variants of one artifact
//! - [`MetadataFetcher::fetch_files`] returns the local files of one artifact
//!
//! Two implementations ship with the crate: [`LocalRepository`] reads JSON
//! documents from directories on disk, [`InMemoryRepository`] serves metadata
//! registered programmatically (embedding, tests).

pub mod local;
pub mod memory;

pub use local::LocalRepository;
pub use memory::InMemoryRepository;

use crate::models::{Coordinates, DependencyScope, ResolutionPlatform};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A dependency declared in artifact metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDependency {
    pub coordinates: Coordinates,
    #[serde(default)]
    pub scope: DependencyScope,
    #[serde(default)]
    pub optional: bool,
    /// Platforms the dependency is restricted to; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<ResolutionPlatform>,
    /// Imported as a platform/BOM rather than as a library.
    #[serde(default)]
    pub bom: bool,
}

impl MetadataDependency {
    #[must_use]
    pub fn compile(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            scope: DependencyScope::Compile,
            optional: false,
            platforms: Vec::new(),
            bom: false,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: DependencyScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn as_bom(mut self) -> Self {
        self.bom = true;
        self
    }
}

/// Platform-specific artifact a common library points at ("available-at").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformVariant {
    pub platform: ResolutionPlatform,
    pub coordinates: Coordinates,
}

/// What a repository knows about one artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// `jar`, `pom` or `bom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<MetadataDependency>,
    /// Fixed versions published for other coordinates.
    #[serde(default)]
    pub constraints: Vec<Coordinates>,
    #[serde(default)]
    pub variants: Vec<PlatformVariant>,
}

impl ArtifactMetadata {
    #[must_use]
    pub fn with_dependency(mut self, dependency: MetadataDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: Coordinates) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn with_variant(mut self, platform: ResolutionPlatform, coordinates: Coordinates) -> Self {
        self.variants.push(PlatformVariant {
            platform,
            coordinates,
        });
        self
    }

    #[must_use]
    pub fn with_packaging(mut self, packaging: &str) -> Self {
        self.packaging = Some(packaging.to_string());
        self
    }

    /// Whether the artifact only publishes constraints.
    #[must_use]
    pub fn is_bom(&self) -> bool {
        self.packaging.as_deref() == Some("bom")
    }

    #[must_use]
    pub fn variant_for(&self, platform: ResolutionPlatform) -> Option<&Coordinates> {
        self.variants
            .iter()
            .find(|v| v.platform == platform)
            .map(|v| &v.coordinates)
    }
}

/// Failure reported by a [`MetadataFetcher`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{coordinates} was not found in any repository")]
    NotFound { coordinates: String },

    /// Worth retrying (network hiccup, lock contention).
    #[error("transient failure fetching {coordinates}: {reason}")]
    Transient { coordinates: String, reason: String },

    #[error("malformed metadata for {coordinates}: {reason}")]
    Malformed { coordinates: String, reason: String },

    #[error("failed to fetch {coordinates}: {reason}")]
    Other { coordinates: String, reason: String },
}

impl FetchError {
    #[must_use]
    pub fn not_found(coordinates: &Coordinates) -> Self {
        Self::NotFound {
            coordinates: coordinates.to_string(),
        }
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Source of artifact metadata and files.
///
/// Implementations must be cheap to share across tasks; the resolver holds
/// them behind an `Arc` and calls them concurrently.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Metadata of one versioned artifact.
    async fn fetch_metadata(&self, coordinates: &Coordinates) -> Result<ArtifactMetadata, FetchError>;

    /// Local files of one versioned artifact, with sources when asked.
    async fn fetch_files(
        &self,
        coordinates: &Coordinates,
        want_sources: bool,
    ) -> Result<Vec<PathBuf>, FetchError>;
}
