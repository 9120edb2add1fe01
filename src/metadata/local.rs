//! Repository fetcher over local directories.
//!
//! Layout, per repository root:
//!
//! ```text
//! <root>/<group with '.' as '/'>/<module>/<version>/<module>-<version>.json
//! <root>/<group with '.' as '/'>/<module>/<version>/<module>-<version>.jar
//! <root>/<group with '.' as '/'>/<module>/<version>/<module>-<version>-sources.jar
//! ```
//!
//! Roots are searched in order; the first one holding the metadata document
//! wins.

use super::{ArtifactMetadata, FetchError, MetadataFetcher};
use crate::models::Coordinates;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct LocalRepository {
    roots: Vec<PathBuf>,
}

impl LocalRepository {
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Directory of one artifact version under `root`.
    #[must_use]
    pub fn artifact_dir(root: &Path, coordinates: &Coordinates) -> PathBuf {
        let mut dir = root.to_path_buf();
        for segment in coordinates.group.split('.') {
            dir.push(segment);
        }
        dir.push(&coordinates.module);
        dir.push(coordinates.version_or_unspecified());
        dir
    }

    fn file_stem(coordinates: &Coordinates) -> String {
        format!("{}-{}", coordinates.module, coordinates.version_or_unspecified())
    }

    /// Path of the metadata document under `root`.
    #[must_use]
    pub fn metadata_path(root: &Path, coordinates: &Coordinates) -> PathBuf {
        Self::artifact_dir(root, coordinates).join(format!("{}.json", Self::file_stem(coordinates)))
    }

    async fn locate(&self, coordinates: &Coordinates) -> Option<(PathBuf, PathBuf)> {
        for root in &self.roots {
            let path = Self::metadata_path(root, coordinates);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some((root.clone(), path));
            }
        }
        None
    }
}

#[async_trait]
impl MetadataFetcher for LocalRepository {
    async fn fetch_metadata(&self, coordinates: &Coordinates) -> Result<ArtifactMetadata, FetchError> {
        if coordinates.version.is_none() {
            return Err(FetchError::not_found(coordinates));
        }
        let Some((_, path)) = self.locate(coordinates).await else {
            debug!(target: "fetch", %coordinates, "metadata not found in {} root(s)", self.roots.len());
            return Err(FetchError::not_found(coordinates));
        };

        trace!(target: "fetch", path = %path.display(), "reading metadata");
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Other {
                coordinates: coordinates.to_string(),
                reason: format!("{}: {e}", path.display()),
            })?;

        serde_json::from_str(&content).map_err(|e| FetchError::Malformed {
            coordinates: coordinates.to_string(),
            reason: format!("{}: {e}", path.display()),
        })
    }

    async fn fetch_files(
        &self,
        coordinates: &Coordinates,
        want_sources: bool,
    ) -> Result<Vec<PathBuf>, FetchError> {
        let Some((root, _)) = self.locate(coordinates).await else {
            return Err(FetchError::not_found(coordinates));
        };

        let dir = Self::artifact_dir(&root, coordinates);
        let stem = Self::file_stem(coordinates);
        let mut candidates = vec![dir.join(format!("{stem}.jar"))];
        if want_sources {
            candidates.push(dir.join(format!("{stem}-sources.jar")));
        }

        let mut files = Vec::new();
        for candidate in candidates {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                files.push(candidate);
            }
        }
        Ok(files)
    }
}
