//! Artifact file lists, downloaded at most once per coordinates.

use super::lock::ArtifactLock;
use crate::core::DrError;
use crate::metadata::MetadataFetcher;
use crate::models::{Coordinates, FileCacheConfig};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type Slot = Arc<Mutex<Option<Vec<PathBuf>>>>;

/// Memoizes [`MetadataFetcher::fetch_files`] per coordinates.
///
/// Each coordinates gets its own async mutex, so downloads of different
/// artifacts proceed in parallel while a second request for the same artifact
/// waits for the first. Successful lists are kept for the life of the cache;
/// a failure is reported to the caller and the next request tries again.
pub struct FileCache {
    fetcher: Arc<dyn MetadataFetcher>,
    config: FileCacheConfig,
    slots: DashMap<Coordinates, Slot>,
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache")
            .field("config", &self.config)
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl FileCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, config: FileCacheConfig) -> Self {
        Self {
            fetcher,
            config,
            slots: DashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &FileCacheConfig {
        &self.config
    }

    /// Files of one versioned artifact.
    pub async fn files(&self, coordinates: &Coordinates) -> Result<Vec<PathBuf>, DrError> {
        let slot = self.slots.entry(coordinates.clone()).or_default().clone();
        let mut files = slot.lock().await;
        if let Some(cached) = files.as_ref() {
            return Ok(cached.clone());
        }

        let _lock = match &self.config.cache_dir {
            Some(dir) => Some(ArtifactLock::acquire(dir, &lock_name(coordinates)).await?),
            None => None,
        };

        debug!(target: "cache", %coordinates, "downloading artifact files");
        let fetched = self
            .fetcher
            .fetch_files(coordinates, self.config.download_sources)
            .await
            .map_err(|e| DrError::DownloadFailed {
                coordinates: coordinates.to_string(),
                reason: e.to_string(),
            })?;

        *files = Some(fetched.clone());
        Ok(fetched)
    }
}

/// Lock file name: readable module prefix plus a digest of the coordinates.
fn lock_name(coordinates: &Coordinates) -> String {
    let digest = Sha256::digest(coordinates.to_string().as_bytes());
    let module: String = coordinates
        .module
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{module}-{}", &hex::encode(digest)[..16])
}
