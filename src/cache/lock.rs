//! File locking for artifact downloads.
//!
//! Several processes may share one artifact cache directory. Downloads of the
//! same coordinates are serialized through an exclusive OS file lock held for
//! the duration of the download; the lock is released when the
//! [`ArtifactLock`] is dropped.

use crate::constants::default_lock_timeout;
use crate::core::DrError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An exclusive lock on one artifact of a cache directory.
#[derive(Debug)]
pub struct ArtifactLock {
    file: File,
    path: PathBuf,
}

impl ArtifactLock {
    /// Acquires the lock named `name` under `{cache_dir}/.locks/`.
    ///
    /// The blocking OS call runs on the blocking pool. Waiting is bounded by
    /// the default lock timeout.
    pub async fn acquire(cache_dir: &Path, name: &str) -> Result<Self, DrError> {
        Self::acquire_with_timeout(cache_dir, name, default_lock_timeout()).await
    }

    pub async fn acquire_with_timeout(
        cache_dir: &Path,
        name: &str,
        timeout: Duration,
    ) -> Result<Self, DrError> {
        let locks_dir = cache_dir.join(".locks");
        tokio::fs::create_dir_all(&locks_dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                DrError::Io(format!(
                    "Permission denied: cannot create locks directory at {}",
                    locks_dir.display()
                ))
            } else {
                DrError::Io(format!("Failed to create directory {}: {e}", locks_dir.display()))
            }
        })?;

        let lock_path = locks_dir.join(format!("{name}.lock"));
        let blocking_path = lock_path.clone();

        let task = tokio::task::spawn_blocking(move || -> Result<File, DrError> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&blocking_path)
                .map_err(|e| {
                    DrError::Io(format!("Failed to open lock file {}: {e}", blocking_path.display()))
                })?;
            FileExt::lock_exclusive(&file).map_err(|e| {
                DrError::Io(format!("Failed to lock {}: {e}", blocking_path.display()))
            })?;
            Ok(file)
        });

        let file = tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| {
                DrError::Io(format!(
                    "Timed out after {}s waiting for lock {}",
                    timeout.as_secs(),
                    lock_path.display()
                ))
            })?
            .map_err(|e| DrError::Io(format!("Lock task failed: {e}")))??;

        tracing::trace!(target: "cache", path = %lock_path.display(), "lock acquired");
        Ok(Self {
            file,
            path: lock_path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArtifactLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(target: "cache", "Failed to unlock {}: {e}", self.path.display());
        }
    }
}
