//! On-disk repositories for tests that go through [`LocalRepository`] or the
//! command line.

use crate::metadata::{ArtifactMetadata, LocalRepository};
use crate::models::Coordinates;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory holding a repository root and request files.
///
/// ```text
/// <temp>/repo/...        repository root in the local layout
/// <temp>/<name>.toml     request files
/// ```
pub struct RepositoryFixture {
    temp_dir: TempDir,
}

impl RepositoryFixture {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        std::fs::create_dir_all(temp_dir.path().join("repo"))?;
        Ok(Self { temp_dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Repository root.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.path().join("repo")
    }

    #[must_use]
    pub fn repository(&self) -> LocalRepository {
        LocalRepository::new(vec![self.root()])
    }

    /// Writes the metadata document of `coordinates`.
    pub fn publish(&self, coordinates: &str, metadata: &ArtifactMetadata) -> Result<Coordinates> {
        let coordinates: Coordinates = coordinates.parse()?;
        let path = LocalRepository::metadata_path(&self.root(), &coordinates);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(metadata)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(coordinates)
    }

    /// Writes the metadata document and a jar for `coordinates`.
    pub fn publish_with_jar(&self, coordinates: &str, metadata: &ArtifactMetadata) -> Result<PathBuf> {
        let coordinates = self.publish(coordinates, metadata)?;
        let jar = LocalRepository::artifact_dir(&self.root(), &coordinates).join(format!(
            "{}-{}.jar",
            coordinates.module,
            coordinates.version_or_unspecified()
        ));
        std::fs::write(&jar, b"PK\x03\x04")?;
        Ok(jar)
    }

    /// Writes a request file next to the repository root.
    pub fn write_request(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
