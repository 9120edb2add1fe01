//! Fetcher serving metadata registered in memory.

use super::{ArtifactMetadata, FetchError, MetadataFetcher};
use crate::models::Coordinates;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// In-memory [`MetadataFetcher`].
///
/// Counts every call so callers can observe how often an artifact was
/// actually fetched, and can simulate latency and transient failures.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    artifacts: HashMap<Coordinates, ArtifactMetadata>,
    files: HashMap<Coordinates, Vec<PathBuf>>,
    latency: Option<Duration>,
    transient_failures: DashMap<Coordinates, usize>,
    metadata_fetches: DashMap<Coordinates, usize>,
    file_fetches: DashMap<Coordinates, usize>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coordinates: Coordinates, metadata: ArtifactMetadata) {
        self.artifacts.insert(coordinates, metadata);
    }

    #[must_use]
    pub fn with_artifact(mut self, coordinates: Coordinates, metadata: ArtifactMetadata) -> Self {
        self.insert(coordinates, metadata);
        self
    }

    #[must_use]
    pub fn with_files(mut self, coordinates: Coordinates, files: Vec<PathBuf>) -> Self {
        self.files.insert(coordinates, files);
        self
    }

    /// Delays every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fails the next `times` metadata fetches of `coordinates` transiently.
    #[must_use]
    pub fn failing_transiently(self, coordinates: Coordinates, times: usize) -> Self {
        self.transient_failures.insert(coordinates, times);
        self
    }

    /// Number of metadata fetches observed for `coordinates`.
    #[must_use]
    pub fn metadata_fetches(&self, coordinates: &Coordinates) -> usize {
        self.metadata_fetches.get(coordinates).map_or(0, |c| *c)
    }

    #[must_use]
    pub fn total_metadata_fetches(&self) -> usize {
        self.metadata_fetches.iter().map(|e| *e.value()).sum()
    }

    #[must_use]
    pub fn file_fetches(&self, coordinates: &Coordinates) -> usize {
        self.file_fetches.get(coordinates).map_or(0, |c| *c)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_transient_failure(&self, coordinates: &Coordinates) -> bool {
        match self.transient_failures.get_mut(coordinates) {
            Some(mut remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl MetadataFetcher for InMemoryRepository {
    async fn fetch_metadata(&self, coordinates: &Coordinates) -> Result<ArtifactMetadata, FetchError> {
        *self.metadata_fetches.entry(coordinates.clone()).or_insert(0) += 1;
        self.simulate_latency().await;

        if self.take_transient_failure(coordinates) {
            return Err(FetchError::Transient {
                coordinates: coordinates.to_string(),
                reason: "simulated failure".to_string(),
            });
        }

        self.artifacts
            .get(coordinates)
            .cloned()
            .ok_or_else(|| FetchError::not_found(coordinates))
    }

    async fn fetch_files(
        &self,
        coordinates: &Coordinates,
        want_sources: bool,
    ) -> Result<Vec<PathBuf>, FetchError> {
        *self.file_fetches.entry(coordinates.clone()).or_insert(0) += 1;
        self.simulate_latency().await;

        let files = self
            .files
            .get(coordinates)
            .ok_or_else(|| FetchError::not_found(coordinates))?;
        Ok(files
            .iter()
            .filter(|f| {
                want_sources
                    || !f
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with("-sources.jar"))
            })
            .cloned()
            .collect())
    }
}
