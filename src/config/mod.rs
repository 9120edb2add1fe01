//! User configuration of the resolver.
//!
//! Settings live in a TOML file, by default `~/.depgraph/config.toml`:
//!
//! ```toml
//! cache_dir = "~/.depgraph/cache"
//! max_concurrency = 16
//! fetch_retries = 3
//! retry_base_delay_ms = 10
//! timeout_secs = 300
//! download_sources = false
//! repositories = ["~/.m2/depgraph", "$CI_CACHE/maven"]
//! ```
//!
//! A missing file means defaults. Two environment variables take part:
//!
//! - `DEPGRAPH_CONFIG` points at another configuration file
//! - `DEPGRAPH_CACHE_DIR` overrides `cache_dir`
//!
//! Paths expand `~` and environment variables.

use crate::cache::RetryPolicy;
use crate::constants::{DEFAULT_FETCH_RETRIES, STARTING_BACKOFF_DELAY_MS, default_parallelism};
use crate::metadata::LocalRepository;
use crate::models::FileCacheConfig;
use crate::resolver::ResolverSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "DEPGRAPH_CONFIG";

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "DEPGRAPH_CACHE_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResolverConfig {
    /// Directory holding cross-process artifact locks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Concurrent metadata fetches per expansion wave. Defaults to four per core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_retries: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_base_delay_ms: Option<u64>,

    /// Give up on a resolution after this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub download_sources: bool,

    /// Local repository roots, searched in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,
}

impl ResolverConfig {
    /// Loads the configuration from `DEPGRAPH_CONFIG` or the default location.
    pub async fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_path()?,
        };
        Self::load_with_optional(Some(path)).await
    }

    /// Loads from `path` when given, else from the default location. A
    /// missing file yields defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        let mut config = if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await?
        } else {
            debug!("no configuration at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Loads a specific file without environment overrides.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            crate::core::DrError::ConfigError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Writes the configuration as pretty TOML, creating parent directories.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write configuration to {}", path.display()))
    }

    /// `~/.depgraph/config.toml`, or `%LOCALAPPDATA%\depgraph\config.toml` on Windows.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("depgraph")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".depgraph")
        };
        Ok(config_dir.join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
            let dir = dir.to_string_lossy().into_owned();
            if !dir.is_empty() {
                self.cache_dir = Some(dir);
            }
        }
    }

    /// Expanded cache directory.
    pub fn cache_dir(&self) -> Result<Option<PathBuf>> {
        self.cache_dir.as_deref().map(expand_path).transpose()
    }

    /// Expanded repository roots.
    pub fn repositories(&self) -> Result<Vec<PathBuf>> {
        self.repositories.iter().map(|r| expand_path(r)).collect()
    }

    #[must_use]
    pub fn settings(&self) -> ResolverSettings {
        ResolverSettings {
            max_concurrency: self.max_concurrency.unwrap_or_else(default_parallelism).max(1),
            retry: RetryPolicy {
                retries: self.fetch_retries.unwrap_or(DEFAULT_FETCH_RETRIES),
                base_delay_ms: self.retry_base_delay_ms.unwrap_or(STARTING_BACKOFF_DELAY_MS),
            },
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn file_cache(&self) -> Result<FileCacheConfig> {
        Ok(FileCacheConfig {
            cache_dir: self.cache_dir()?,
            download_sources: self.download_sources,
        })
    }

    /// Repository over the configured roots, with `extra` roots searched first.
    pub fn repository(&self, extra: &[PathBuf]) -> Result<LocalRepository> {
        let mut roots = extra.to_vec();
        roots.extend(self.repositories()?);
        Ok(LocalRepository::new(roots))
    }
}

/// Expands `~` and environment variables in a configured path.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand environment variables in path: {raw}"))?;
    Ok(PathBuf::from(expanded.into_owned()))
}
