//! Arguments and helpers shared by the commands that resolve a request.

use crate::cli::request::load_request;
use crate::config::ResolverConfig;
use crate::resolver::{ResolvedGraph, Resolver};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Request file plus the resolver knobs that can be given per invocation.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Request file describing modules, fragments and declarations.
    pub request: PathBuf,

    /// Extra local repository root, searched before the configured ones.
    ///
    /// May be given several times.
    #[arg(long = "repo", value_name = "DIR")]
    pub repositories: Vec<PathBuf>,

    /// Give up after this many seconds, overriding `timeout_secs`.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum concurrent metadata fetches, overriding `max_concurrency`.
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,
}

impl RequestArgs {
    /// Loads the request and resolves it against the configured repositories.
    ///
    /// Repository roots are searched in this order: `--repo` flags, roots
    /// named by the request file, roots from the configuration.
    pub async fn resolve(&self, config: &ResolverConfig) -> Result<(Resolver, ResolvedGraph)> {
        let loaded = load_request(&self.request, config.file_cache()?).await?;

        let mut roots = self.repositories.clone();
        roots.extend(loaded.repositories);
        let repository = config.repository(&roots)?;
        debug!(roots = ?repository.roots(), "searching local repositories");

        let mut settings = config.settings();
        if let Some(max) = self.max_concurrency {
            settings.max_concurrency = max.max(1);
        }
        let resolver = Resolver::with_settings(Arc::new(repository), settings);

        let timeout = self.timeout.map(Duration::from_secs).or_else(|| config.timeout());
        let resolved = match timeout {
            Some(timeout) => resolver.resolve_with_timeout(&loaded.request, timeout).await?,
            None => resolver.resolve(&loaded.request).await?,
        };
        Ok((resolver, resolved))
    }
}

/// Splits `group:module`.
pub fn parse_key(text: &str) -> Result<(String, String)> {
    match text.split_once(':') {
        Some((group, module)) if !group.is_empty() && !module.is_empty() && !module.contains(':') => {
            Ok((group.to_string(), module.to_string()))
        }
        _ => Err(anyhow::anyhow!("Expected group:module, got '{text}'")),
    }
}
