//! Dependency resolution.
//!
//! A [`Resolver`] turns a [`ResolutionRequest`] into a [`ResolvedGraph`]:
//!
//! 1. **Structure**: one module node per module, one fragment-binding node per
//!    declaration ([`builder`])
//! 2. **Expansion**: declared artifacts are expanded from their metadata, in
//!    concurrent waves through a single-flight [`MetadataCache`]
//! 3. **BOM versions**: unversioned artifacts take the version of the nearest
//!    visible BOM ([`bom`])
//! 4. **Conflicts**: per dependency key and context the highest version wins
//!    ([`conflict`]); overridden nodes are re-expanded at the winning version
//!    and the loop repeats until the graph settles
//!
//! Multiplatform substitution happens during expansion and is recorded in a
//! [`VariantIndex`] ([`variants`]).
//!
//! # Isolation
//!
//! Every run owns its arena and its metadata cache. A cancelled or timed-out
//! run is dropped as a whole; nothing it built is visible to other runs. Only
//! downloaded file lists are shared, through the resolver's [`FileCache`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use depgraph_cli::metadata::LocalRepository;
//! use depgraph_cli::models::{DeclaredDependency, ResolutionRequest};
//! use depgraph_cli::resolver::Resolver;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let repository = Arc::new(LocalRepository::new(vec!["/srv/maven".into()]));
//! let resolver = Resolver::new(repository);
//! let request = ResolutionRequest::default().with(
//!     "app",
//!     "jvm",
//!     DeclaredDependency::maven("com.squareup.okio:okio:3.9.0".parse()?),
//! );
//!
//! let resolved = resolver.resolve(&request).await?;
//! println!("{}", resolved.pretty_print());
//! # Ok(())
//! # }
//! ```

pub mod bom;
pub mod builder;
pub mod conflict;
pub mod variants;

pub use builder::ROOT_LABEL;
pub use variants::VariantIndex;

use crate::cache::{FileCache, MetadataCache, RetryPolicy};
use crate::core::{DrError, OperationContext};
use crate::diagnostics::{self, BuildProblem, ReportedProblem};
use crate::graph::{DependencyGraph, NodeId, Severity, Subgraph, pretty_print};
use crate::metadata::MetadataFetcher;
use crate::models::{Coordinates, DependencyKey, FileCacheConfig, ResolutionContext, ResolutionRequest};
use crate::query::{self, InsightCache};
use crate::serialization;
use builder::GraphBuilder;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Tunables of a [`Resolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Maximum concurrent metadata fetches of one expansion wave.
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_concurrency: crate::constants::default_parallelism(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Entry point of dependency resolution.
///
/// A resolver is cheap to share: runs only borrow it, and the file caches it
/// owns are keyed by [`FileCacheConfig`] so each artifact is downloaded once
/// per configuration for the resolver's lifetime.
pub struct Resolver {
    fetcher: Arc<dyn MetadataFetcher>,
    settings: ResolverSettings,
    file_caches: DashMap<FileCacheConfig, Arc<FileCache>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("settings", &self.settings)
            .field("file_caches", &self.file_caches.len())
            .finish_non_exhaustive()
    }
}

/// Files collected for a resolved graph.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Distinct paths in graph order.
    pub files: Vec<PathBuf>,
    /// Artifacts whose files could not be downloaded.
    pub failures: Vec<(Coordinates, DrError)>,
}

impl DownloadReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Resolver {
    #[must_use]
    pub fn new(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self::with_settings(fetcher, ResolverSettings::default())
    }

    #[must_use]
    pub fn with_settings(fetcher: Arc<dyn MetadataFetcher>, settings: ResolverSettings) -> Self {
        Self {
            fetcher,
            settings,
            file_caches: DashMap::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolves a request to a settled graph.
    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<ResolvedGraph, DrError> {
        self.resolve_with_context(request, &OperationContext::new()).await
    }

    /// Resolves a request, giving up as soon as `operation` is cancelled.
    pub async fn resolve_with_context(
        &self,
        request: &ResolutionRequest,
        operation: &OperationContext,
    ) -> Result<ResolvedGraph, DrError> {
        info!(
            target: "resolver",
            declarations = request.declarations.len(),
            depth = ?request.input.depth,
            "resolving dependencies"
        );
        let metadata = MetadataCache::new(Arc::clone(&self.fetcher), self.settings.retry);
        let builder = GraphBuilder::new(request, &metadata, operation, self.settings.max_concurrency);
        let (graph, variants) = builder.build().await?;
        debug!(target: "cache", entries = metadata.len(), "metadata cache of the run");

        Ok(ResolvedGraph {
            graph,
            variants,
            insights: InsightCache::new(),
            file_cache: request.input.file_cache.clone(),
        })
    }

    /// Resolves a request within `timeout`.
    pub async fn resolve_with_timeout(
        &self,
        request: &ResolutionRequest,
        timeout: Duration,
    ) -> Result<ResolvedGraph, DrError> {
        let operation = OperationContext::new();
        match tokio::time::timeout(timeout, self.resolve_with_context(request, &operation)).await {
            Ok(result) => result,
            Err(_) => {
                operation.cancel(format!("timed out after {}s", timeout.as_secs_f64()));
                Err(DrError::Cancelled {
                    reason: format!("resolution timed out after {:?}", timeout),
                })
            }
        }
    }

    fn file_cache(&self, config: &FileCacheConfig) -> Arc<FileCache> {
        self.file_caches
            .entry(config.clone())
            .or_insert_with(|| Arc::new(FileCache::new(Arc::clone(&self.fetcher), config.clone())))
            .clone()
    }

    /// Downloads the files of every reachable non-BOM artifact.
    ///
    /// A common library with a chosen platform variant contributes only the
    /// variant. A failure is recorded per artifact and does not stop the others.
    pub async fn download_files(&self, resolved: &ResolvedGraph) -> DownloadReport {
        let cache = self.file_cache(&resolved.file_cache);
        let graph = &resolved.graph;

        let mut seen = HashSet::new();
        let targets: Vec<Coordinates> = graph
            .distinct_bfs()
            .filter_map(|id| graph.node(id).as_artifact())
            .filter(|a| !a.is_bom && a.publishing_coordinates.is_none())
            .filter_map(|a| a.resolved_coordinates())
            .filter(|c| seen.insert(c.clone()))
            .collect();
        debug!(target: "cache", artifacts = targets.len(), "collecting artifact files");

        let results: Vec<(Coordinates, Result<Vec<PathBuf>, DrError>)> = stream::iter(targets)
            .map(|coordinates| {
                let cache = Arc::clone(&cache);
                async move {
                    let result = cache.files(&coordinates).await;
                    (coordinates, result)
                }
            })
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let mut report = DownloadReport::default();
        let mut paths = HashSet::new();
        for (coordinates, result) in results {
            match result {
                Ok(files) => {
                    for file in files {
                        if paths.insert(file.clone()) {
                            report.files.push(file);
                        }
                    }
                }
                Err(e) => report.failures.push((coordinates, e)),
            }
        }
        report
    }
}

/// Outcome of one resolution run.
#[derive(Debug)]
pub struct ResolvedGraph {
    graph: DependencyGraph,
    variants: VariantIndex,
    insights: InsightCache,
    file_cache: FileCacheConfig,
}

impl ResolvedGraph {
    /// Wraps an existing graph, e.g. one decoded from disk.
    #[must_use]
    pub fn from_graph(graph: DependencyGraph) -> Self {
        Self {
            variants: VariantIndex::from_graph(&graph),
            graph,
            insights: InsightCache::new(),
            file_cache: FileCacheConfig::default(),
        }
    }

    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    #[must_use]
    pub fn into_graph(self) -> DependencyGraph {
        self.graph
    }

    #[must_use]
    pub fn variants(&self) -> &VariantIndex {
        &self.variants
    }

    #[must_use]
    pub fn file_cache_config(&self) -> &FileCacheConfig {
        &self.file_cache
    }

    #[must_use]
    pub fn pretty_print(&self) -> String {
        pretty_print(&self.graph)
    }

    pub fn module_deps(&self, name: &str) -> Result<Subgraph, DrError> {
        query::module_deps(&self.graph, name)
    }

    pub fn fragment_deps(&self, module: &str, fragment: &str) -> Result<Subgraph, DrError> {
        query::fragment_deps(&self.graph, module, fragment)
    }

    /// Memoized insight sub-graph for `group:module`.
    pub fn dependency_insight(&self, group: &str, module: &str) -> Arc<Subgraph> {
        self.insights
            .insight(&self.graph, &DependencyKey::new(group, module))
    }

    #[must_use]
    pub fn render_insight(&self, group: &str, module: &str) -> String {
        self.insights
            .render(&self.graph, &DependencyKey::new(group, module))
    }

    /// Number of insight walks performed on this graph.
    #[must_use]
    pub fn insight_walks(&self) -> usize {
        self.insights.walks()
    }

    #[must_use]
    pub fn problems(&self, min_severity: Severity) -> Vec<BuildProblem> {
        diagnostics::collect_problems(&self.graph, min_severity)
    }

    #[must_use]
    pub fn reported_problems(&self, min_severity: Severity) -> Vec<ReportedProblem> {
        diagnostics::report(&self.graph, &self.problems(min_severity))
    }

    /// Platform-specific publishing coordinates of a common library.
    #[must_use]
    pub fn variant_of(&self, common: &Coordinates, context: &ResolutionContext) -> Option<&Coordinates> {
        self.variants.variant_of(common, context)
    }

    /// Common library a platform variant was selected for.
    #[must_use]
    pub fn parent_kmp_library(&self, variant: &Coordinates) -> Option<&Coordinates> {
        self.variants.parent_of(variant)
    }

    #[must_use]
    pub fn is_orphan(&self, node: NodeId) -> bool {
        self.graph.is_orphan(node)
    }

    pub fn validate(&self) -> Result<(), DrError> {
        self.graph.validate()
    }

    pub fn encode(&self) -> Result<String, DrError> {
        serialization::encode(&self.graph)
    }

    pub fn decode(text: &str) -> Result<Self, DrError> {
        serialization::decode(text).map(Self::from_graph)
    }
}
