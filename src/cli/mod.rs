//! Command-line interface of depgraph.
//!
//! Every command is a separate module with its own argument structure and
//! `execute` method. Commands that resolve read a request file (see
//! [`request`]) and share the arguments in [`common::RequestArgs`].
//!
//! # Available Commands
//!
//! - `tree` - Resolve a request and print the dependency tree
//! - `insight` - Explain why a library resolved to its version
//! - `problems` - List resolution problems at their declaration sites
//! - `export` - Resolve and write the graph as JSON
//! - `show` - Print a previously exported graph
//!
//! # Usage
//!
//! ```bash
//! # Full tree, or one module or fragment of it
//! depgraph tree request.toml
//! depgraph tree request.toml --module app --fragment jvm
//!
//! # Why is okio at 3.9.0?
//! depgraph insight request.toml com.squareup.okio:okio
//!
//! # Extra repository roots and a time limit
//! depgraph --verbose tree request.toml --repo ./maven --timeout 60
//!
//! # Resolve once, inspect later
//! depgraph export request.toml graph.json
//! depgraph show graph.json --problems
//! ```
//!
//! # Configuration
//!
//! Resolver settings come from `~/.depgraph/config.toml`, a file given with
//! `--config`, or the file named by `DEPGRAPH_CONFIG`. See
//! [`crate::config::ResolverConfig`].

use crate::config::ResolverConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub mod common;
mod export;
mod insight;
mod problems;
pub mod request;
mod show;
mod tree;

/// Runtime configuration derived from the global flags.
///
/// Separating it from [`Cli`] lets tests run a command with an injected
/// configuration instead of parsing flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter for the tracing subscriber.
    ///
    /// When `None`, `RUST_LOG` decides and defaults to warnings.
    pub log_level: Option<String>,

    /// Configuration file to load instead of the default one.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the global tracing subscriber, writing to stderr.
    ///
    /// Only the first call per process installs anything; later calls keep
    /// the existing subscriber.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    }

    /// Loads the resolver configuration this invocation runs with.
    pub async fn resolver_config(&self) -> Result<ResolverConfig> {
        match &self.config_path {
            Some(path) => ResolverConfig::load_with_optional(Some(path.clone())).await,
            None => ResolverConfig::load().await,
        }
    }
}

/// Main CLI structure.
///
/// Options marked `global = true` work with every subcommand.
#[derive(Parser)]
#[command(
    name = "depgraph",
    about = "Resolve Maven dependency graphs of multi-module projects",
    version,
    long_about = "depgraph resolves the dependencies declared by the modules of a project into one graph, \
                  applying BOM versions, conflict resolution and Kotlin Multiplatform variant selection."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to an alternative configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a request and print its dependency tree.
    ///
    /// Repeated sub-trees are printed once and marked with `(*)`; versions
    /// changed by conflict resolution read `requested -> actual`.
    Tree(tree::TreeCommand),

    /// Explain why a library resolved to its version.
    ///
    /// Prints every path from the root to the library and, when a version
    /// was overridden, one path to the node that declared the winner.
    Insight(insight::InsightCommand),

    /// List resolution problems at the declarations they affect.
    Problems(problems::ProblemsCommand),

    /// Resolve a request and write the graph as JSON.
    Export(export::ExportCommand),

    /// Print a graph written by `export`.
    Show(show::ShowCommand),
}

impl Cli {
    /// Executes the parsed command with a configuration built from the flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translates the global flags into a [`CliConfig`].
    ///
    /// ```rust,ignore
    /// let cli = Cli::parse_from(["depgraph", "--verbose", "tree", "request.toml"]);
    /// assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));
    /// ```
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.as_ref().map(PathBuf::from),
        }
    }

    /// Executes the command with an injected configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let resolver_config = config.resolver_config().await?;

        match self.command {
            Commands::Tree(cmd) => cmd.execute(&resolver_config).await,
            Commands::Insight(cmd) => cmd.execute(&resolver_config).await,
            Commands::Problems(cmd) => cmd.execute(&resolver_config).await,
            Commands::Export(cmd) => cmd.execute(&resolver_config).await,
            Commands::Show(cmd) => cmd.execute().await,
        }
    }
}
