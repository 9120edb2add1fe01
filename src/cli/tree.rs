//! Display the resolved dependency tree.
//!
//! The tree starts at the root of the graph, or at one module or fragment
//! when filtered. Repeated sub-trees are printed once; later occurrences end
//! in `(*)`. Versions changed by conflict resolution read `requested -> actual`
//! and constraints are marked `(c)`.
//!
//! # Examples
//!
//! ```bash
//! depgraph tree request.toml
//! depgraph tree request.toml --module app
//! depgraph tree request.toml --module app --fragment jvmTest
//! depgraph tree request.toml --format json
//! depgraph tree request.toml --files
//! ```
//!
//! # Output Format
//!
//! ```text
//! module:app
//! ├─── app:jvm:com.squareup.okio:okio:3.9.0
//! │    ╰─── com.squareup.okio:okio:3.9.0
//! │         ╰─── com.squareup.okio:okio-jvm:3.9.0
//! ╰─── app:jvm:org.jetbrains.kotlin:kotlin-stdlib:2.1.20
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;

use crate::cli::common::RequestArgs;
use crate::config::ResolverConfig;
use crate::graph::pretty::pretty_print_for;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TreeFormat {
    /// Box-drawing tree
    Tree,
    /// The serialized graph
    Json,
}

/// Command to display the dependency tree of a request.
#[derive(Args, Debug)]
pub struct TreeCommand {
    #[command(flatten)]
    request: RequestArgs,

    /// Only show the dependencies of this module
    #[arg(short = 'm', long)]
    module: Option<String>,

    /// Only show the dependencies of this fragment of `--module`
    #[arg(short = 'f', long, requires = "module")]
    fragment: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = TreeFormat::Tree)]
    format: TreeFormat,

    /// Also download the artifact files and list them
    #[arg(long)]
    files: bool,
}

impl TreeCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let (resolver, resolved) = self.request.resolve(config).await?;

        let output = match (self.format, &self.module, &self.fragment) {
            (TreeFormat::Json, None, _) => resolved.encode()?,
            (TreeFormat::Json, Some(_), _) => {
                return Err(anyhow::anyhow!("--format json prints the whole graph and cannot be combined with --module"));
            }
            (TreeFormat::Tree, None, _) => resolved.pretty_print(),
            (TreeFormat::Tree, Some(module), None) => {
                let subgraph = resolved.module_deps(module)?;
                pretty_print_for(&subgraph.view(resolved.graph()), None)
            }
            (TreeFormat::Tree, Some(module), Some(fragment)) => {
                let subgraph = resolved.fragment_deps(module, fragment)?;
                pretty_print_for(&subgraph.view(resolved.graph()), None)
            }
        };
        print!("{output}");
        if self.format == TreeFormat::Json {
            println!();
        }

        if self.files {
            let report = resolver.download_files(&resolved).await;
            println!();
            println!("{}", "Files:".bold());
            for file in &report.files {
                println!("  {}", file.display());
            }
            for (coordinates, error) in &report.failures {
                eprintln!("{} {coordinates}: {error}", "failed".red());
            }
            if !report.is_complete() {
                return Err(anyhow::anyhow!(
                    "{} artifact(s) could not be downloaded",
                    report.failures.len()
                ));
            }
        }
        Ok(())
    }
}
