//! Write a resolved graph to disk.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::common::RequestArgs;
use crate::config::ResolverConfig;
use crate::serialization;

/// Command resolving a request and writing the graph as JSON.
///
/// The file can be read back with `depgraph show`.
#[derive(Args, Debug)]
pub struct ExportCommand {
    #[command(flatten)]
    request: RequestArgs,

    /// Output file
    output: PathBuf,
}

impl ExportCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let (_, resolved) = self.request.resolve(config).await?;
        serialization::write_to_path(resolved.graph(), &self.output)
            .with_context(|| format!("Failed to export graph to {}", self.output.display()))?;
        println!(
            "{} {} nodes to {}",
            "Exported".green().bold(),
            resolved.graph().distinct_bfs().count(),
            self.output.display()
        );
        Ok(())
    }
}
