//! Explain the resolved version of one library.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::cli::common::{RequestArgs, parse_key};
use crate::config::ResolverConfig;

/// Command printing the insight tree of `group:module`.
///
/// The tree holds every path from the root to the library. When some
/// occurrence was overridden it also holds one path to the node that
/// declared the winning version.
#[derive(Args, Debug)]
pub struct InsightCommand {
    #[command(flatten)]
    request: RequestArgs,

    /// Library to explain, as `group:module`
    dependency: String,
}

impl InsightCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let (group, module) = parse_key(&self.dependency)?;
        let (_, resolved) = self.request.resolve(config).await?;

        if resolved.dependency_insight(&group, &module).is_empty() {
            println!("{} {group}:{module} is not part of the graph", "note:".yellow());
            return Ok(());
        }
        print!("{}", resolved.render_insight(&group, &module));
        Ok(())
    }
}
