//! List the problems found while resolving.

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;

use crate::cli::common::RequestArgs;
use crate::config::ResolverConfig;
use crate::diagnostics::ReportedProblem;
use crate::graph::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(value: SeverityArg) -> Self {
        match value {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

/// Command reporting problems at the declarations they affect.
///
/// A problem on a transitive dependency is reported against every direct
/// declaration that pulls it in.
#[derive(Args, Debug)]
pub struct ProblemsCommand {
    #[command(flatten)]
    request: RequestArgs,

    /// Lowest severity to report
    #[arg(long, value_enum, default_value_t = SeverityArg::Warning)]
    min_severity: SeverityArg,

    /// Exit with an error when any ERROR is reported
    #[arg(long)]
    deny_errors: bool,
}

impl ProblemsCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let (_, resolved) = self.request.resolve(config).await?;
        let problems = resolved.reported_problems(self.min_severity.into());
        print_problems(&problems);

        let errors = problems.iter().filter(|p| p.severity == Severity::Error).count();
        if self.deny_errors && errors > 0 {
            return Err(anyhow::anyhow!("{errors} error(s) reported"));
        }
        Ok(())
    }
}

pub(crate) fn print_problems(problems: &[ReportedProblem]) {
    if problems.is_empty() {
        println!("{}", "No problems found.".green());
        return;
    }
    for problem in problems {
        println!("{}", problem.render());
    }
    println!();
    println!("{} problem(s)", problems.len());
}
