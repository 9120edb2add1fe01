//! Re-projection of build problems onto declaration sites.

use super::{BuildProblem, node_findings};
use crate::graph::{DependencyGraph, Severity};
use crate::models::SourceLocation;
use colored::Colorize;
use std::fmt;

/// A problem as shown to the user at one declaration site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedProblem {
    pub id: String,
    pub severity: Severity,
    pub text: String,
    pub module: Option<String>,
    pub fragment: Option<String>,
    pub location: Option<SourceLocation>,
}

impl ReportedProblem {
    /// Colored single-line rendering for terminals.
    #[must_use]
    pub fn render(&self) -> String {
        let severity = match self.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".cyan().bold(),
        };
        match &self.location {
            Some(location) => format!("{severity}: {}: {}", location.to_string().dimmed(), self.text),
            None => format!("{severity}: {}", self.text),
        }
    }
}

impl fmt::Display for ReportedProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        if let (Some(module), Some(fragment)) = (&self.module, &self.fragment) {
            write!(f, "[{module}:{fragment}] ")?;
        }
        f.write_str(&self.text)
    }
}

/// One reported problem per problem and site.
///
/// At a site that reaches the node transitively the text names the declared
/// dependency it came through. Such a site is skipped when the declared
/// dependency itself carries a finding with the same id, or when the finding
/// is not meant to travel (`report_transitive == false`).
#[must_use]
pub fn report(graph: &DependencyGraph, problems: &[BuildProblem]) -> Vec<ReportedProblem> {
    let mut reported = Vec::new();

    for problem in problems {
        if problem.sites.is_empty() {
            reported.push(ReportedProblem {
                id: problem.id.clone(),
                severity: problem.severity,
                text: problem.text.clone(),
                module: None,
                fragment: None,
                location: None,
            });
            continue;
        }

        for site in &problem.sites {
            let text = match site.direct {
                Some(direct) if problem.is_transitive_at(site) => {
                    if !problem.report_transitive
                        || node_findings(graph, direct).iter().any(|m| m.id == problem.id)
                    {
                        continue;
                    }
                    format!(
                        "Dependency {} has a transitive dependency {} with a problem: {}",
                        graph.node(direct),
                        graph.node(problem.node),
                        problem.text
                    )
                }
                _ => problem.text.clone(),
            };
            reported.push(ReportedProblem {
                id: problem.id.clone(),
                severity: problem.severity,
                text,
                module: Some(site.module.clone()),
                fragment: Some(site.fragment.clone()),
                location: site.location.clone(),
            });
        }
    }
    reported
}
