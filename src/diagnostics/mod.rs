//! Build problems derived from a resolved graph.
//!
//! [`collect_problems`] walks the reachable graph once and produces one
//! [`BuildProblem`] per node and finding:
//!
//! - every node message at or above the requested severity
//! - every artifact whose explicitly declared or BOM-supplied version was
//!   overridden by conflict resolution
//!
//! A problem on a node shared by several fragments is still reported once;
//! the fragment bindings that reach it are listed as [`ProblemSite`]s, and
//! [`report`] re-projects the single finding onto each of them.

pub mod reporter;

pub use reporter::{ReportedProblem, report};

use crate::graph::{ArtifactNode, DependencyGraph, Message, NodeId, NodeKind, Severity};
use crate::models::SourceLocation;
use std::collections::{HashSet, VecDeque};

/// Stable message identifiers.
pub mod ids {
    /// Metadata of a dependency could not be found.
    pub const UNRESOLVED: &str = "dependency.unresolved";
    /// Metadata fetch failed for another reason.
    pub const FETCH_FAILED: &str = "dependency.fetch.failed";
    /// No version declared and no BOM provides one.
    pub const VERSION_UNSPECIFIED: &str = "dependency.version.unspecified";
    /// A declared version lost conflict resolution.
    pub const VERSION_OVERRIDDEN: &str = "dependency.version.overridden";
    /// A version taken from a BOM lost conflict resolution.
    pub const BOM_VERSION_OVERRIDDEN: &str = "dependency.version.bom.overridden";
    pub const MODULE_UNRESOLVED: &str = "dependency.module.unresolved";
    pub const MODULE_CYCLE: &str = "dependency.module.cycle";
}

/// Fragment binding through which a problematic node is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSite {
    pub binding: NodeId,
    pub module: String,
    pub fragment: String,
    pub location: Option<SourceLocation>,
    /// Node declared by the binding.
    pub direct: Option<NodeId>,
}

/// One structural finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProblem {
    pub id: String,
    pub severity: Severity,
    pub text: String,
    /// Node the finding is about.
    pub node: NodeId,
    /// Nodes that caused an override, empty for plain messages.
    pub causes: Vec<NodeId>,
    pub report_transitive: bool,
    pub sites: Vec<ProblemSite>,
}

impl BuildProblem {
    /// Whether the node is reached from `site` only through other nodes.
    #[must_use]
    pub fn is_transitive_at(&self, site: &ProblemSite) -> bool {
        site.direct != Some(self.node)
    }

    pub fn locations(&self) -> impl Iterator<Item = &SourceLocation> {
        self.sites.iter().filter_map(|s| s.location.as_ref())
    }
}

/// Override warning for an artifact, if it lost conflict resolution.
///
/// Unversioned artifacts that took the effective version without any BOM
/// entry are not reported: nothing they declared was overridden.
#[must_use]
pub fn override_message(artifact: &ArtifactNode) -> Option<Message> {
    artifact.overridden_by.as_ref()?;
    let original = artifact.original_version()?;
    let resolved = artifact.resolved_version.as_deref()?;
    if original == resolved {
        return None;
    }
    Some(if artifact.coordinates.version.is_some() {
        Message::warning(
            ids::VERSION_OVERRIDDEN,
            format!("version {original} is overridden, the actual version is {resolved}."),
        )
    } else {
        Message::warning(
            ids::BOM_VERSION_OVERRIDDEN,
            format!("version {original} taken from BOM is overridden, the actual version is {resolved}."),
        )
    })
}

/// Every finding on one node: its messages plus a derived override warning.
#[must_use]
pub fn node_findings(graph: &DependencyGraph, id: NodeId) -> Vec<Message> {
    let node = graph.node(id);
    let mut findings = node.messages().to_vec();
    if let Some(message) = node.as_artifact().and_then(override_message) {
        findings.push(message);
    }
    findings
}

/// Collects build problems at or above `min_severity`.
#[must_use]
pub fn collect_problems(graph: &DependencyGraph, min_severity: Severity) -> Vec<BuildProblem> {
    let reachable = graph.reachable();
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for id in graph.distinct_bfs() {
        let findings: Vec<Message> = node_findings(graph, id)
            .into_iter()
            .filter(|m| m.severity >= min_severity)
            .collect();
        if findings.is_empty() {
            continue;
        }
        let sites = sites_of(graph, &reachable, id);
        let causes: Vec<NodeId> = graph
            .node(id)
            .overridden_by()
            .map(|c| c.iter().copied().collect())
            .unwrap_or_default();

        for message in findings {
            if !seen.insert((id, message.id.clone(), message.text.clone())) {
                continue;
            }
            let is_override = message.id == ids::VERSION_OVERRIDDEN || message.id == ids::BOM_VERSION_OVERRIDDEN;
            problems.push(BuildProblem {
                id: message.id,
                severity: message.severity,
                text: message.text,
                node: id,
                causes: if is_override { causes.clone() } else { Vec::new() },
                report_transitive: message.report_transitive,
                sites: sites.clone(),
            });
        }
    }
    problems
}

/// Nearest fragment bindings above `id`, in declaration order.
fn sites_of(graph: &DependencyGraph, reachable: &HashSet<NodeId>, id: NodeId) -> Vec<ProblemSite> {
    let mut bindings = Vec::new();
    let mut visited = HashSet::from([id]);
    let mut queue = VecDeque::from([id]);

    while let Some(current) = queue.pop_front() {
        if let NodeKind::Fragment(_) = graph.node(current).kind() {
            bindings.push(current);
            continue;
        }
        for &parent in graph.node(current).parents() {
            if reachable.contains(&parent) && visited.insert(parent) {
                queue.push_back(parent);
            }
        }
    }

    bindings.sort();
    bindings
        .into_iter()
        .filter_map(|binding| {
            let fragment = graph.node(binding).as_fragment()?;
            Some(ProblemSite {
                binding,
                module: fragment.module.clone(),
                fragment: fragment.fragment.clone(),
                location: fragment.location.clone(),
                direct: graph.children(binding).first().copied(),
            })
        })
        .collect()
}
