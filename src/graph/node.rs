//! Node variants of the dependency graph.

use crate::models::{Coordinates, DependencyKey, ResolutionContext, SourceLocation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Index of a node in its [`DependencyGraph`](super::DependencyGraph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Severity of a node message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Diagnostic attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    /// Stable identifier, see [`crate::diagnostics::ids`].
    pub id: String,
    pub severity: Severity,
    pub text: String,
    /// Whether the message is also reported at sites that reach the node
    /// transitively.
    pub report_transitive: bool,
}

impl Message {
    #[must_use]
    pub fn new(id: &str, severity: Severity, text: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            severity,
            text: text.into(),
            report_transitive: true,
        }
    }

    #[must_use]
    pub fn error(id: &str, text: impl Into<String>) -> Self {
        Self::new(id, Severity::Error, text)
    }

    #[must_use]
    pub fn warning(id: &str, text: impl Into<String>) -> Self {
        Self::new(id, Severity::Warning, text)
    }

    #[must_use]
    pub fn direct_only(mut self) -> Self {
        self.report_transitive = false;
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Synthetic root of a run or holder of an extracted sub-graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootNode {
    pub label: String,
}

/// A module of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    pub name: String,
    /// Fragments the project defines for this module, declaring or not.
    pub fragments: Vec<String>,
}

impl ModuleNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn has_fragment(&self, fragment: &str) -> bool {
        self.fragments.iter().any(|f| f == fragment)
    }
}

/// Binds one declared dependency to the module and fragment declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentNode {
    pub module: String,
    pub fragment: String,
    pub notation: String,
    pub implicit: bool,
    pub context: ResolutionContext,
    pub location: Option<SourceLocation>,
}

/// Where an artifact version came from when it was declared without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomVersion {
    pub version: String,
    /// The BOM artifact node that supplied the version.
    pub bom: NodeId,
}

/// Expansion progress of an artifact node within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionState {
    /// Created, metadata not requested yet.
    #[default]
    Pending,
    /// Metadata fetch in flight.
    InProgress,
    /// Children attached for `expanded_version`.
    Expanded,
    /// Not expanded because of the resolution depth.
    Skipped,
}

/// An external library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNode {
    /// As declared; part of the node identity.
    pub coordinates: Coordinates,
    pub context: ResolutionContext,
    pub resolved_version: Option<String>,
    pub version_from_bom: Option<BomVersion>,
    pub overridden_by: Option<BTreeSet<NodeId>>,
    pub parent_kmp_library: Option<Coordinates>,
    pub publishing_coordinates: Option<Coordinates>,
    pub is_bom: bool,
    pub(crate) state: ExpansionState,
    pub(crate) expanded_version: Option<String>,
}

impl ArtifactNode {
    #[must_use]
    pub fn new(coordinates: Coordinates, context: ResolutionContext, is_bom: bool) -> Self {
        Self {
            resolved_version: coordinates.version.clone(),
            coordinates,
            context,
            version_from_bom: None,
            overridden_by: None,
            parent_kmp_library: None,
            publishing_coordinates: None,
            is_bom,
            state: ExpansionState::Pending,
            expanded_version: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> DependencyKey {
        self.coordinates.key()
    }

    /// Version before conflict resolution: declared, else taken from a BOM.
    #[must_use]
    pub fn original_version(&self) -> Option<&str> {
        self.coordinates
            .version
            .as_deref()
            .or_else(|| self.version_from_bom.as_ref().map(|b| b.version.as_str()))
    }

    /// Coordinates at the resolved version, if any.
    #[must_use]
    pub fn resolved_coordinates(&self) -> Option<Coordinates> {
        self.resolved_version
            .as_deref()
            .map(|v| self.coordinates.with_version(v))
    }

    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.overridden_by.is_some()
    }

    #[must_use]
    pub fn state(&self) -> ExpansionState {
        self.state
    }
}

/// A single `group:module -> version` constraint, published by a BOM or by an
/// artifact's dependency constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintNode {
    /// Always versioned.
    pub coordinates: Coordinates,
    pub context: ResolutionContext,
    pub resolved_version: Option<String>,
    pub overridden_by: Option<BTreeSet<NodeId>>,
}

impl ConstraintNode {
    #[must_use]
    pub fn new(coordinates: Coordinates, context: ResolutionContext) -> Self {
        Self {
            resolved_version: coordinates.version.clone(),
            coordinates,
            context,
            overridden_by: None,
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        self.coordinates.version_or_unspecified()
    }
}

/// Closed set of node variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root(RootNode),
    Module(ModuleNode),
    Fragment(FragmentNode),
    Artifact(ArtifactNode),
    Constraint(ConstraintNode),
}

impl NodeKind {
    /// Tag used by the serializer and in logs.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::Module(_) => "module",
            Self::Fragment(_) => "fragment",
            Self::Artifact(_) => "artifact",
            Self::Constraint(_) => "constraint",
        }
    }
}

/// A node with its edges and messages.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parents: BTreeSet<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) messages: Vec<Message>,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parents: BTreeSet::new(),
            children: Vec::new(),
            messages: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn parents(&self) -> &BTreeSet<NodeId> {
        &self.parents
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Adds a message unless one with the same id and text is present.
    pub fn add_message(&mut self, message: Message) {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    #[must_use]
    pub fn has_message(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    #[must_use]
    pub fn as_artifact(&self) -> Option<&ArtifactNode> {
        match &self.kind {
            NodeKind::Artifact(a) => Some(a),
            _ => None,
        }
    }

    pub(crate) fn as_artifact_mut(&mut self) -> Option<&mut ArtifactNode> {
        match &mut self.kind {
            NodeKind::Artifact(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_constraint(&self) -> Option<&ConstraintNode> {
        match &self.kind {
            NodeKind::Constraint(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_fragment(&self) -> Option<&FragmentNode> {
        match &self.kind {
            NodeKind::Fragment(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_module(&self) -> Option<&ModuleNode> {
        match &self.kind {
            NodeKind::Module(m) => Some(m),
            _ => None,
        }
    }

    /// Key of an artifact or constraint node.
    #[must_use]
    pub fn dependency_key(&self) -> Option<DependencyKey> {
        match &self.kind {
            NodeKind::Artifact(a) => Some(a.key()),
            NodeKind::Constraint(c) => Some(c.coordinates.key()),
            _ => None,
        }
    }

    /// Context of a context-scoped node.
    #[must_use]
    pub fn context(&self) -> Option<&ResolutionContext> {
        match &self.kind {
            NodeKind::Artifact(a) => Some(&a.context),
            NodeKind::Constraint(c) => Some(&c.context),
            NodeKind::Fragment(f) => Some(&f.context),
            NodeKind::Root(_) | NodeKind::Module(_) => None,
        }
    }

    #[must_use]
    pub fn overridden_by(&self) -> Option<&BTreeSet<NodeId>> {
        match &self.kind {
            NodeKind::Artifact(a) => a.overridden_by.as_ref(),
            NodeKind::Constraint(c) => c.overridden_by.as_ref(),
            _ => None,
        }
    }

    /// The line shown for this node in a rendered tree.
    #[must_use]
    pub fn entry_name(&self) -> String {
        match &self.kind {
            NodeKind::Root(r) => r.label.clone(),
            NodeKind::Module(m) => format!("module:{}", m.name),
            NodeKind::Fragment(f) => {
                let mut name = format!("{}:{}:{}", f.module, f.fragment, f.notation);
                if f.implicit {
                    name.push_str(", implicit");
                }
                name
            }
            NodeKind::Artifact(a) => {
                let declared = a.coordinates.version_or_unspecified();
                let mut name = format!("{}:{}:{}", a.coordinates.group, a.coordinates.module, declared);
                if let Some(resolved) = &a.resolved_version {
                    if a.coordinates.version.as_deref() != Some(resolved.as_str()) {
                        name.push_str(" -> ");
                        name.push_str(resolved);
                    }
                }
                name
            }
            NodeKind::Constraint(c) => {
                let mut name = c.coordinates.to_string();
                if let Some(resolved) = &c.resolved_version {
                    if c.coordinates.version.as_deref() != Some(resolved.as_str()) {
                        name.push_str(" -> ");
                        name.push_str(resolved);
                    }
                }
                name
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entry_name())
    }
}
