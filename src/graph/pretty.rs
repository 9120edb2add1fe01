//! Textual tree rendering.
//!
//! The output format is stable and used for golden comparisons:
//!
//! ```text
//! root
//! ╰─── module:app
//!      ├─── app:jvm:com.example:okio:3.0
//!      │    ╰─── com.example:okio:3.0
//!      │         ╰─── com.example:okio-jvm:3.0
//!      ╰─── app:jvm:com.example:okio:2.9
//!           ╰─── com.example:okio:2.9 -> 3.0 (*)
//! ```
//!
//! - a node already printed elsewhere in the same context is printed once more
//!   with ` (*)` (when it has printable children) and not expanded again
//! - constraint nodes carry ` (c)` and are printed only when they could have
//!   changed the outcome: some artifact of the same key and context resolved to
//!   the constraint's version from a different declared version, and no artifact
//!   declared that version itself

use super::traversal::GraphView;
use super::{ArtifactNode, ConstraintNode, Node, NodeId, NodeKind};
use crate::models::{DependencyKey, ResolutionContext};
use std::collections::{HashMap, HashSet};

const BRANCH: &str = "├─── ";
const LAST_BRANCH: &str = "╰─── ";
const CONTINUATION: &str = "│    ";
const BLANK: &str = "     ";

/// Renders a view as a tree.
#[must_use]
pub fn pretty_print<V: GraphView>(view: &V) -> String {
    pretty_print_for(view, None)
}

/// Renders a view, additionally printing constraints on `target` even when no
/// artifact of that key is part of the view.
#[must_use]
pub fn pretty_print_for<V: GraphView>(view: &V, target: Option<&DependencyKey>) -> String {
    let graph = view.graph();
    let mut artifacts: HashMap<(DependencyKey, &ResolutionContext), Vec<&ArtifactNode>> =
        HashMap::new();
    for id in view.view_bfs() {
        if let Some(artifact) = graph.node(id).as_artifact() {
            artifacts
                .entry((artifact.key(), &artifact.context))
                .or_default()
                .push(artifact);
        }
    }

    let mut printer = Printer {
        view,
        artifacts,
        target,
        visited: HashSet::new(),
        out: String::new(),
    };

    printer.out.push_str(&view.label());
    printer.out.push('\n');
    let top: Vec<NodeId> = view
        .top_level()
        .iter()
        .copied()
        .filter(|id| printer.should_print(*id))
        .collect();
    let mut indent = Vec::new();
    printer.print_children(&top, &mut indent);
    printer.out
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum VisitKey<'a> {
    Artifact(DependencyKey, Option<&'a str>, &'a ResolutionContext),
    Constraint(DependencyKey, &'a str, &'a ResolutionContext),
    Node(NodeId),
}

struct Printer<'a, V> {
    view: &'a V,
    artifacts: HashMap<(DependencyKey, &'a ResolutionContext), Vec<&'a ArtifactNode>>,
    target: Option<&'a DependencyKey>,
    visited: HashSet<VisitKey<'a>>,
    out: String,
}

impl<'a, V: GraphView> Printer<'a, V> {
    fn node(&self, id: NodeId) -> &'a Node {
        self.view.graph().node(id)
    }

    fn visit_key(&self, id: NodeId) -> VisitKey<'a> {
        match self.node(id).kind() {
            NodeKind::Artifact(a) => {
                VisitKey::Artifact(a.key(), a.resolved_version.as_deref(), &a.context)
            }
            NodeKind::Constraint(c) => VisitKey::Constraint(c.coordinates.key(), c.version(), &c.context),
            _ => VisitKey::Node(id),
        }
    }

    fn should_print(&self, id: NodeId) -> bool {
        match self.node(id).as_constraint() {
            Some(constraint) => self.constraint_affects_graph(constraint),
            None => true,
        }
    }

    fn constraint_affects_graph(&self, constraint: &ConstraintNode) -> bool {
        let key = constraint.coordinates.key();
        let version = constraint.version();
        match self.artifacts.get(&(key.clone(), &constraint.context)) {
            Some(deps) => {
                let noop = deps.iter().any(|d| {
                    d.coordinates.version.as_deref() == d.resolved_version.as_deref()
                        && d.coordinates.version.as_deref() == Some(version)
                });
                let effective = deps.iter().any(|d| {
                    d.resolved_version.as_deref() == Some(version)
                        && d.coordinates.version.as_deref() != d.resolved_version.as_deref()
                });
                !noop && effective
            }
            None => self.target.is_some_and(|t| *t == key),
        }
    }

    fn print_children(&mut self, children: &[NodeId], indent: &mut Vec<&'static str>) {
        for (i, &child) in children.iter().enumerate() {
            let another = i + 1 < children.len();
            indent.push(if another { BRANCH } else { LAST_BRANCH });
            self.print_node(child, indent, another);
            indent.pop();
        }
    }

    fn print_node(&mut self, id: NodeId, indent: &mut Vec<&'static str>, add_level: bool) {
        let node = self.node(id);
        for segment in indent.iter() {
            self.out.push_str(segment);
        }
        self.out.push_str(&node.entry_name());

        let all_children = self.view.children(id);
        let printable: Vec<NodeId> = all_children
            .iter()
            .copied()
            .filter(|c| self.should_print(*c))
            .collect();

        let key = self.visit_key(id);
        let seen = !self.visited.insert(key);
        if seen && !printable.is_empty() {
            self.out.push_str(" (*)");
        } else if matches!(node.kind(), NodeKind::Constraint(_)) {
            self.out.push_str(" (c)");
        }
        self.out.push('\n');

        if seen || all_children.is_empty() {
            return;
        }

        if indent.pop().is_some() {
            indent.push(if add_level { CONTINUATION } else { BLANK });
        }
        self.print_children(&printable, indent);
    }
}
