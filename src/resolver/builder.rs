//! Graph construction.
//!
//! The builder first lays out the project structure (root, module nodes,
//! one fragment-binding node per declaration) and the declared artifacts,
//! then runs rounds of:
//!
//! 1. expansion of pending artifact nodes, in waves of concurrent fetches
//! 2. BOM version lookup for unversioned nodes
//! 3. conflict resolution
//!
//! until nothing is pending. Conflict resolution can move a node to a version
//! whose metadata was never fetched; such a node is re-expanded from the
//! effective version's metadata, and whatever only its old children reached
//! becomes an orphan.
//!
//! Node identity is `(coordinates as declared, context)` for artifacts and
//! constraints, and the module name for module nodes. Fetch failures never
//! escape: they become ERROR messages on the node that could not be expanded.

use super::bom::resolve_bom_versions;
use super::conflict::resolve_conflicts;
use super::variants::VariantIndex;
use crate::cache::{FetchResult, MetadataCache};
use crate::constants::MAX_CONFLICT_ROUNDS;
use crate::core::{DrError, OperationContext};
use crate::diagnostics::ids;
use crate::graph::{
    ArtifactNode, ConstraintNode, DependencyGraph, ExpansionState, FragmentNode, Message,
    ModuleNode, NodeId, NodeKind,
};
use crate::metadata::FetchError;
use crate::models::{
    Coordinates, DeclaredDependency, ResolutionContext, ResolutionDepth, ResolutionRequest,
};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Label of the root node of a resolution run.
pub const ROOT_LABEL: &str = "root";

/// Message ids owned by expansion; dropped when a node is re-expanded.
const EXPANSION_MESSAGES: [&str; 2] = [ids::UNRESOLVED, ids::FETCH_FAILED];

pub(crate) struct GraphBuilder<'a> {
    request: &'a ResolutionRequest,
    metadata: &'a MetadataCache,
    operation: &'a OperationContext,
    max_concurrency: usize,
    graph: DependencyGraph,
    artifacts: HashMap<(Coordinates, ResolutionContext), NodeId>,
    constraints: HashMap<(Coordinates, ResolutionContext), NodeId>,
    modules: HashMap<String, NodeId>,
}

impl<'a> GraphBuilder<'a> {
    pub(crate) fn new(
        request: &'a ResolutionRequest,
        metadata: &'a MetadataCache,
        operation: &'a OperationContext,
        max_concurrency: usize,
    ) -> Self {
        Self {
            request,
            metadata,
            operation,
            max_concurrency: max_concurrency.max(1),
            graph: DependencyGraph::new(ROOT_LABEL),
            artifacts: HashMap::new(),
            constraints: HashMap::new(),
            modules: HashMap::new(),
        }
    }

    /// Builds the complete graph.
    pub(crate) async fn build(mut self) -> Result<(DependencyGraph, VariantIndex), DrError> {
        self.declare_structure();

        if self.request.input.depth != ResolutionDepth::NoExternal {
            self.settle().await?;
            self.report_unspecified_versions();
        }

        // Re-expansion leaves replaced variants orphaned; index only what is reachable.
        let variants = VariantIndex::from_graph(&self.graph);
        info!(
            target: "resolver",
            nodes = self.graph.len(),
            reachable = self.graph.reachable().len(),
            variants = variants.len(),
            "dependency graph built"
        );
        Ok((self.graph, variants))
    }

    fn declare_structure(&mut self) {
        let request = self.request;
        let root = self.graph.root();

        for module in request.modules() {
            let module_node = self.module_node(module);
            self.graph.add_edge(root, module_node);
        }

        for module in request.modules() {
            let module_node = self.module_node(module);
            for fragment in request.fragments_of(module) {
                let context = request.context_for(module, fragment);
                for (_, declaration) in request.declarations_of(module, fragment) {
                    let dependency = &declaration.dependency;
                    let implicit = matches!(dependency, DeclaredDependency::Maven { implicit: true, .. });
                    let binding = self.graph.add_node(NodeKind::Fragment(FragmentNode {
                        module: module.to_string(),
                        fragment: fragment.to_string(),
                        notation: dependency.notation(),
                        implicit,
                        context: context.clone(),
                        location: dependency.location().cloned(),
                    }));
                    self.graph.add_edge(module_node, binding);
                    self.declare_dependency(binding, dependency, &context);
                }
            }
        }
    }

    fn declare_dependency(&mut self, binding: NodeId, dependency: &DeclaredDependency, context: &ResolutionContext) {
        match dependency {
            DeclaredDependency::Maven { coordinates, bom, .. } => {
                if self.request.input.depth == ResolutionDepth::NoExternal {
                    return;
                }
                let artifact = self.artifact_node(coordinates, context, *bom);
                if self.request.input.depth == ResolutionDepth::DirectOnly && !*bom {
                    self.skip_if_pending(artifact);
                }
                self.attach(binding, artifact);
            }
            DeclaredDependency::Module { name, .. } => {
                if !self.request.has_module(name) {
                    self.graph.node_mut(binding).add_message(Message::error(
                        ids::MODULE_UNRESOLVED,
                        format!("Module '{name}' is not part of the project"),
                    ));
                    return;
                }
                let module_node = self.module_node(name);
                if !self.attach(binding, module_node) {
                    self.graph.node_mut(binding).add_message(
                        Message::warning(
                            ids::MODULE_CYCLE,
                            format!("Dependency on module '{name}' forms a cycle and is ignored"),
                        )
                        .direct_only(),
                    );
                }
            }
        }
    }

    fn module_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.modules.get(name) {
            return id;
        }
        let fragments = self.request.fragments_of(name);
        let id = self
            .graph
            .add_node(NodeKind::Module(ModuleNode::new(name).with_fragments(fragments)));
        self.modules.insert(name.to_string(), id);
        id
    }

    fn artifact_node(&mut self, coordinates: &Coordinates, context: &ResolutionContext, is_bom: bool) -> NodeId {
        let identity = (coordinates.clone(), context.clone());
        if let Some(&id) = self.artifacts.get(&identity) {
            return id;
        }
        let id = self.graph.add_node(NodeKind::Artifact(ArtifactNode::new(
            coordinates.clone(),
            context.clone(),
            is_bom,
        )));
        self.artifacts.insert(identity, id);
        id
    }

    fn constraint_node(&mut self, coordinates: &Coordinates, context: &ResolutionContext) -> NodeId {
        let identity = (coordinates.clone(), context.clone());
        if let Some(&id) = self.constraints.get(&identity) {
            return id;
        }
        let id = self.graph.add_node(NodeKind::Constraint(ConstraintNode::new(
            coordinates.clone(),
            context.clone(),
        )));
        self.constraints.insert(identity, id);
        id
    }

    /// Adds `parent -> child` unless the edge would close a cycle.
    fn attach(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.graph.is_ancestor_or_self(child, parent) {
            debug!(
                target: "resolver",
                parent = %self.graph.node(parent),
                child = %self.graph.node(child),
                "pruning edge that would close a cycle"
            );
            return false;
        }
        self.graph.add_edge(parent, child);
        true
    }

    fn check_cancelled(&self) -> Result<(), DrError> {
        if self.operation.is_cancelled() {
            return Err(DrError::Cancelled {
                reason: self
                    .operation
                    .cancel_reason()
                    .unwrap_or_else(|| "cancelled by caller".to_string()),
            });
        }
        Ok(())
    }

    async fn settle(&mut self) -> Result<(), DrError> {
        for round in 1..=MAX_CONFLICT_ROUNDS {
            self.expand_pending().await?;
            resolve_bom_versions(&mut self.graph);
            resolve_conflicts(&mut self.graph);
            let rescheduled = self.schedule_reexpansion();

            if self.pending().is_empty() {
                debug!(target: "resolver", round, "graph settled");
                return Ok(());
            }
            debug!(target: "resolver", round, rescheduled, "another expansion round needed");
        }

        warn!(
            target: "resolver",
            "dependency graph did not settle after {MAX_CONFLICT_ROUNDS} rounds; using the last state"
        );
        Ok(())
    }

    /// Reachable artifacts waiting for expansion whose version is known.
    fn pending(&self) -> Vec<NodeId> {
        self.graph
            .distinct_bfs()
            .filter(|&id| {
                self.graph.node(id).as_artifact().is_some_and(|a| {
                    a.state == ExpansionState::Pending && a.resolved_version.is_some()
                })
            })
            .collect()
    }

    async fn expand_pending(&mut self) -> Result<(), DrError> {
        loop {
            self.check_cancelled()?;
            let batch = self.pending();
            if batch.is_empty() {
                return Ok(());
            }

            let requests: Vec<(NodeId, Coordinates)> = batch
                .into_iter()
                .filter_map(|id| {
                    let node = self.graph.node_mut(id).as_artifact_mut()?;
                    let coordinates = node.resolved_coordinates()?;
                    node.state = ExpansionState::InProgress;
                    Some((id, coordinates))
                })
                .collect();
            debug!(target: "resolver", size = requests.len(), "expanding wave");

            let metadata = self.metadata;
            let results: Vec<(NodeId, Coordinates, FetchResult)> = stream::iter(requests)
                .map(|(id, coordinates)| async move {
                    let result = metadata.get(&coordinates).await;
                    (id, coordinates, result)
                })
                .buffered(self.max_concurrency)
                .collect()
                .await;

            for (id, coordinates, result) in results {
                self.apply_metadata(id, &coordinates, &result);
            }
        }
    }

    fn apply_metadata(&mut self, id: NodeId, fetched: &Coordinates, result: &FetchResult) {
        let Some(artifact) = self.graph.node(id).as_artifact() else {
            return;
        };
        let context = artifact.context.clone();

        match &**result {
            Err(FetchError::NotFound { .. }) => {
                self.graph.node_mut(id).add_message(Message::error(
                    ids::UNRESOLVED,
                    format!("Unable to resolve dependency {fetched}"),
                ));
            }
            Err(e) => {
                warn!(target: "fetch", coordinates = %fetched, "{e}");
                self.graph
                    .node_mut(id)
                    .add_message(Message::error(ids::FETCH_FAILED, e.to_string()));
            }
            Ok(metadata) => {
                let variant = context
                    .single_platform()
                    .and_then(|platform| metadata.variant_for(platform).cloned());

                if let Some(variant) = variant {
                    let child = self.artifact_node(&variant, &context, false);
                    if let Some(node) = self.graph.node_mut(child).as_artifact_mut() {
                        node.parent_kmp_library = Some(fetched.clone());
                    }
                    if let Some(node) = self.graph.node_mut(id).as_artifact_mut() {
                        node.publishing_coordinates = Some(variant);
                    }
                    self.attach(id, child);
                } else {
                    if metadata.is_bom() {
                        if let Some(node) = self.graph.node_mut(id).as_artifact_mut() {
                            node.is_bom = true;
                        }
                    }
                    // Only BOMs are expanded in direct-only mode; what they declare stays unexpanded.
                    let direct_only = self.request.input.depth == ResolutionDepth::DirectOnly;
                    for dependency in &metadata.dependencies {
                        if dependency.optional
                            || !context.includes(dependency.scope)
                            || !context.covered_by(&dependency.platforms)
                        {
                            continue;
                        }
                        let child = self.artifact_node(&dependency.coordinates, &context, dependency.bom);
                        if direct_only && !dependency.bom {
                            self.skip_if_pending(child);
                        }
                        self.attach(id, child);
                    }
                    for constraint in &metadata.constraints {
                        if constraint.version.is_none() {
                            continue;
                        }
                        let child = self.constraint_node(constraint, &context);
                        self.attach(id, child);
                    }
                }
            }
        }

        if let Some(node) = self.graph.node_mut(id).as_artifact_mut() {
            node.state = ExpansionState::Expanded;
            node.expanded_version = fetched.version.clone();
        }
    }

    fn skip_if_pending(&mut self, id: NodeId) {
        if let Some(node) = self.graph.node_mut(id).as_artifact_mut() {
            if node.state == ExpansionState::Pending {
                node.state = ExpansionState::Skipped;
            }
        }
    }

    /// Marks expanded nodes whose resolved version moved for re-expansion.
    fn schedule_reexpansion(&mut self) -> usize {
        let stale: Vec<NodeId> = self
            .graph
            .distinct_bfs()
            .filter(|&id| {
                self.graph.node(id).as_artifact().is_some_and(|a| {
                    a.state == ExpansionState::Expanded && a.expanded_version != a.resolved_version
                })
            })
            .collect();

        for &id in &stale {
            self.graph.clear_children(id);
            let node = self.graph.node_mut(id);
            node.messages.retain(|m| !EXPANSION_MESSAGES.contains(&m.id.as_str()));
            if let Some(artifact) = node.as_artifact_mut() {
                debug!(
                    target: "resolver",
                    dependency = %artifact.coordinates,
                    from = ?artifact.expanded_version,
                    to = ?artifact.resolved_version,
                    "re-expanding overridden dependency"
                );
                artifact.state = ExpansionState::Pending;
                artifact.publishing_coordinates = None;
            }
        }
        stale.len()
    }

    fn report_unspecified_versions(&mut self) {
        let unversioned: Vec<NodeId> = self
            .graph
            .distinct_bfs()
            .filter(|&id| {
                self.graph
                    .node(id)
                    .as_artifact()
                    .is_some_and(|a| a.resolved_version.is_none())
            })
            .collect();

        for id in unversioned {
            let node = self.graph.node_mut(id);
            let Some(key) = node.dependency_key() else {
                continue;
            };
            node.add_message(Message::error(
                ids::VERSION_UNSPECIFIED,
                format!("Version of dependency {key} is not specified and no BOM in scope provides it"),
            ));
        }
    }
}
