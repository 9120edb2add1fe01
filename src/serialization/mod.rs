//! Versioned flat-table form of a dependency graph.
//!
//! The encoded document is JSON:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "root": 0,
//!   "nodes": [
//!     { "id": 0, "kind": "root", "label": "root", "messages": [] },
//!     { "id": 1, "kind": "module", "name": "app", "messages": [] }
//!   ],
//!   "edges": [ { "parent": 0, "children": [1] } ],
//!   "fingerprint": "<sha-256 of nodes and edges>"
//! }
//! ```
//!
//! Only nodes reachable from the root are written, renumbered in traversal
//! order, so the root is always `0` and orphans never leave the process.
//! Decoding checks the schema version before anything else and refuses
//! unknown versions and unknown node kinds.

use crate::constants::GRAPH_SCHEMA_VERSION;
use crate::core::DrError;
use crate::graph::{
    ArtifactNode, BomVersion, ConstraintNode, DependencyGraph, ExpansionState, FragmentNode, Message,
    ModuleNode, NodeId, NodeKind, Severity,
};
use crate::models::{Coordinates, ResolutionContext, SourceLocation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const KNOWN_KINDS: [&str; 5] = ["root", "module", "fragment", "artifact", "constraint"];

/// The whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub schema_version: u32,
    pub root: u32,
    pub nodes: Vec<SerializedNode>,
    pub edges: Vec<SerializedEdge>,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub id: u32,
    #[serde(flatten)]
    pub record: NodeRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MessageRecord>,
}

/// Variant-specific node fields. Node references are table ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeRecord {
    Root {
        label: String,
    },
    Module {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fragments: Vec<String>,
    },
    Fragment {
        module: String,
        fragment: String,
        notation: String,
        #[serde(default)]
        implicit: bool,
        context: ResolutionContext,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<SourceLocation>,
    },
    Artifact {
        coordinates: Coordinates,
        context: ResolutionContext,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved_version: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version_from_bom: Option<BomRecord>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overridden_by: Option<Vec<u32>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_kmp_library: Option<Coordinates>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publishing_coordinates: Option<Coordinates>,
        #[serde(default)]
        is_bom: bool,
        #[serde(default)]
        skipped: bool,
    },
    Constraint {
        coordinates: Coordinates,
        context: ResolutionContext,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved_version: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overridden_by: Option<Vec<u32>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomRecord {
    pub version: String,
    pub bom: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub severity: Severity,
    pub text: String,
    #[serde(default = "default_true")]
    pub report_transitive: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedEdge {
    pub parent: u32,
    pub children: Vec<u32>,
}

/// Builds the flat table of the reachable graph.
#[must_use]
pub fn to_table(graph: &DependencyGraph) -> SerializedGraph {
    let order: Vec<NodeId> = graph.distinct_bfs().collect();
    let ids: HashMap<NodeId, u32> = order
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i as u32))
        .collect();
    let remap = |refs: &BTreeSet<NodeId>| -> Vec<u32> {
        let mut mapped: Vec<u32> = refs.iter().filter_map(|r| ids.get(r).copied()).collect();
        mapped.sort_unstable();
        mapped
    };

    let mut nodes = Vec::with_capacity(order.len());
    let mut edges = Vec::new();
    for (index, &id) in order.iter().enumerate() {
        let node = graph.node(id);
        let record = match node.kind() {
            NodeKind::Root(r) => NodeRecord::Root {
                label: r.label.clone(),
            },
            NodeKind::Module(m) => NodeRecord::Module {
                name: m.name.clone(),
                fragments: m.fragments.clone(),
            },
            NodeKind::Fragment(f) => NodeRecord::Fragment {
                module: f.module.clone(),
                fragment: f.fragment.clone(),
                notation: f.notation.clone(),
                implicit: f.implicit,
                context: f.context.clone(),
                location: f.location.clone(),
            },
            NodeKind::Artifact(a) => NodeRecord::Artifact {
                coordinates: a.coordinates.clone(),
                context: a.context.clone(),
                resolved_version: a.resolved_version.clone(),
                version_from_bom: a.version_from_bom.as_ref().and_then(|b| {
                    ids.get(&b.bom).map(|&bom| BomRecord {
                        version: b.version.clone(),
                        bom,
                    })
                }),
                overridden_by: a.overridden_by.as_ref().map(&remap),
                parent_kmp_library: a.parent_kmp_library.clone(),
                publishing_coordinates: a.publishing_coordinates.clone(),
                is_bom: a.is_bom,
                skipped: a.state() == ExpansionState::Skipped,
            },
            NodeKind::Constraint(c) => NodeRecord::Constraint {
                coordinates: c.coordinates.clone(),
                context: c.context.clone(),
                resolved_version: c.resolved_version.clone(),
                overridden_by: c.overridden_by.as_ref().map(&remap),
            },
        };
        nodes.push(SerializedNode {
            id: index as u32,
            record,
            messages: node
                .messages()
                .iter()
                .map(|m| MessageRecord {
                    id: m.id.clone(),
                    severity: m.severity,
                    text: m.text.clone(),
                    report_transitive: m.report_transitive,
                })
                .collect(),
        });

        let children: Vec<u32> = graph
            .children(id)
            .iter()
            .filter_map(|c| ids.get(c).copied())
            .collect();
        if !children.is_empty() {
            edges.push(SerializedEdge {
                parent: index as u32,
                children,
            });
        }
    }

    let fingerprint = fingerprint(&nodes, &edges);
    SerializedGraph {
        schema_version: GRAPH_SCHEMA_VERSION,
        root: 0,
        nodes,
        edges,
        fingerprint,
    }
}

/// Rebuilds a live graph from its flat table.
pub fn from_table(table: SerializedGraph) -> Result<DependencyGraph, DrError> {
    if table.schema_version != GRAPH_SCHEMA_VERSION {
        return Err(DrError::UnsupportedSchemaVersion {
            found: table.schema_version,
            supported: GRAPH_SCHEMA_VERSION,
        });
    }
    let expected = fingerprint(&table.nodes, &table.edges);
    if expected != table.fingerprint {
        return Err(DrError::GraphIntegrity {
            reason: "fingerprint does not match the node and edge tables".to_string(),
        });
    }

    let count = table.nodes.len() as u32;
    let check = |id: u32| -> Result<NodeId, DrError> {
        if id < count {
            Ok(NodeId(id))
        } else {
            Err(DrError::GraphIntegrity {
                reason: format!("reference to unknown node {id}"),
            })
        }
    };

    let mut nodes = table.nodes.into_iter();
    let label = match nodes.next() {
        Some(SerializedNode {
            id: 0,
            record: NodeRecord::Root { label },
            ..
        }) if table.root == 0 => label,
        _ => {
            return Err(DrError::GraphIntegrity {
                reason: "the first node must be the root with id 0".to_string(),
            });
        }
    };

    let mut graph = DependencyGraph::new(label);
    let mut pending_messages = Vec::new();
    for (index, node) in nodes.enumerate() {
        let expected_id = index as u32 + 1;
        if node.id != expected_id {
            return Err(DrError::GraphIntegrity {
                reason: format!("node ids must be sequential, expected {expected_id} but found {}", node.id),
            });
        }
        let refs = |ids: Option<Vec<u32>>| -> Result<Option<BTreeSet<NodeId>>, DrError> {
            ids.map(|ids| ids.into_iter().map(&check).collect()).transpose()
        };
        let kind = match node.record {
            NodeRecord::Root { .. } => {
                return Err(DrError::GraphIntegrity {
                    reason: format!("node {} is a second root", node.id),
                });
            }
            NodeRecord::Module { name, fragments } => NodeKind::Module(ModuleNode { name, fragments }),
            NodeRecord::Fragment {
                module,
                fragment,
                notation,
                implicit,
                context,
                location,
            } => NodeKind::Fragment(FragmentNode {
                module,
                fragment,
                notation,
                implicit,
                context,
                location,
            }),
            NodeRecord::Artifact {
                coordinates,
                context,
                resolved_version,
                version_from_bom,
                overridden_by,
                parent_kmp_library,
                publishing_coordinates,
                is_bom,
                skipped,
            } => {
                let mut artifact = ArtifactNode::new(coordinates, context, is_bom);
                artifact.resolved_version = resolved_version;
                artifact.version_from_bom = version_from_bom
                    .map(|b| check(b.bom).map(|bom| BomVersion { version: b.version, bom }))
                    .transpose()?;
                artifact.overridden_by = refs(overridden_by)?;
                artifact.parent_kmp_library = parent_kmp_library;
                artifact.publishing_coordinates = publishing_coordinates;
                artifact.state = if skipped {
                    ExpansionState::Skipped
                } else {
                    ExpansionState::Expanded
                };
                artifact.expanded_version = artifact.resolved_version.clone();
                NodeKind::Artifact(artifact)
            }
            NodeRecord::Constraint {
                coordinates,
                context,
                resolved_version,
                overridden_by,
            } => {
                let mut constraint = ConstraintNode::new(coordinates, context);
                constraint.resolved_version = resolved_version;
                constraint.overridden_by = refs(overridden_by)?;
                NodeKind::Constraint(constraint)
            }
        };
        let id = graph.add_node(kind);
        pending_messages.push((id, node.messages));
    }

    for (id, messages) in pending_messages {
        for m in messages {
            graph.node_mut(id).add_message(Message {
                id: m.id,
                severity: m.severity,
                text: m.text,
                report_transitive: m.report_transitive,
            });
        }
    }

    for edge in table.edges {
        let parent = check(edge.parent)?;
        for child in edge.children {
            let child = check(child)?;
            if child == graph.root() {
                return Err(DrError::GraphIntegrity {
                    reason: format!("node {parent} lists the root as a child"),
                });
            }
            graph.add_edge(parent, child);
        }
    }

    graph.validate()?;
    Ok(graph)
}

/// Encodes the reachable graph as pretty-printed JSON.
pub fn encode(graph: &DependencyGraph) -> Result<String, DrError> {
    Ok(serde_json::to_string_pretty(&to_table(graph))?)
}

/// Decodes a document produced by [`encode`].
pub fn decode(text: &str) -> Result<DependencyGraph, DrError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let found = value
        .get("schema_version")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| DrError::SerializationError {
            reason: "missing schema_version".to_string(),
        })?;
    if found != u64::from(GRAPH_SCHEMA_VERSION) {
        return Err(DrError::UnsupportedSchemaVersion {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            supported: GRAPH_SCHEMA_VERSION,
        });
    }

    if let Some(nodes) = value.get("nodes").and_then(serde_json::Value::as_array) {
        for node in nodes {
            let kind = node.get("kind").and_then(serde_json::Value::as_str).unwrap_or_default();
            if !KNOWN_KINDS.contains(&kind) {
                return Err(DrError::UnknownNodeKind {
                    kind: kind.to_string(),
                });
            }
        }
    }

    let table: SerializedGraph = serde_json::from_value(value)?;
    debug!(target: "resolver", nodes = table.nodes.len(), "decoding dependency graph");
    from_table(table)
}

/// Writes the encoded graph atomically.
pub fn write_to_path(graph: &DependencyGraph, path: &Path) -> Result<(), DrError> {
    let encoded = encode(graph)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(encoded.as_bytes())?;
    file.write_all(b"\n")?;
    file.persist(path).map_err(|e| DrError::Io(e.error.to_string()))?;
    Ok(())
}

/// Reads and decodes a graph file.
pub fn read_from_path(path: &Path) -> Result<DependencyGraph, DrError> {
    let text = std::fs::read_to_string(path)?;
    decode(&text)
}

fn fingerprint(nodes: &[SerializedNode], edges: &[SerializedEdge]) -> String {
    let mut hasher = Sha256::new();
    // Serializing plain records into a Vec cannot fail.
    if let Ok(bytes) = serde_json::to_vec(&(nodes, edges)) {
        hasher.update(&bytes);
    }
    hex::encode(hasher.finalize())
}
