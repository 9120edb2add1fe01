//! depgraph - dependency resolution graphs for multi-module projects
//!
//! Given per-module, per-fragment dependency declarations (Maven
//! coordinates, references to other modules and BOM imports), depgraph
//! builds one deduplicated acyclic graph of resolved artifacts. It expands
//! transitive dependencies through a [`metadata::MetadataFetcher`], takes
//! versions from BOMs, resolves version conflicts (highest wins) and
//! substitutes Kotlin Multiplatform libraries by their platform variants.
//!
//! # Architecture Overview
//!
//! Data flows one way:
//!
//! ```text
//! declarations -> graph builder -> BOM versions -> conflicts -> variants
//!                      |                                          |
//!               metadata fetcher                  query / diagnostics / serialization
//! ```
//!
//! Node identity depends on the resolution context (scope, platforms,
//! test or main) as well as the coordinates, so the same library can appear
//! once per context with different versions.
//!
//! # Core Modules
//!
//! ## Model
//! - [`models`] - Coordinates, resolution contexts and requests
//! - [`graph`] - Arena-backed graph, node variants and tree rendering
//! - [`version`] - Maven version ordering
//!
//! ## Resolution
//! - [`resolver`] - Graph builder, BOM lookup, conflict resolution, variants
//! - [`metadata`] - Metadata fetchers (local directories, in-memory)
//! - [`cache`] - Single-flight metadata cache and the artifact file cache
//!
//! ## Inspection
//! - [`query`] - Module and fragment views, dependency insight
//! - [`diagnostics`] - Build problems and their projection onto declarations
//! - [`serialization`] - Versioned JSON form of a resolved graph
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - User configuration (`~/.depgraph/config.toml`)
//! - [`core`] - Error types and operation contexts
//! - [`constants`] - Shared limits and defaults
//!
//! # Command-Line Usage
//!
//! ```bash
//! depgraph tree request.toml
//! depgraph insight request.toml com.squareup.okio:okio
//! depgraph problems request.toml --deny-errors
//! depgraph export request.toml graph.json
//! depgraph show graph.json
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod diagnostics;
pub mod graph;
pub mod metadata;
pub mod models;
pub mod query;
pub mod resolver;
pub mod serialization;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
