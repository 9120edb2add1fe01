//! Integration test suite for depgraph
//!
//! End-to-end tests through the public API and the `depgraph` binary. They
//! run quickly and belong in every CI run.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolution**: graph construction, BOM versions, conflicts, variants
//! - **diagnostics**: problems and their projection onto declarations
//! - **insight**: dependency insight results and memoization
//! - **serialization**: exported graphs and schema checks
//! - **concurrency**: single-flight fetching, cancellation and timeouts
//! - **downloads**: artifact file collection
//! - **cli**: the command-line interface against on-disk repositories

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod concurrency;
mod diagnostics;
mod downloads;
mod insight;
mod resolution;
mod serialization;
