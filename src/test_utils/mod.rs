//! Test utilities for depgraph.
//!
//! Helpers shared by unit tests and the test targets under `tests/`:
//!
//! - [`init_test_logging`] for opt-in tracing output
//! - [`fixtures`] with in-memory repositories for the common resolution
//!   scenarios (KMP variants, BOM versions, conflicts)
//! - [`repository`] for on-disk repositories and request files used by
//!   command-line tests
//!
//! # Example
//!
//! ```rust,no_run
//! use depgraph_cli::resolver::Resolver;
//! use depgraph_cli::test_utils::fixtures;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let resolver = Resolver::new(Arc::new(fixtures::okio_repository()));
//! let resolved = resolver.resolve(&fixtures::okio_request()).await?;
//! assert!(resolved.validate().is_ok());
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod repository;

pub use fixtures::coords;
pub use repository::RepositoryFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call installs a subscriber. `level` wins over `RUST_LOG`;
/// with neither, tests run silently.
///
/// ```bash
/// RUST_LOG=resolver=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
