//! Global constants used throughout the resolver.
//!
//! Timeouts, retry parameters and format versions that are shared between
//! modules live here so the numbers stay discoverable.

use std::time::Duration;

/// Version of the serialized graph format produced by this build.
///
/// Decoding refuses any other version.
pub const GRAPH_SCHEMA_VERSION: u32 = 1;

/// Minimum number of parallel fetches regardless of CPU count.
pub const MIN_PARALLELISM: usize = 4;

/// Multiplier applied to CPU core count for default parallelism.
///
/// Fetching is I/O-bound, so more tasks than cores keeps the pipe full.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 4;

/// Default CPU core count when detection fails.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Upper bound on expand / BOM / conflict rounds of one resolution.
///
/// Each round either settles the graph or re-expands at least one overridden
/// node at a strictly newer version, so real graphs settle in a handful of
/// rounds.
pub const MAX_CONFLICT_ROUNDS: usize = 64;

/// Default number of retries of a transient fetch failure.
pub const DEFAULT_FETCH_RETRIES: usize = 3;

/// Starting delay for exponential backoff (10ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Maximum backoff delay for exponential backoff (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Timeout for waiting on another task's in-flight fetch of the same
/// coordinates before fetching independently.
pub const PENDING_STATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for cross-process artifact lock acquisition.
pub fn default_lock_timeout() -> Duration {
    Duration::from_secs(120)
}

/// Default parallelism derived from the number of available cores.
#[must_use]
pub fn default_parallelism() -> usize {
    let cores = std::thread::available_parallelism().map_or(FALLBACK_CORE_COUNT, |n| n.get());
    (cores * PARALLELISM_CORE_MULTIPLIER).max(MIN_PARALLELISM)
}
