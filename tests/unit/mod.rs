//! Unit-level tests of the public building blocks.
//!
//! These run without a resolver: version ordering, coordinates, resolution
//! contexts and request files.

mod coordinates;
mod versions;
