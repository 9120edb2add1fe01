//! Data model of a resolution: coordinates, contexts and requests.
//!
//! These types are plain values. They carry no graph state and can be freely
//! cloned, hashed and compared; node identity in the graph is built from
//! [`Coordinates`] and [`ResolutionContext`].

pub mod context;
pub mod coordinates;
pub mod request;

pub use context::{DependencyScope, ResolutionContext, ResolutionPlatform, ResolutionScope};
pub use coordinates::{Coordinates, DependencyKey, UNSPECIFIED_VERSION};
pub use request::{
    Declaration, DeclaredDependency, FileCacheConfig, FragmentSettings, ResolutionDepth,
    ResolutionInput, ResolutionRequest, SourceLocation,
};
