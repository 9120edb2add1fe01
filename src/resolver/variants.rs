//! Multiplatform variant lookups.
//!
//! A common library published for several platforms points at one
//! platform-specific artifact per platform. The builder substitutes the common
//! node's children with that single variant when the context targets exactly
//! one platform. The index is built from the reachable graph once the build is
//! done, so variants left behind by re-expansion are not part of it.

use crate::graph::DependencyGraph;
use crate::models::{Coordinates, ResolutionContext, ResolutionPlatform};
use std::collections::HashMap;

/// Bidirectional common-library / platform-variant mapping of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantIndex {
    variants: HashMap<(Coordinates, ResolutionPlatform), Coordinates>,
    parents: HashMap<Coordinates, Coordinates>,
}

impl VariantIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the index from the reachable artifact nodes of a graph.
    #[must_use]
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let mut index = Self::new();
        for id in graph.distinct_bfs() {
            let Some(artifact) = graph.node(id).as_artifact() else {
                continue;
            };
            let (Some(common), Some(platform), Some(variant)) = (
                artifact.parent_kmp_library.as_ref(),
                artifact.context.single_platform(),
                artifact.resolved_coordinates(),
            ) else {
                continue;
            };
            index.record(common.clone(), platform, variant);
        }
        index
    }

    pub fn record(&mut self, common: Coordinates, platform: ResolutionPlatform, variant: Coordinates) {
        self.parents.insert(variant.clone(), common.clone());
        self.variants.insert((common, platform), variant);
    }

    /// Platform-specific publishing coordinates of `common` for `platform`.
    #[must_use]
    pub fn variant_for(&self, common: &Coordinates, platform: ResolutionPlatform) -> Option<&Coordinates> {
        self.variants.get(&(common.clone(), platform))
    }

    /// Publishing coordinates of `common` in a context targeting one platform.
    #[must_use]
    pub fn variant_of(&self, common: &Coordinates, context: &ResolutionContext) -> Option<&Coordinates> {
        self.variant_for(common, context.single_platform()?)
    }

    /// Common library a platform-specific artifact was substituted for.
    #[must_use]
    pub fn parent_of(&self, variant: &Coordinates) -> Option<&Coordinates> {
        self.parents.get(variant)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// `(common, platform, variant)` triples in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Coordinates, ResolutionPlatform, &Coordinates)> {
        self.variants
            .iter()
            .map(|((common, platform), variant)| (common, *platform, variant))
    }
}
