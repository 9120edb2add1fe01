//! Resolution contexts.
//!
//! A node in the graph is identified by its coordinates *and* the context it
//! was requested in: the same library requested for a JVM compile classpath
//! and for a JS test classpath yields two distinct nodes, each with its own
//! conflict resolution outcome.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Classpath scope of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionScope {
    Compile,
    Runtime,
}

impl fmt::Display for ResolutionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "COMPILE"),
            Self::Runtime => write!(f, "RUNTIME"),
        }
    }
}

/// Scope of a dependency as declared in artifact metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    #[default]
    Compile,
    Runtime,
    Provided,
    Test,
}

/// Leaf target platforms a variant can be published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionPlatform {
    Jvm,
    Android,
    Js,
    WasmJs,
    IosArm64,
    IosX64,
    IosSimulatorArm64,
    MacosArm64,
    MacosX64,
    LinuxX64,
    LinuxArm64,
    MingwX64,
}

impl ResolutionPlatform {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jvm => "jvm",
            Self::Android => "android",
            Self::Js => "js",
            Self::WasmJs => "wasmJs",
            Self::IosArm64 => "iosArm64",
            Self::IosX64 => "iosX64",
            Self::IosSimulatorArm64 => "iosSimulatorArm64",
            Self::MacosArm64 => "macosArm64",
            Self::MacosX64 => "macosX64",
            Self::LinuxX64 => "linuxX64",
            Self::LinuxArm64 => "linuxArm64",
            Self::MingwX64 => "mingwX64",
        }
    }
}

impl fmt::Display for ResolutionPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Context a node is resolved in.
///
/// `IdeSync` unions every classpath of a module: both scopes, main and test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionContext {
    Classpath {
        scope: ResolutionScope,
        platforms: BTreeSet<ResolutionPlatform>,
        is_test: bool,
    },
    IdeSync {
        platforms: BTreeSet<ResolutionPlatform>,
    },
}

impl ResolutionContext {
    #[must_use]
    pub fn classpath(
        scope: ResolutionScope,
        platforms: impl IntoIterator<Item = ResolutionPlatform>,
        is_test: bool,
    ) -> Self {
        Self::Classpath {
            scope,
            platforms: platforms.into_iter().collect(),
            is_test,
        }
    }

    #[must_use]
    pub fn ide_sync(platforms: impl IntoIterator<Item = ResolutionPlatform>) -> Self {
        Self::IdeSync {
            platforms: platforms.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn platforms(&self) -> &BTreeSet<ResolutionPlatform> {
        match self {
            Self::Classpath { platforms, .. } | Self::IdeSync { platforms } => platforms,
        }
    }

    /// The target platform when the context is resolved for exactly one.
    #[must_use]
    pub fn single_platform(&self) -> Option<ResolutionPlatform> {
        let platforms = self.platforms();
        if platforms.len() == 1 {
            platforms.iter().next().copied()
        } else {
            None
        }
    }

    /// Whether a transitive dependency declared with `scope` belongs here.
    ///
    /// Test and provided dependencies of an artifact never propagate.
    #[must_use]
    pub fn includes(&self, scope: DependencyScope) -> bool {
        match (self, scope) {
            (_, DependencyScope::Test | DependencyScope::Provided) => false,
            (_, DependencyScope::Compile) => true,
            (Self::IdeSync { .. }, DependencyScope::Runtime) => true,
            (Self::Classpath { scope, .. }, DependencyScope::Runtime) => {
                *scope == ResolutionScope::Runtime
            }
        }
    }

    /// Whether a dependency restricted to `platforms` is visible here.
    #[must_use]
    pub fn covered_by(&self, platforms: &[ResolutionPlatform]) -> bool {
        platforms.is_empty() || self.platforms().iter().all(|p| platforms.contains(p))
    }
}

impl fmt::Display for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let platforms = self
            .platforms()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match self {
            Self::Classpath { scope, is_test, .. } => {
                let kind = if *is_test { "test" } else { "main" };
                write!(f, "{scope} [{platforms}] {kind}")
            }
            Self::IdeSync { .. } => write!(f, "IDE sync [{platforms}]"),
        }
    }
}
