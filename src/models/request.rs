//! Resolution requests as produced by the module-model front end.

use super::context::{ResolutionContext, ResolutionPlatform, ResolutionScope};
use super::coordinates::Coordinates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Place in a module file where a dependency was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A dependency as written in a module fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredDependency {
    /// External library, or a BOM when `bom` is set.
    Maven {
        coordinates: Coordinates,
        bom: bool,
        implicit: bool,
        location: Option<SourceLocation>,
    },
    /// Reference to another module of the same project.
    Module {
        name: String,
        location: Option<SourceLocation>,
    },
}

impl DeclaredDependency {
    #[must_use]
    pub fn maven(coordinates: Coordinates) -> Self {
        Self::Maven {
            coordinates,
            bom: false,
            implicit: false,
            location: None,
        }
    }

    #[must_use]
    pub fn bom(coordinates: Coordinates) -> Self {
        Self::Maven {
            coordinates,
            bom: true,
            implicit: false,
            location: None,
        }
    }

    #[must_use]
    pub fn module(name: impl Into<String>) -> Self {
        Self::Module {
            name: name.into(),
            location: None,
        }
    }

    /// Marks a Maven dependency as added by the toolchain rather than the user.
    #[must_use]
    pub fn implicit(mut self) -> Self {
        if let Self::Maven { implicit, .. } = &mut self {
            *implicit = true;
        }
        self
    }

    #[must_use]
    pub fn at(mut self, source: SourceLocation) -> Self {
        match &mut self {
            Self::Maven { location, .. } | Self::Module { location, .. } => *location = Some(source),
        }
        self
    }

    #[must_use]
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Maven { location, .. } | Self::Module { location, .. } => location.as_ref(),
        }
    }

    /// Text shown after `module:fragment:` in a rendered tree.
    #[must_use]
    pub fn notation(&self) -> String {
        match self {
            Self::Maven { coordinates, .. } => format!(
                "{}:{}:{}",
                coordinates.group,
                coordinates.module,
                coordinates.version_or_unspecified()
            ),
            Self::Module { name, .. } => format!("module:{name}"),
        }
    }
}

/// One `(module, fragment, dependency)` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub module: String,
    pub fragment: String,
    pub dependency: DeclaredDependency,
}

/// Per-fragment overrides of the request-wide platforms and test flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentSettings {
    pub module: String,
    pub fragment: String,
    #[serde(default)]
    pub platforms: BTreeSet<ResolutionPlatform>,
    #[serde(default)]
    pub is_test: Option<bool>,
}

/// How far expansion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionDepth {
    /// Transitive closure.
    #[default]
    Full,
    /// Declared artifacts only, without fetching their dependencies.
    DirectOnly,
    /// Module and fragment structure only.
    NoExternal,
}

/// Where downloaded artifact files are locked and whether sources are wanted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FileCacheConfig {
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub download_sources: bool,
}

/// Request-wide resolution parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionInput {
    pub scope: ResolutionScope,
    pub platforms: BTreeSet<ResolutionPlatform>,
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub ide_sync: bool,
    #[serde(default)]
    pub depth: ResolutionDepth,
    #[serde(default)]
    pub file_cache: FileCacheConfig,
}

impl Default for ResolutionInput {
    fn default() -> Self {
        Self {
            scope: ResolutionScope::Compile,
            platforms: BTreeSet::from([ResolutionPlatform::Jvm]),
            is_test: false,
            ide_sync: false,
            depth: ResolutionDepth::Full,
            file_cache: FileCacheConfig::default(),
        }
    }
}

/// Everything one resolution run needs from the module model.
#[derive(Debug, Clone, Default)]
pub struct ResolutionRequest {
    pub input: ResolutionInput,
    pub declarations: Vec<Declaration>,
    pub fragments: Vec<FragmentSettings>,
}

impl ResolutionRequest {
    #[must_use]
    pub fn new(input: ResolutionInput) -> Self {
        Self {
            input,
            declarations: Vec::new(),
            fragments: Vec::new(),
        }
    }

    pub fn declare(
        &mut self,
        module: impl Into<String>,
        fragment: impl Into<String>,
        dependency: DeclaredDependency,
    ) -> &mut Self {
        self.declarations.push(Declaration {
            module: module.into(),
            fragment: fragment.into(),
            dependency,
        });
        self
    }

    /// Builder form of [`declare`](Self::declare).
    #[must_use]
    pub fn with(
        mut self,
        module: impl Into<String>,
        fragment: impl Into<String>,
        dependency: DeclaredDependency,
    ) -> Self {
        self.declare(module, fragment, dependency);
        self
    }

    #[must_use]
    pub fn with_fragment(mut self, settings: FragmentSettings) -> Self {
        self.fragments.push(settings);
        self
    }

    /// Modules in order of first appearance.
    #[must_use]
    pub fn modules(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        let names = self
            .fragments
            .iter()
            .map(|f| f.module.as_str())
            .chain(self.declarations.iter().map(|d| d.module.as_str()));
        for name in names {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    /// Fragments of `module` in order of first appearance.
    #[must_use]
    pub fn fragments_of(&self, module: &str) -> Vec<&str> {
        let mut seen = Vec::new();
        let names = self
            .fragments
            .iter()
            .filter(|f| f.module == module)
            .map(|f| f.fragment.as_str())
            .chain(
                self.declarations
                    .iter()
                    .filter(|d| d.module == module)
                    .map(|d| d.fragment.as_str()),
            );
        for name in names {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    /// Declarations of one fragment with their index in the request.
    pub fn declarations_of<'a>(
        &'a self,
        module: &'a str,
        fragment: &'a str,
    ) -> impl Iterator<Item = (usize, &'a Declaration)> + 'a {
        self.declarations
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.module == module && d.fragment == fragment)
    }

    #[must_use]
    pub fn has_module(&self, module: &str) -> bool {
        self.modules().contains(&module)
    }

    /// Context the dependencies of one fragment are resolved in.
    #[must_use]
    pub fn context_for(&self, module: &str, fragment: &str) -> ResolutionContext {
        let settings = self
            .fragments
            .iter()
            .find(|f| f.module == module && f.fragment == fragment);

        let platforms = settings
            .map(|s| s.platforms.clone())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.input.platforms.clone());

        if self.input.ide_sync {
            return ResolutionContext::IdeSync { platforms };
        }

        ResolutionContext::Classpath {
            scope: self.input.scope,
            platforms,
            is_test: settings
                .and_then(|s| s.is_test)
                .unwrap_or(self.input.is_test),
        }
    }
}
