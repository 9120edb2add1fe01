//! TOML request files read by the command line.
//!
//! ```toml
//! scope = "compile"
//! platforms = ["jvm"]
//! depth = "full"
//! repositories = ["repo"]
//!
//! [[modules]]
//! name = "app"
//!
//! [[modules.fragments]]
//! name = "jvm"
//! dependencies = [
//!     "com.squareup.okio:okio:3.9.0",
//!     { bom = "org.jetbrains.kotlinx:kotlinx-coroutines-bom:1.8.0" },
//!     { maven = "org.jetbrains.kotlinx:kotlinx-coroutines-core" },
//!     { maven = "org.jetbrains.kotlin:kotlin-stdlib:2.1.20", implicit = true },
//!     { module = "shared" },
//! ]
//! ```
//!
//! Relative repository paths are resolved against the request file. Every
//! declaration carries its line and column in the file, which problem
//! reports point at.

use crate::core::DrError;
use crate::models::{
    Coordinates, DeclaredDependency, FileCacheConfig, FragmentSettings, ResolutionDepth, ResolutionInput,
    ResolutionPlatform, ResolutionRequest, ResolutionScope, SourceLocation,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use toml::Spanned;

#[derive(Debug, Deserialize)]
struct RequestFile {
    #[serde(default = "default_scope")]
    scope: ResolutionScope,
    #[serde(default = "default_platforms")]
    platforms: BTreeSet<ResolutionPlatform>,
    #[serde(default)]
    is_test: bool,
    #[serde(default)]
    ide_sync: bool,
    #[serde(default)]
    depth: ResolutionDepth,
    #[serde(default)]
    repositories: Vec<String>,
    #[serde(default)]
    modules: Vec<ModuleSpec>,
}

fn default_scope() -> ResolutionScope {
    ResolutionScope::Compile
}

fn default_platforms() -> BTreeSet<ResolutionPlatform> {
    BTreeSet::from([ResolutionPlatform::Jvm])
}

#[derive(Debug, Deserialize)]
struct ModuleSpec {
    name: String,
    #[serde(default)]
    fragments: Vec<FragmentSpec>,
}

#[derive(Debug, Deserialize)]
struct FragmentSpec {
    name: String,
    #[serde(default)]
    platforms: BTreeSet<ResolutionPlatform>,
    #[serde(default)]
    is_test: Option<bool>,
    #[serde(default)]
    dependencies: Vec<Spanned<DependencySpec>>,
}

/// A declaration: bare coordinates or a table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    Notation(String),
    Maven {
        maven: String,
        #[serde(default)]
        implicit: bool,
    },
    Bom {
        bom: String,
    },
    Module {
        module: String,
    },
}

/// A parsed request file.
#[derive(Debug)]
pub struct LoadedRequest {
    pub request: ResolutionRequest,
    /// Repository roots declared by the file, made absolute.
    pub repositories: Vec<PathBuf>,
}

/// Reads and parses the request file at `path`.
pub async fn load_request(path: &Path, file_cache: FileCacheConfig) -> Result<LoadedRequest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    Ok(parse_request(&content, path, file_cache)?)
}

/// Parses request file content; `path` is used for locations and relative
/// repository roots.
pub fn parse_request(content: &str, path: &Path, file_cache: FileCacheConfig) -> Result<LoadedRequest, DrError> {
    let parse_error = |reason: String| DrError::RequestParseError {
        file: path.display().to_string(),
        reason,
    };
    let file: RequestFile = toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;

    let mut request = ResolutionRequest::new(ResolutionInput {
        scope: file.scope,
        platforms: file.platforms,
        is_test: file.is_test,
        ide_sync: file.ide_sync,
        depth: file.depth,
        file_cache,
    });

    for module in file.modules {
        for fragment in module.fragments {
            request = request.with_fragment(FragmentSettings {
                module: module.name.clone(),
                fragment: fragment.name.clone(),
                platforms: fragment.platforms,
                is_test: fragment.is_test,
            });
            for spec in fragment.dependencies {
                let location = location_of(content, spec.span().start, path);
                let dependency = match spec.into_inner() {
                    DependencySpec::Notation(text) => DeclaredDependency::maven(coordinates(&text, &parse_error)?),
                    DependencySpec::Maven { maven, implicit } => {
                        let dependency = DeclaredDependency::maven(coordinates(&maven, &parse_error)?);
                        if implicit { dependency.implicit() } else { dependency }
                    }
                    DependencySpec::Bom { bom } => DeclaredDependency::bom(coordinates(&bom, &parse_error)?),
                    DependencySpec::Module { module } => DeclaredDependency::module(module),
                };
                request.declare(&module.name, &fragment.name, dependency.at(location));
            }
        }
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let repositories = file
        .repositories
        .iter()
        .map(|r| {
            let root = PathBuf::from(r);
            if root.is_absolute() { root } else { base.join(root) }
        })
        .collect();

    Ok(LoadedRequest {
        request,
        repositories,
    })
}

fn coordinates(text: &str, parse_error: &impl Fn(String) -> DrError) -> Result<Coordinates, DrError> {
    text.parse().map_err(|e: DrError| parse_error(e.to_string()))
}

/// One-based line and column of a byte offset.
fn location_of(content: &str, offset: usize, path: &Path) -> SourceLocation {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
    SourceLocation {
        file: path.to_path_buf(),
        line: line as u32,
        column: column as u32,
    }
}
