//! Maven coordinates and the version-independent dependency key.

use crate::core::DrError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Allowed characters of a group or module segment.
static SEGMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").ok());

/// Allowed characters of a version segment (adds `+` used by build metadata).
static VERSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-+]+$").ok());

fn is_match(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// Text used in place of a missing version.
pub const UNSPECIFIED_VERSION: &str = "unspecified";

/// `group:module[:version]` identifying an external artifact.
///
/// Coordinates serialize as their textual form, which keeps metadata documents
/// and serialized graphs readable:
///
/// ```rust
/// use depgraph_cli::models::Coordinates;
///
/// let coords: Coordinates = "com.example:okio:3.0".parse().unwrap();
/// assert_eq!(coords.group, "com.example");
/// assert_eq!(coords.version.as_deref(), Some("3.0"));
/// assert_eq!(coords.to_string(), "com.example:okio:3.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinates {
    pub group: String,
    pub module: String,
    pub version: Option<String>,
}

impl Coordinates {
    /// Creates coordinates, validating every segment.
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: Option<&str>,
    ) -> Result<Self, DrError> {
        let coords = Self {
            group: group.into(),
            module: module.into(),
            version: version.map(str::to_string),
        };
        coords.validate()?;
        Ok(coords)
    }

    fn validate(&self) -> Result<(), DrError> {
        let invalid = |reason: &str| DrError::InvalidCoordinates {
            input: self.to_string(),
            reason: reason.to_string(),
        };
        if !is_match(&SEGMENT, &self.group) {
            return Err(invalid("group contains unsupported characters or is empty"));
        }
        if !is_match(&SEGMENT, &self.module) {
            return Err(invalid("module contains unsupported characters or is empty"));
        }
        if let Some(version) = &self.version {
            if !is_match(&VERSION, version) {
                return Err(invalid("version contains unsupported characters or is empty"));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn key(&self) -> DependencyKey {
        DependencyKey {
            group: self.group.clone(),
            module: self.module.clone(),
        }
    }

    /// Same group and module with another version.
    #[must_use]
    pub fn with_version(&self, version: &str) -> Self {
        Self {
            group: self.group.clone(),
            module: self.module.clone(),
            version: Some(version.to_string()),
        }
    }

    /// The declared version, or `unspecified`.
    #[must_use]
    pub fn version_or_unspecified(&self) -> &str {
        self.version.as_deref().unwrap_or(UNSPECIFIED_VERSION)
    }

    #[must_use]
    pub fn matches(&self, group: &str, module: &str) -> bool {
        self.group == group && self.module == module
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", self.group, self.module, version),
            None => write!(f, "{}:{}", self.group, self.module),
        }
    }
}

impl FromStr for Coordinates {
    type Err = DrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, module] => Self::new(*group, *module, None),
            [group, module, version] => Self::new(*group, *module, Some(version)),
            _ => Err(DrError::InvalidCoordinates {
                input: s.to_string(),
                reason: "expected group:module[:version]".to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Coordinates {
    type Error = DrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinates> for String {
    fn from(value: Coordinates) -> Self {
        value.to_string()
    }
}

/// `group:module`, the version-independent part of [`Coordinates`] used to
/// group candidates during conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyKey {
    pub group: String,
    pub module: String,
}

impl DependencyKey {
    #[must_use]
    pub fn new(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.module)
    }
}
