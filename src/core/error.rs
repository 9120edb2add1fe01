//! Error handling for depgraph
//!
//! This module provides the error taxonomy of the resolution engine and the
//! user-facing rendering used by the command line. Errors are split in two
//! families:
//!
//! - [`DrError`]: failures that abort an operation (decoding a graph with an
//!   unknown schema, asking for a module that does not exist, a failed artifact
//!   download, a cancelled run).
//! - Node-local problems: unresolvable coordinates, missing versions, version
//!   overrides. These never surface as `DrError`; they are recorded as
//!   [`Message`](crate::graph::Message)s on graph nodes and reported later by the
//!   [`diagnostics`](crate::diagnostics) collector.
//!
//! # Error Context
//!
//! [`ErrorContext`] wraps a [`DrError`] with an optional suggestion and details
//! for display in the terminal:
//!
//! ```rust
//! use depgraph_cli::core::{DrError, ErrorContext};
//!
//! let ctx = ErrorContext::new(DrError::ModuleNotFound {
//!     name: "ap".to_string(),
//!     suggestion: Some("app".to_string()),
//! })
//! .with_suggestion("Run 'depgraph tree' to list resolved modules");
//! assert!(ctx.to_string().contains("ap"));
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Errors produced by the resolution engine and its surfaces.
///
/// Variants carry owned strings so that errors can be cloned out of memoized
/// results and sent across tasks.
#[derive(Error, Debug, Clone)]
pub enum DrError {
    /// A serialized graph declares a schema version this build cannot decode.
    ///
    /// Decoding never downgrades silently; the caller must re-resolve.
    #[error("Unsupported graph schema version {found} (this build supports version {supported})")]
    UnsupportedSchemaVersion {
        /// Version found in the document
        found: u32,
        /// Version produced and accepted by this build
        supported: u32,
    },

    /// A serialized node carries a variant tag that is not known.
    #[error("Unknown node kind '{kind}' in serialized graph")]
    UnknownNodeKind {
        /// The offending tag
        kind: String,
    },

    /// The serialized form could not be parsed or produced.
    #[error("Failed to (de)serialize dependency graph: {reason}")]
    SerializationError {
        /// Underlying parser message
        reason: String,
    },

    /// The graph violates a structural invariant (dangling id, broken edge, cycle).
    #[error("Dependency graph integrity check failed: {reason}")]
    GraphIntegrity {
        /// Description of the violation
        reason: String,
    },

    /// A module requested from a query is not part of the resolved graph.
    #[error("Module '{name}' is not part of the dependency graph{}", did_you_mean(.suggestion))]
    ModuleNotFound {
        /// Requested module name
        name: String,
        /// Closest known module name, if any
        suggestion: Option<String>,
    },

    /// A fragment requested from a query is not part of the module.
    #[error("Fragment '{fragment}' of module '{module}' is not part of the dependency graph")]
    FragmentNotFound {
        /// Module name
        module: String,
        /// Fragment name
        fragment: String,
    },

    /// Coordinates could not be parsed from text.
    #[error("Invalid coordinates '{input}': {reason}")]
    InvalidCoordinates {
        /// The raw text
        input: String,
        /// Why parsing failed
        reason: String,
    },

    /// Downloading the files of an artifact failed.
    ///
    /// This invalidates the file list of that artifact only.
    #[error("Failed to download files of {coordinates}: {reason}")]
    DownloadFailed {
        /// Artifact coordinates
        coordinates: String,
        /// Collaborator-supplied reason
        reason: String,
    },

    /// The resolution run was cancelled or timed out.
    #[error("Resolution was cancelled: {reason}")]
    Cancelled {
        /// Cancellation cause
        reason: String,
    },

    /// The configuration file is unreadable or invalid.
    #[error("Invalid configuration in {file}: {reason}")]
    ConfigError {
        /// Configuration file path
        file: String,
        /// Parser message
        reason: String,
    },

    /// A resolution request file is invalid.
    #[error("Invalid resolution request {file}: {reason}")]
    RequestParseError {
        /// Request file path
        file: String,
        /// Parser message
        reason: String,
    },

    /// Wrapped I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

impl From<std::io::Error> for DrError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for DrError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: error.to_string(),
        }
    }
}

/// Convenience alias for library results.
pub type Result<T, E = DrError> = std::result::Result<T, E>;

/// A [`DrError`] decorated with guidance for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DrError,
    /// Optional actionable suggestion
    pub suggestion: Option<String>,
    /// Optional additional details
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wraps an error without suggestion or details.
    #[must_use]
    pub const fn new(error: DrError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Adds an actionable suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Adds explanatory details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.error);
        if let Some(details) = &self.details {
            eprintln!("{} {}", "details:".yellow(), details);
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("{} {}", "suggestion:".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into an [`ErrorContext`] with suggestions where the
/// failure family is known.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(dr_error) = error.downcast_ref::<DrError>() {
        return create_error_context(dr_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        // Keep the context chain, it names the file
        let message = format!("{error:#}");
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ErrorContext::new(DrError::Io(message))
                .with_suggestion("Check that the file or directory exists and the path is correct"),
            std::io::ErrorKind::PermissionDenied => ErrorContext::new(DrError::Io(message))
                .with_suggestion("Check file ownership and permissions"),
            _ => ErrorContext::new(DrError::Io(message)),
        };
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(DrError::RequestParseError {
            file: "request".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the request or configuration file");
    }

    // Fall back to the full anyhow chain
    ErrorContext::new(DrError::Io(format!("{error:#}")))
}

fn create_error_context(error: DrError) -> ErrorContext {
    match &error {
        DrError::UnsupportedSchemaVersion { .. } => ErrorContext::new(error)
            .with_suggestion("Re-run resolution and export the graph again with this version")
            .with_details("Serialized graphs are only readable by a build with the same schema"),
        DrError::UnknownNodeKind { .. } | DrError::GraphIntegrity { .. } => {
            ErrorContext::new(error)
                .with_suggestion("The graph file is corrupted or was produced by a newer build; export it again")
        }
        DrError::ModuleNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'depgraph tree' to list the modules of the request"),
        DrError::Cancelled { .. } => ErrorContext::new(error)
            .with_suggestion("Increase 'timeout_secs' in the configuration or pass --timeout"),
        DrError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the configuration file or remove it to use defaults"),
        _ => ErrorContext::new(error),
    }
}
