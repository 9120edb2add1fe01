//! Core types shared across the resolution engine.
//!
//! - [`error`]: the [`DrError`] taxonomy and user-facing [`ErrorContext`]
//! - [`operation_context`]: per-run cancellation and warn-once state

pub mod error;
pub mod operation_context;

pub use error::{DrError, ErrorContext, user_friendly_error};
pub use operation_context::OperationContext;
