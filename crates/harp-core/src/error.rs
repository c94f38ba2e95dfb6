//! # Error Types
//!
//! The foundational error type. All errors across the workspace use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Errors fail loudly with full context; they signal a logic or
//!   configuration bug, never a data-quality issue.
//! - Missing or empty raw data is NOT an error anywhere in the pipeline —
//!   it is resolved to a concrete control code by the coding phase.
//! - Nothing in the core catches an error and downgrades it to a warning;
//!   silent partial success would corrupt the analysis exports.

use thiserror::Error;

/// Error type for the foundational types: value validation and label
/// (de)serialization. The scheme, plan, engine, and export crates carry
/// their own error enums for their richer failure modes.
#[derive(Error, Debug)]
pub enum HarpError {
    /// An input value failed structural validation (a malformed
    /// timestamp, identifier, control code, or mode string).
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
