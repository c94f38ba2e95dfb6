//! # Plan Errors
//!
//! Configuration-model failures. All fatal at startup, before any record
//! is processed.

use thiserror::Error;

/// Errors from coding-plan construction, manifest resolution, and
/// pipeline-configuration loading.
#[derive(Error, Debug)]
pub enum PlanError {
    /// A coding mode was paired with an incompatible fold mode.
    #[error(
        "coding configuration {coded_field:?}: coding mode {coding_mode} \
         cannot pair with fold mode {fold_mode}"
    )]
    IncompatibleModes {
        /// The offending configuration's coded field.
        coded_field: String,
        /// The declared coding mode (string form).
        coding_mode: String,
        /// The declared fold mode (string form).
        fold_mode: String,
    },

    /// A raw field's fold mode must be concatenate or assert-equal.
    #[error(
        "plan {raw_field:?}: raw field fold mode must be concatenate or \
         assert_equal, got {fold_mode}"
    )]
    InvalidRawFieldFoldMode {
        /// The offending plan's raw field.
        raw_field: String,
        /// The declared fold mode (string form).
        fold_mode: String,
    },

    /// A plan must declare at least one coding configuration.
    #[error("plan {raw_field:?}: declares no coding configurations")]
    EmptyPlan {
        /// The offending plan's raw field.
        raw_field: String,
    },

    /// Manifest resolution collected one or more errors.
    #[error("invalid plan manifest:\n{}", errors.join("\n"))]
    InvalidManifest {
        /// Every problem found, so one run reports them all.
        errors: Vec<String>,
    },

    /// Pipeline configuration is structurally invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidPipelineConfig(String),

    /// Configuration file could not be parsed.
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
