//! # Engine Errors
//!
//! Failures raised by the pipeline phases. The fold consistency violation
//! is the load-bearing one: it aborts the run and must name the fold
//! group, the key, and both conflicting values so an operator can fix the
//! upstream data or configuration and re-run from scratch.

use thiserror::Error;

/// Errors from the coding-and-folding engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Two records in one fold group disagree on an assert-equal key.
    /// Signals an upstream data or configuration bug; never recoverable.
    #[error(
        "fold group {group_id:?}: assert-equal key {key:?} has conflicting \
         values {left:?} and {right:?}"
    )]
    ValueConflict {
        /// The fold group (respondent) id.
        group_id: String,
        /// The disagreeing key.
        key: String,
        /// First value seen.
        left: String,
        /// The conflicting value.
        right: String,
    },

    /// A record reached the fold without a respondent id.
    #[error("record at position {position} has no uid; cannot fold")]
    MissingUid {
        /// Index of the record in the fold input.
        position: usize,
    },

    /// Two activation platform keys are present on one record; the show
    /// a message belongs to would be ambiguous.
    #[error(
        "record at position {position}: multiple activation keys present \
         ({first:?} and {second:?})"
    )]
    AmbiguousActivationMessage {
        /// Index of the record in the stage input.
        position: usize,
        /// The first matching platform key.
        first: String,
        /// The second matching platform key.
        second: String,
    },

    /// A coding configuration references a cleaner the registry does not
    /// provide.
    #[error("coding configuration {coded_field:?}: unknown cleaner {name:?}")]
    UnknownCleaner {
        /// The cleaner registry name.
        name: String,
        /// The configuration that referenced it.
        coded_field: String,
    },

    /// A coded file from the external coding tool is malformed.
    #[error("coded file {file:?}: {reason}")]
    CodedFile {
        /// The file being imported.
        file: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A record field that should hold label data does not parse.
    #[error("record field {key:?}: {source}")]
    MalformedField {
        /// The unparseable record key.
        key: String,
        /// The underlying parse failure.
        source: harp_core::HarpError,
    },

    /// A scheme lookup failed (fatal; schemes are closed).
    #[error(transparent)]
    Scheme(#[from] harp_scheme::SchemeError),

    /// A core validation failure (timestamps, identifiers).
    #[error(transparent)]
    Core(#[from] harp_core::HarpError),

    /// IO error reading or writing a stage file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error in a stage file.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
