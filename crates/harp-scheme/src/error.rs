//! # Scheme Errors
//!
//! Scheme construction and lookup failures. All fatal: schemes are closed
//! and validated at load time, so any miss downstream is a bug in
//! configuration or logic, never in the survey data.

use harp_core::ControlCode;
use thiserror::Error;

/// Errors from scheme loading, validation, and lookup.
#[derive(Error, Debug)]
pub enum SchemeError {
    /// Two codes in one scheme share a code id.
    #[error("scheme {scheme}: duplicate code id {code_id:?}")]
    DuplicateCodeId {
        /// Scheme being validated.
        scheme: String,
        /// The repeated code id.
        code_id: String,
    },

    /// Two codes in one scheme share a control code.
    #[error("scheme {scheme}: duplicate control code {control}")]
    DuplicateControlCode {
        /// Scheme being validated.
        scheme: String,
        /// The repeated control code.
        control: ControlCode,
    },

    /// Two codes in one scheme share a match value (case-insensitive).
    #[error("scheme {scheme}: duplicate match value {value:?}")]
    DuplicateMatchValue {
        /// Scheme being validated.
        scheme: String,
        /// The repeated match value, lowercased.
        value: String,
    },

    /// Two codes in one scheme share a string value, which would collide
    /// in matrix column names.
    #[error("scheme {scheme}: duplicate string value {value:?}")]
    DuplicateStringValue {
        /// Scheme being validated.
        scheme: String,
        /// The repeated string value.
        value: String,
    },

    /// A code's type and control-code presence disagree.
    #[error(
        "scheme {scheme}: code {code_id:?} must carry a control code iff its type is control"
    )]
    ControlCodeMismatch {
        /// Scheme being validated.
        scheme: String,
        /// The inconsistent code.
        code_id: String,
    },

    /// A scheme must contain at least one code.
    #[error("scheme {scheme}: contains no codes")]
    EmptyScheme {
        /// Scheme being validated.
        scheme: String,
    },

    /// No code in the scheme has the requested id.
    #[error("scheme {scheme}: no code with id {code_id:?}")]
    UnknownCodeId {
        /// Scheme queried.
        scheme: String,
        /// The missing code id.
        code_id: String,
    },

    /// No code in the scheme has the requested control code.
    #[error("scheme {scheme}: no code with control code {control}")]
    UnknownControlCode {
        /// Scheme queried.
        scheme: String,
        /// The missing control code.
        control: ControlCode,
    },

    /// No code in the scheme matches the requested match value.
    #[error("scheme {scheme}: no code with match value {value:?}")]
    UnknownMatchValue {
        /// Scheme queried.
        scheme: String,
        /// The unmatched value, lowercased.
        value: String,
    },

    /// Taxonomy file could not be parsed.
    #[error("taxonomy parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Taxonomy file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
