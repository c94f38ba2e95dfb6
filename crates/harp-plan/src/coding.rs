//! # Coding & Fold Modes — Closed Variant Types
//!
//! The two mode enums that drive the engine. Both are closed: dispatch is
//! an exhaustive `match` in the fold engine, so adding a mode is a compile
//! error until every consumer handles it. No string comparison of modes
//! happens anywhere outside (de)serialization.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use harp_core::HarpError;

/// How many codes a coded field holds per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodingMode {
    /// Exactly one code per record (one label).
    Single,
    /// A set of codes per record (a label list, exported as a one-hot
    /// matrix of columns).
    Multiple,
}

impl CodingMode {
    /// Returns the snake_case identifier, matching the serde format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

impl std::fmt::Display for CodingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field's values combine when the per-message records of one
/// respondent fold into a single per-respondent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldMode {
    /// All non-absent values in the group must be identical; a
    /// disagreement is a fatal consistency error.
    AssertEqual,
    /// Tri-state boolean: true if any record is true, false only if all
    /// are false, ambivalent otherwise.
    BooleanOr,
    /// Join non-empty values in fold order with a single space.
    Concatenate,
    /// Per-column logical OR over the one-hot matrix of a multi-coded
    /// field.
    MatrixUnion,
}

impl FoldMode {
    /// Returns all fold modes in canonical order.
    pub fn all() -> &'static [FoldMode] {
        &[
            Self::AssertEqual,
            Self::BooleanOr,
            Self::Concatenate,
            Self::MatrixUnion,
        ]
    }

    /// Returns the snake_case identifier, matching the serde format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssertEqual => "assert_equal",
            Self::BooleanOr => "boolean_or",
            Self::Concatenate => "concatenate",
            Self::MatrixUnion => "matrix_union",
        }
    }
}

impl std::fmt::Display for FoldMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoldMode {
    type Err = HarpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assert_equal" => Ok(Self::AssertEqual),
            "boolean_or" => Ok(Self::BooleanOr),
            "concatenate" => Ok(Self::Concatenate),
            "matrix_union" => Ok(Self::MatrixUnion),
            other => Err(HarpError::Validation(format!(
                "unknown fold mode: {other:?}"
            ))),
        }
    }
}
