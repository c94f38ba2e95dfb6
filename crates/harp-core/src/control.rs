//! # Control Codes — Single Source of Truth
//!
//! Defines the [`ControlCode`] enum with the five reserved code meanings
//! used throughout the pipeline. This is the ONE definition used across
//! the entire workspace. Every `match` on `ControlCode` must be exhaustive —
//! adding a control code forces every consumer to handle it at compile time.
//!
//! Control codes are distinct from substantive classification codes: they
//! mark data states (missing, not codeable, miscoded, consent withdrawn)
//! rather than answers. The short forms (`STOP`, `NC`, `NA`, `CE`, `WS`)
//! are the wire format everywhere: taxonomy files, coded-file imports,
//! and analysis exports.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::HarpError;

/// Exported cell value for a matrix column that is set.
pub const MATRIX_1: &str = "1";
/// Exported cell value for a matrix column that is not set.
pub const MATRIX_0: &str = "0";
/// Exported boolean true value.
pub const TRUE: &str = "true";
/// Exported boolean false value.
pub const FALSE: &str = "false";
/// Folded value for a tri-state boolean key whose group disagreed.
pub const AMBIVALENT: &str = "ambivalent";

/// The reserved control-code meanings.
///
/// | Code | Short form | Meaning |
/// |------|-----------|---------|
/// | `Stop` | `STOP` | Respondent withdrew consent |
/// | `NotCoded` | `NC` | Present but could not be classified |
/// | `TrueMissing` | `NA` | Raw field entirely absent |
/// | `CodingError` | `CE` | Message was miscategorised upstream |
/// | `WrongScheme` | `WS` | Manual coder moved the message to a different dataset |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCode {
    /// Consent withdrawal. Terminal: propagates to every exportable field.
    Stop,
    /// Present but not classifiable (empty string, noise, unparseable).
    NotCoded,
    /// The raw field was never present on the record.
    TrueMissing,
    /// The record's codes were discarded because the message was
    /// miscategorised upstream.
    CodingError,
    /// Marker applied by manual coders when a message belongs to a
    /// different raw field ("withdrawal of service" in coder parlance).
    WrongScheme,
}

/// Total number of control codes. Used for exhaustiveness assertions.
pub const CONTROL_CODE_COUNT: usize = 5;

impl ControlCode {
    /// Returns all control codes in canonical order.
    pub fn all() -> &'static [ControlCode] {
        &[
            Self::Stop,
            Self::NotCoded,
            Self::TrueMissing,
            Self::CodingError,
            Self::WrongScheme,
        ]
    }

    /// Returns the short-form identifier used in exports and taxonomy files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::NotCoded => "NC",
            Self::TrueMissing => "NA",
            Self::CodingError => "CE",
            Self::WrongScheme => "WS",
        }
    }
}

impl std::fmt::Display for ControlCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlCode {
    type Err = HarpError;

    /// Parse a control code from its short-form identifier.
    ///
    /// Accepts the same identifiers produced by [`ControlCode::as_str()`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOP" => Ok(Self::Stop),
            "NC" => Ok(Self::NotCoded),
            "NA" => Ok(Self::TrueMissing),
            "CE" => Ok(Self::CodingError),
            "WS" => Ok(Self::WrongScheme),
            other => Err(HarpError::Validation(format!(
                "unknown control code: {other:?}"
            ))),
        }
    }
}

impl Serialize for ControlCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ControlCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
