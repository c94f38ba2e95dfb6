//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers that partition and key
//! pipeline data. Each identifier is a distinct type — you cannot pass a
//! [`MessageId`] where a [`RespondentId`] is expected.
//!
//! ## Validation
//!
//! Both identifiers validate at construction time and deserialize through
//! their constructors, so invalid values are rejected at the file boundary
//! rather than silently accepted into a record set.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::HarpError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// The stable, opaque respondent identifier — the `uid` field of a record.
///
/// Respondent identifiers come from the uuid table that anonymises phone
/// numbers before data enters the pipeline. The pipeline treats them as
/// opaque: the only requirements are non-emptiness and no interior
/// whitespace (a uid is a single token in every file format it crosses).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RespondentId(String);

impl_validating_deserialize!(RespondentId);

impl RespondentId {
    /// Create a respondent identifier, validating shape.
    ///
    /// # Errors
    ///
    /// Returns [`HarpError::Validation`] if the value is empty or contains
    /// whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, HarpError> {
        let s = value.into();
        if s.is_empty() {
            return Err(HarpError::Validation(
                "respondent id must be non-empty".to_string(),
            ));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(HarpError::Validation(format!(
                "respondent id must not contain whitespace: {s:?}"
            )));
        }
        Ok(Self(s))
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RespondentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deterministic per-message identifier, keying the round trip to the
/// external manual-coding tool.
///
/// Derived as the lowercase hex SHA-256 over the respondent id, the raw
/// field name, the raw value, and the sent-on time. Deterministic so that
/// a re-run of the pipeline produces ids matching a previously exported
/// coded file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MessageId(String);

impl_validating_deserialize!(MessageId);

impl MessageId {
    /// Create a message identifier from an existing 64-char hex string.
    ///
    /// # Errors
    ///
    /// Returns [`HarpError::Validation`] if the value is not 64 lowercase
    /// hex characters.
    pub fn new(value: impl Into<String>) -> Result<Self, HarpError> {
        let s = value.into();
        let valid = s.len() == 64
            && s.chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !valid {
            return Err(HarpError::Validation(format!(
                "message id must be 64 lowercase hex chars: {s:?}"
            )));
        }
        Ok(Self(s))
    }

    /// Derive a message identifier from its identity parts.
    ///
    /// `time` is the ISO 8601 sent-on value, or the empty string when the
    /// plan has no time field.
    pub fn derive(uid: &str, raw_field: &str, raw_value: &str, time: &str) -> Self {
        let mut hasher = Sha256::new();
        // Length-prefix each part so concatenation is unambiguous.
        for part in [uid, raw_field, raw_value, time] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
