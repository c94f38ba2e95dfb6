//! # Label — An Applied Code
//!
//! A label is the act of applying one code to one record field: which
//! scheme and code, who applied it (a cleaner or a human coder), when,
//! and whether a human verified it.
//!
//! Coded fields in a [`TracedRecord`](harp_core::TracedRecord) hold label
//! values: one label for single-coded fields, a list for multi-coded
//! fields. Labels serialize as plain JSON objects so they round-trip
//! through record stage files and coded-file imports unchanged.

use harp_core::{HarpError, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::code::Code;
use crate::scheme::CodeScheme;

/// One applied code: scheme, code, origin, time, verification flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Id of the scheme the code belongs to.
    pub scheme_id: String,
    /// Version of the scheme at application time.
    pub scheme_version: String,
    /// Id of the applied code.
    pub code_id: String,
    /// Who applied the label: a cleaner identity or a coder identity.
    pub origin: String,
    /// When the label was applied.
    pub date_time: Timestamp,
    /// Whether a human verified this label (true for manual-coding-tool
    /// imports, false for automatic cleaners).
    pub checked: bool,
}

impl Label {
    /// Apply `code` from `scheme` with the given origin.
    pub fn from_code(
        scheme: &CodeScheme,
        code: &Code,
        origin: impl Into<String>,
        checked: bool,
    ) -> Self {
        Self {
            scheme_id: scheme.scheme_id().to_string(),
            scheme_version: scheme.version().to_string(),
            code_id: code.code_id.clone(),
            origin: origin.into(),
            date_time: Timestamp::now(),
            checked,
        }
    }

    /// Serialize to the JSON value stored in a record field.
    ///
    /// # Errors
    ///
    /// Returns [`HarpError::Serialization`] if serialization fails, which
    /// cannot happen for a well-formed label.
    pub fn to_value(&self) -> Result<Value, HarpError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse a label back out of a record field value.
    pub fn from_value(value: &Value) -> Result<Self, HarpError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Parse a list of labels out of a multi-coded record field value.
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>, HarpError> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_core::ControlCode;

    fn scheme() -> CodeScheme {
        CodeScheme::new(
            "Scheme-gender",
            "gender",
            "0.1",
            vec![
                Code::normal("code-gender-f", "female", vec!["female".to_string()]),
                Code::control("code-NA", ControlCode::TrueMissing),
            ],
        )
        .unwrap()
    }

    #[test]
    fn from_code_captures_scheme_identity() {
        let scheme = scheme();
        let code = scheme.code_with_id("code-gender-f").unwrap();
        let label = Label::from_code(&scheme, code, "cleaners/gender", false);
        assert_eq!(label.scheme_id, "Scheme-gender");
        assert_eq!(label.scheme_version, "0.1");
        assert_eq!(label.code_id, "code-gender-f");
        assert!(!label.checked);
    }

    #[test]
    fn value_roundtrip() {
        let scheme = scheme();
        let code = scheme.code_with_id("code-NA").unwrap();
        let label = Label::from_code(&scheme, code, "auto_code", false);
        let value = label.to_value().unwrap();
        let parsed = Label::from_value(&value).unwrap();
        assert_eq!(label, parsed);
    }

    #[test]
    fn list_roundtrip() {
        let scheme = scheme();
        let code = scheme.code_with_id("code-gender-f").unwrap();
        let labels = vec![
            Label::from_code(&scheme, code, "coder-a", true),
            Label::from_code(&scheme, code, "coder-b", true),
        ];
        let value = serde_json::to_value(&labels).unwrap();
        let parsed = Label::list_from_value(&value).unwrap();
        assert_eq!(labels, parsed);
    }
}
