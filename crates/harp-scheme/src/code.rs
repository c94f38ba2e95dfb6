//! # Code — One Taxonomy Entry
//!
//! A code is a single classification outcome: a short stable id, the
//! label written to analysis exports, and the free-text match values that
//! resolve raw answers to it. Control codes additionally carry one of the
//! reserved [`ControlCode`] meanings.

use harp_core::ControlCode;
use serde::{Deserialize, Serialize};

/// Whether a code is a substantive classification or a reserved marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    /// A substantive classification (an actual answer category).
    Normal,
    /// A reserved marker carrying a [`ControlCode`] meaning.
    Control,
}

/// One entry in a code scheme.
///
/// The taxonomy-file representation is exactly this struct; schemes
/// validate the cross-field invariants (`control_code` present iff
/// `code_type` is `Control`, uniqueness of ids/match values/string
/// values) at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    /// Unique (within the scheme) stable identifier, e.g. `code-gender-f`.
    pub code_id: String,
    /// Substantive or control.
    pub code_type: CodeType,
    /// The reserved meaning, for control codes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_code: Option<ControlCode>,
    /// Label written to analysis exports (and suffixed onto matrix
    /// column names for multi-coded fields).
    pub string_value: String,
    /// Human-readable display text for the manual-coding tool.
    #[serde(default)]
    pub display_text: String,
    /// Free-text values resolved to this code, matched case-insensitively.
    #[serde(default)]
    pub match_values: Vec<String>,
}

impl Code {
    /// Create a substantive code.
    pub fn normal(
        code_id: impl Into<String>,
        string_value: impl Into<String>,
        match_values: Vec<String>,
    ) -> Self {
        let string_value = string_value.into();
        Self {
            code_id: code_id.into(),
            code_type: CodeType::Normal,
            control_code: None,
            display_text: string_value.clone(),
            string_value,
            match_values,
        }
    }

    /// Create a control code. The string value is the control code's
    /// short form, matching export conventions.
    pub fn control(code_id: impl Into<String>, control: ControlCode) -> Self {
        Self {
            code_id: code_id.into(),
            code_type: CodeType::Control,
            control_code: Some(control),
            string_value: control.as_str().to_string(),
            display_text: control.as_str().to_string(),
            match_values: Vec::new(),
        }
    }

    /// Whether this code carries the given control meaning.
    pub fn is_control(&self, control: ControlCode) -> bool {
        self.control_code == Some(control)
    }
}
