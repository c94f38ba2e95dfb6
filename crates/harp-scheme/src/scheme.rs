//! # Code Scheme — Closed, Immutable Taxonomy
//!
//! A [`CodeScheme`] is the validated, immutable set of codes for one
//! classification dimension, with lookup indices by code id, control
//! code, and lowercased match value.
//!
//! ## Lifecycle
//!
//! Loaded once at startup from a JSON taxonomy definition file (one file
//! per scheme), validated completely, then read-only for the life of the
//! run. There are no mutation operations — the indices cannot drift from
//! the code list.
//!
//! ## Failure Semantics
//!
//! Every lookup returns `Result`, and a miss is fatal to the run: schemes
//! are closed, so an unknown id/control/match value means broken
//! configuration or logic, not bad survey data.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use harp_core::ControlCode;
use serde::{Deserialize, Serialize};

use crate::code::{Code, CodeType};
use crate::error::SchemeError;

/// On-disk shape of a taxonomy definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemeFile {
    scheme_id: String,
    name: String,
    #[serde(default)]
    version: String,
    codes: Vec<Code>,
}

/// A closed, immutable collection of [`Code`]s with lookup indices.
#[derive(Debug, Clone)]
pub struct CodeScheme {
    scheme_id: String,
    name: String,
    version: String,
    codes: Vec<Code>,
    by_id: HashMap<String, usize>,
    by_control: HashMap<ControlCode, usize>,
    by_match_value: HashMap<String, usize>,
}

impl CodeScheme {
    /// Construct a scheme, validating every invariant:
    ///
    /// - at least one code;
    /// - code ids unique;
    /// - `control_code` present iff `code_type` is control;
    /// - at most one code per distinct control code;
    /// - match values unique case-insensitively across the scheme;
    /// - string values unique (they name matrix columns).
    pub fn new(
        scheme_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        codes: Vec<Code>,
    ) -> Result<Self, SchemeError> {
        let scheme_id = scheme_id.into();
        let name = name.into();
        let version = version.into();

        if codes.is_empty() {
            return Err(SchemeError::EmptyScheme { scheme: scheme_id });
        }

        let mut by_id = HashMap::new();
        let mut by_control = HashMap::new();
        let mut by_match_value = HashMap::new();
        let mut string_values = HashMap::new();

        for (index, code) in codes.iter().enumerate() {
            if by_id.insert(code.code_id.clone(), index).is_some() {
                return Err(SchemeError::DuplicateCodeId {
                    scheme: scheme_id,
                    code_id: code.code_id.clone(),
                });
            }

            match (code.code_type, code.control_code) {
                (CodeType::Control, Some(control)) => {
                    if by_control.insert(control, index).is_some() {
                        return Err(SchemeError::DuplicateControlCode {
                            scheme: scheme_id,
                            control,
                        });
                    }
                }
                (CodeType::Normal, None) => {}
                _ => {
                    return Err(SchemeError::ControlCodeMismatch {
                        scheme: scheme_id,
                        code_id: code.code_id.clone(),
                    });
                }
            }

            for match_value in &code.match_values {
                let lowered = match_value.to_lowercase();
                if by_match_value.insert(lowered.clone(), index).is_some() {
                    return Err(SchemeError::DuplicateMatchValue {
                        scheme: scheme_id,
                        value: lowered,
                    });
                }
            }

            if string_values
                .insert(code.string_value.clone(), index)
                .is_some()
            {
                return Err(SchemeError::DuplicateStringValue {
                    scheme: scheme_id,
                    value: code.string_value.clone(),
                });
            }
        }

        Ok(Self {
            scheme_id,
            name,
            version,
            codes,
            by_id,
            by_control,
            by_match_value,
        })
    }

    /// Load and validate a scheme from a JSON taxonomy definition file.
    pub fn load(path: &Path) -> Result<Self, SchemeError> {
        let raw = fs::read_to_string(path)?;
        let scheme = Self::from_json_str(&raw)?;
        tracing::debug!(
            scheme_id = %scheme.scheme_id,
            codes = scheme.codes.len(),
            path = %path.display(),
            "loaded code scheme"
        );
        Ok(scheme)
    }

    /// Parse and validate a scheme from taxonomy-file JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, SchemeError> {
        let file: SchemeFile = serde_json::from_str(raw)?;
        Self::new(file.scheme_id, file.name, file.version, file.codes)
    }

    /// The scheme's stable identifier.
    pub fn scheme_id(&self) -> &str {
        &self.scheme_id
    }

    /// The scheme's human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scheme's version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The codes in declaration order.
    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// Look up a code by id.
    ///
    /// # Errors
    ///
    /// [`SchemeError::UnknownCodeId`] — fatal; schemes are closed.
    pub fn code_with_id(&self, code_id: &str) -> Result<&Code, SchemeError> {
        self.by_id
            .get(code_id)
            .map(|&i| &self.codes[i])
            .ok_or_else(|| SchemeError::UnknownCodeId {
                scheme: self.scheme_id.clone(),
                code_id: code_id.to_string(),
            })
    }

    /// Look up the code carrying a control meaning.
    ///
    /// # Errors
    ///
    /// [`SchemeError::UnknownControlCode`] — fatal; schemes are closed.
    pub fn code_with_control_code(
        &self,
        control: ControlCode,
    ) -> Result<&Code, SchemeError> {
        self.by_control
            .get(&control)
            .map(|&i| &self.codes[i])
            .ok_or_else(|| SchemeError::UnknownControlCode {
                scheme: self.scheme_id.clone(),
                control,
            })
    }

    /// Resolve a free-text value to a code, case-insensitively.
    ///
    /// # Errors
    ///
    /// [`SchemeError::UnknownMatchValue`] — fatal; schemes are closed.
    pub fn code_with_match_value(&self, text: &str) -> Result<&Code, SchemeError> {
        let lowered = text.to_lowercase();
        self.by_match_value
            .get(&lowered)
            .map(|&i| &self.codes[i])
            .ok_or_else(|| SchemeError::UnknownMatchValue {
                scheme: self.scheme_id.clone(),
                value: lowered,
            })
    }

    /// Whether the scheme defines a code for the given control meaning.
    pub fn has_control_code(&self, control: ControlCode) -> bool {
        self.by_control.contains_key(&control)
    }
}
