//! # Coding Configuration
//!
//! Binds one code scheme to one coded field under a coding mode and a
//! fold mode. The mode pairing is validated at construction: multi-coded
//! fields always fold as a matrix union; single-coded fields fold by any
//! of the other three strategies.

use std::sync::Arc;

use harp_scheme::CodeScheme;

use crate::coding::{CodingMode, FoldMode};
use crate::error::PlanError;

/// One coded field: its scheme, coding mode, fold mode, optional export
/// key, and optional automatic cleaner.
#[derive(Debug, Clone)]
pub struct CodingConfiguration {
    coded_field: String,
    coding_mode: CodingMode,
    fold_mode: FoldMode,
    analysis_file_key: Option<String>,
    cleaner: Option<String>,
    scheme: Arc<CodeScheme>,
}

impl CodingConfiguration {
    /// Create a configuration, validating the mode pairing.
    ///
    /// # Errors
    ///
    /// [`PlanError::IncompatibleModes`] when `Multiple` is paired with
    /// anything but `MatrixUnion`, or `Single` with `MatrixUnion`.
    pub fn new(
        coded_field: impl Into<String>,
        coding_mode: CodingMode,
        fold_mode: FoldMode,
        scheme: Arc<CodeScheme>,
    ) -> Result<Self, PlanError> {
        let coded_field = coded_field.into();

        let compatible = match coding_mode {
            CodingMode::Multiple => fold_mode == FoldMode::MatrixUnion,
            CodingMode::Single => fold_mode != FoldMode::MatrixUnion,
        };
        if !compatible {
            return Err(PlanError::IncompatibleModes {
                coded_field,
                coding_mode: coding_mode.as_str().to_string(),
                fold_mode: fold_mode.as_str().to_string(),
            });
        }

        Ok(Self {
            coded_field,
            coding_mode,
            fold_mode,
            analysis_file_key: None,
            cleaner: None,
            scheme,
        })
    }

    /// Set the analysis-export key. Configurations without one are coded
    /// and folded but not exported.
    pub fn with_analysis_file_key(mut self, key: impl Into<String>) -> Self {
        self.analysis_file_key = Some(key.into());
        self
    }

    /// Attach an automatic cleaner by registry name.
    pub fn with_cleaner(mut self, cleaner: impl Into<String>) -> Self {
        self.cleaner = Some(cleaner.into());
        self
    }

    /// The record key the coded label(s) are written to.
    pub fn coded_field(&self) -> &str {
        &self.coded_field
    }

    /// Single or multiple coding.
    pub fn coding_mode(&self) -> CodingMode {
        self.coding_mode
    }

    /// The fold strategy for this field.
    pub fn fold_mode(&self) -> FoldMode {
        self.fold_mode
    }

    /// The analysis-export key, if this field is exported.
    pub fn analysis_file_key(&self) -> Option<&str> {
        self.analysis_file_key.as_deref()
    }

    /// The registry name of the automatic cleaner, if any.
    pub fn cleaner(&self) -> Option<&str> {
        self.cleaner.as_deref()
    }

    /// The scheme this field is coded against.
    pub fn scheme(&self) -> &CodeScheme {
        &self.scheme
    }

    /// Shared handle to the scheme.
    pub fn scheme_arc(&self) -> Arc<CodeScheme> {
        Arc::clone(&self.scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_core::ControlCode;
    use harp_scheme::Code;

    fn scheme() -> Arc<CodeScheme> {
        Arc::new(
            CodeScheme::new(
                "Scheme-test",
                "test",
                "0.1",
                vec![
                    Code::normal("code-a", "a", vec!["a".to_string()]),
                    Code::control("code-NA", ControlCode::TrueMissing),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn single_pairs_with_non_matrix_modes() {
        for fold_mode in [
            FoldMode::AssertEqual,
            FoldMode::BooleanOr,
            FoldMode::Concatenate,
        ] {
            assert!(CodingConfiguration::new(
                "field_coded",
                CodingMode::Single,
                fold_mode,
                scheme(),
            )
            .is_ok());
        }
    }

    #[test]
    fn multiple_requires_matrix_union() {
        assert!(CodingConfiguration::new(
            "field_coded",
            CodingMode::Multiple,
            FoldMode::MatrixUnion,
            scheme(),
        )
        .is_ok());

        assert!(matches!(
            CodingConfiguration::new(
                "field_coded",
                CodingMode::Multiple,
                FoldMode::AssertEqual,
                scheme(),
            ),
            Err(PlanError::IncompatibleModes { .. })
        ));
    }

    #[test]
    fn single_rejects_matrix_union() {
        assert!(matches!(
            CodingConfiguration::new(
                "field_coded",
                CodingMode::Single,
                FoldMode::MatrixUnion,
                scheme(),
            ),
            Err(PlanError::IncompatibleModes { .. })
        ));
    }

    #[test]
    fn builder_setters() {
        let cc = CodingConfiguration::new(
            "gender_coded",
            CodingMode::Single,
            FoldMode::AssertEqual,
            scheme(),
        )
        .unwrap()
        .with_analysis_file_key("gender")
        .with_cleaner("gender");
        assert_eq!(cc.analysis_file_key(), Some("gender"));
        assert_eq!(cc.cleaner(), Some("gender"));
    }
}
