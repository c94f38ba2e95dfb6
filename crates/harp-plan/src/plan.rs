//! # Coding Plan
//!
//! Groups one raw input field with its coding configurations and the
//! metadata needed for the manual-coding round trip: the per-message id
//! field, the optional time field, and the coded/ICR filenames.

use crate::coding::FoldMode;
use crate::config::CodingConfiguration;
use crate::error::PlanError;

/// One raw field and everything the pipeline does with it.
#[derive(Debug, Clone)]
pub struct CodingPlan {
    raw_field: String,
    id_field: String,
    time_field: Option<String>,
    coded_file: String,
    icr_file: Option<String>,
    raw_field_fold_mode: FoldMode,
    coding_configurations: Vec<CodingConfiguration>,
}

impl CodingPlan {
    /// Create a plan.
    ///
    /// The per-message id field defaults to `{raw_field}_id`.
    ///
    /// # Errors
    ///
    /// - [`PlanError::EmptyPlan`] when no configurations are given.
    /// - [`PlanError::InvalidRawFieldFoldMode`] when the raw field's fold
    ///   mode is not `Concatenate` or `AssertEqual` (raw text never folds
    ///   as a boolean or a matrix).
    pub fn new(
        raw_field: impl Into<String>,
        coded_file: impl Into<String>,
        raw_field_fold_mode: FoldMode,
        coding_configurations: Vec<CodingConfiguration>,
    ) -> Result<Self, PlanError> {
        let raw_field = raw_field.into();

        if coding_configurations.is_empty() {
            return Err(PlanError::EmptyPlan { raw_field });
        }
        match raw_field_fold_mode {
            FoldMode::Concatenate | FoldMode::AssertEqual => {}
            FoldMode::BooleanOr | FoldMode::MatrixUnion => {
                return Err(PlanError::InvalidRawFieldFoldMode {
                    raw_field,
                    fold_mode: raw_field_fold_mode.as_str().to_string(),
                });
            }
        }

        let id_field = format!("{raw_field}_id");
        Ok(Self {
            raw_field,
            id_field,
            time_field: None,
            coded_file: coded_file.into(),
            icr_file: None,
            raw_field_fold_mode,
            coding_configurations,
        })
    }

    /// Override the per-message id field.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Set the record key carrying the message sent-on time.
    pub fn with_time_field(mut self, time_field: impl Into<String>) -> Self {
        self.time_field = Some(time_field.into());
        self
    }

    /// Set the ICR sample export filename.
    pub fn with_icr_file(mut self, icr_file: impl Into<String>) -> Self {
        self.icr_file = Some(icr_file.into());
        self
    }

    /// The raw input field this plan covers.
    pub fn raw_field(&self) -> &str {
        &self.raw_field
    }

    /// The per-message id field keying the manual-coding round trip.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// The record key carrying the sent-on time, if any.
    pub fn time_field(&self) -> Option<&str> {
        self.time_field.as_deref()
    }

    /// Filename of the external coding tool's coded file for this plan.
    pub fn coded_file(&self) -> &str {
        &self.coded_file
    }

    /// Filename of the ICR sample export, if this plan is ICR-sampled.
    pub fn icr_file(&self) -> Option<&str> {
        self.icr_file.as_deref()
    }

    /// How the raw field folds (concatenate or assert-equal only).
    pub fn raw_field_fold_mode(&self) -> FoldMode {
        self.raw_field_fold_mode
    }

    /// The coded fields of this plan, in declaration order.
    pub fn coding_configurations(&self) -> &[CodingConfiguration] {
        &self.coding_configurations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::CodingMode;
    use harp_core::ControlCode;
    use harp_scheme::{Code, CodeScheme};
    use std::sync::Arc;

    fn config(coded_field: &str) -> CodingConfiguration {
        let scheme = Arc::new(
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
        );
        CodingConfiguration::new(coded_field, CodingMode::Single, FoldMode::AssertEqual, scheme)
            .unwrap()
    }

    #[test]
    fn id_field_defaults_to_raw_field_suffix() {
        let plan = CodingPlan::new(
            "gender_raw",
            "gender.json",
            FoldMode::AssertEqual,
            vec![config("gender_coded")],
        )
        .unwrap();
        assert_eq!(plan.id_field(), "gender_raw_id");
    }

    #[test]
    fn id_field_override() {
        let plan = CodingPlan::new(
            "gender_raw",
            "gender.json",
            FoldMode::AssertEqual,
            vec![config("gender_coded")],
        )
        .unwrap()
        .with_id_field("gender_message_id");
        assert_eq!(plan.id_field(), "gender_message_id");
    }

    #[test]
    fn rejects_empty_configuration_list() {
        assert!(matches!(
            CodingPlan::new("gender_raw", "gender.json", FoldMode::AssertEqual, vec![]),
            Err(PlanError::EmptyPlan { .. })
        ));
    }

    #[test]
    fn rejects_boolean_or_matrix_raw_fold() {
        for mode in [FoldMode::BooleanOr, FoldMode::MatrixUnion] {
            assert!(matches!(
                CodingPlan::new("f_raw", "f.json", mode, vec![config("f_coded")]),
                Err(PlanError::InvalidRawFieldFoldMode { .. })
            ));
        }
    }
}
