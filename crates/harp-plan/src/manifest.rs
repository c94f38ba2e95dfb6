//! # Plan Manifest — Project Plan Declarations
//!
//! The plan manifest is the JSON file declaring a project's coding plans:
//! the radio-question-answer (RQA) plans for each episode's raw field and
//! the survey plans for demographics. At startup the manifest is resolved
//! against a scheme directory — every referenced taxonomy file is loaded
//! and validated, every mode pairing is checked — and the result is an
//! immutable [`PlanSet`] handed to the rest of the pipeline.
//!
//! Resolution collects every problem it finds before failing, so one run
//! reports all manifest errors rather than the first.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use harp_scheme::CodeScheme;
use serde::Deserialize;

use crate::coding::{CodingMode, FoldMode};
use crate::config::CodingConfiguration;
use crate::error::PlanError;
use crate::plan::CodingPlan;

/// On-disk declaration of one coding configuration.
#[derive(Debug, Clone, Deserialize)]
struct ConfigDecl {
    coded_field: String,
    scheme_file: String,
    coding_mode: CodingMode,
    fold_mode: FoldMode,
    #[serde(default)]
    analysis_file_key: Option<String>,
    #[serde(default)]
    cleaner: Option<String>,
}

/// On-disk declaration of one coding plan.
#[derive(Debug, Clone, Deserialize)]
struct PlanDecl {
    raw_field: String,
    #[serde(default)]
    id_field: Option<String>,
    #[serde(default)]
    time_field: Option<String>,
    coded_file: String,
    #[serde(default)]
    icr_file: Option<String>,
    raw_field_fold_mode: FoldMode,
    coding_configurations: Vec<ConfigDecl>,
}

/// On-disk shape of the plan manifest file.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanManifest {
    #[serde(default)]
    rqa_plans: Vec<PlanDecl>,
    #[serde(default)]
    survey_plans: Vec<PlanDecl>,
}

/// The resolved, validated plans for one run.
#[derive(Debug, Clone)]
pub struct PlanSet {
    rqa: Vec<CodingPlan>,
    survey: Vec<CodingPlan>,
}

impl PlanSet {
    /// Build a plan set from already-constructed plans (tests, embedded
    /// projects).
    pub fn new(rqa: Vec<CodingPlan>, survey: Vec<CodingPlan>) -> Self {
        Self { rqa, survey }
    }

    /// The radio-question-answer plans, in declaration order.
    pub fn rqa(&self) -> &[CodingPlan] {
        &self.rqa
    }

    /// The survey (demographic) plans, in declaration order.
    pub fn survey(&self) -> &[CodingPlan] {
        &self.survey
    }

    /// All plans: RQA first, then survey — the order every phase and the
    /// export header follow.
    pub fn all(&self) -> impl Iterator<Item = &CodingPlan> {
        self.rqa.iter().chain(self.survey.iter())
    }
}

impl PlanManifest {
    /// Parse a manifest from a JSON file (no scheme resolution yet).
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Parse a manifest from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Resolve the manifest against a scheme directory.
    ///
    /// Loads every referenced taxonomy file once (plans may share
    /// schemes), constructs every plan, and checks cross-plan uniqueness
    /// of coded fields and analysis keys.
    ///
    /// # Errors
    ///
    /// [`PlanError::InvalidManifest`] carrying every problem found.
    pub fn resolve(&self, scheme_dir: &Path) -> Result<PlanSet, PlanError> {
        let mut errors = Vec::new();
        let mut scheme_cache: HashMap<String, Arc<CodeScheme>> = HashMap::new();

        let mut load_scheme = |file: &str, errors: &mut Vec<String>| {
            if let Some(scheme) = scheme_cache.get(file) {
                return Some(Arc::clone(scheme));
            }
            match CodeScheme::load(&scheme_dir.join(file)) {
                Ok(scheme) => {
                    let scheme = Arc::new(scheme);
                    scheme_cache.insert(file.to_string(), Arc::clone(&scheme));
                    Some(scheme)
                }
                Err(e) => {
                    errors.push(format!("scheme file {file:?}: {e}"));
                    None
                }
            }
        };

        let mut resolve_decls = |decls: &[PlanDecl], errors: &mut Vec<String>| {
            let mut plans = Vec::with_capacity(decls.len());
            for decl in decls {
                let mut configurations = Vec::with_capacity(decl.coding_configurations.len());
                for config in &decl.coding_configurations {
                    let Some(scheme) = load_scheme(&config.scheme_file, errors) else {
                        continue;
                    };
                    match CodingConfiguration::new(
                        config.coded_field.clone(),
                        config.coding_mode,
                        config.fold_mode,
                        scheme,
                    ) {
                        Ok(mut cc) => {
                            if let Some(key) = &config.analysis_file_key {
                                cc = cc.with_analysis_file_key(key.clone());
                            }
                            if let Some(cleaner) = &config.cleaner {
                                cc = cc.with_cleaner(cleaner.clone());
                            }
                            configurations.push(cc);
                        }
                        Err(e) => errors.push(e.to_string()),
                    }
                }

                match CodingPlan::new(
                    decl.raw_field.clone(),
                    decl.coded_file.clone(),
                    decl.raw_field_fold_mode,
                    configurations,
                ) {
                    Ok(mut plan) => {
                        if let Some(id_field) = &decl.id_field {
                            plan = plan.with_id_field(id_field.clone());
                        }
                        if let Some(time_field) = &decl.time_field {
                            plan = plan.with_time_field(time_field.clone());
                        }
                        if let Some(icr_file) = &decl.icr_file {
                            plan = plan.with_icr_file(icr_file.clone());
                        }
                        plans.push(plan);
                    }
                    Err(e) => errors.push(e.to_string()),
                }
            }
            plans
        };

        let rqa = resolve_decls(&self.rqa_plans, &mut errors);
        let survey = resolve_decls(&self.survey_plans, &mut errors);
        let set = PlanSet::new(rqa, survey);

        check_cross_plan_uniqueness(&set, &mut errors);

        if !errors.is_empty() {
            return Err(PlanError::InvalidManifest { errors });
        }

        tracing::info!(
            rqa_plans = set.rqa().len(),
            survey_plans = set.survey().len(),
            schemes = scheme_cache.len(),
            "resolved plan manifest"
        );
        Ok(set)
    }
}

/// Coded fields and analysis keys name record keys and export columns;
/// a repeat anywhere across the plan set would silently shadow data.
fn check_cross_plan_uniqueness(set: &PlanSet, errors: &mut Vec<String>) {
    let mut coded_fields = HashMap::new();
    let mut analysis_keys = HashMap::new();

    for plan in set.all() {
        for cc in plan.coding_configurations() {
            if let Some(previous) =
                coded_fields.insert(cc.coded_field().to_string(), plan.raw_field().to_string())
            {
                errors.push(format!(
                    "coded field {:?} declared by both {previous:?} and {:?}",
                    cc.coded_field(),
                    plan.raw_field(),
                ));
            }
            if let Some(key) = cc.analysis_file_key() {
                if let Some(previous) =
                    analysis_keys.insert(key.to_string(), plan.raw_field().to_string())
                {
                    errors.push(format!(
                        "analysis file key {key:?} declared by both {previous:?} and {:?}",
                        plan.raw_field(),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_scheme(dir: &Path, file: &str, scheme_id: &str) {
        let raw = format!(
            r#"{{
                "scheme_id": "{scheme_id}",
                "name": "{scheme_id}",
                "version": "0.1",
                "codes": [
                    {{"code_id": "code-a", "code_type": "normal",
                      "string_value": "a", "match_values": ["a"]}},
                    {{"code_id": "code-NA", "code_type": "control",
                      "control_code": "NA", "string_value": "NA"}},
                    {{"code_id": "code-NC", "code_type": "control",
                      "control_code": "NC", "string_value": "NC"}}
                ]
            }}"#
        );
        let mut f = fs::File::create(dir.join(file)).unwrap();
        f.write_all(raw.as_bytes()).unwrap();
    }

    const MANIFEST: &str = r#"{
        "rqa_plans": [
            {
                "raw_field": "s01e01_raw",
                "time_field": "sent_on",
                "coded_file": "s01e01.json",
                "raw_field_fold_mode": "concatenate",
                "coding_configurations": [
                    {
                        "coded_field": "s01e01_coded",
                        "scheme_file": "s01e01_reasons.json",
                        "coding_mode": "multiple",
                        "fold_mode": "matrix_union",
                        "analysis_file_key": "s01e01_"
                    }
                ]
            }
        ],
        "survey_plans": [
            {
                "raw_field": "gender_raw",
                "coded_file": "gender.json",
                "raw_field_fold_mode": "assert_equal",
                "coding_configurations": [
                    {
                        "coded_field": "gender_coded",
                        "scheme_file": "gender.json",
                        "coding_mode": "single",
                        "fold_mode": "assert_equal",
                        "analysis_file_key": "gender",
                        "cleaner": "gender"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn resolves_plans_and_schemes() {
        let dir = tempfile::tempdir().unwrap();
        write_scheme(dir.path(), "s01e01_reasons.json", "Scheme-s01e01");
        write_scheme(dir.path(), "gender.json", "Scheme-gender");

        let manifest = PlanManifest::from_json_str(MANIFEST).unwrap();
        let set = manifest.resolve(dir.path()).unwrap();

        assert_eq!(set.rqa().len(), 1);
        assert_eq!(set.survey().len(), 1);
        assert_eq!(set.all().count(), 2);

        let rqa = &set.rqa()[0];
        assert_eq!(rqa.raw_field(), "s01e01_raw");
        assert_eq!(rqa.id_field(), "s01e01_raw_id");
        assert_eq!(rqa.time_field(), Some("sent_on"));

        let survey_cc = &set.survey()[0].coding_configurations()[0];
        assert_eq!(survey_cc.cleaner(), Some("gender"));
        assert_eq!(survey_cc.scheme().scheme_id(), "Scheme-gender");
    }

    #[test]
    fn missing_scheme_file_is_collected() {
        let dir = tempfile::tempdir().unwrap();
        // Only one of the two referenced scheme files exists.
        write_scheme(dir.path(), "gender.json", "Scheme-gender");

        let manifest = PlanManifest::from_json_str(MANIFEST).unwrap();
        let err = manifest.resolve(dir.path()).unwrap_err();
        match err {
            PlanError::InvalidManifest { errors } => {
                assert!(errors.iter().any(|e| e.contains("s01e01_reasons.json")));
            }
            other => panic!("expected InvalidManifest, got {other}"),
        }
    }

    #[test]
    fn duplicate_coded_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_scheme(dir.path(), "gender.json", "Scheme-gender");

        let manifest = PlanManifest::from_json_str(
            r#"{
                "survey_plans": [
                    {
                        "raw_field": "a_raw",
                        "coded_file": "a.json",
                        "raw_field_fold_mode": "assert_equal",
                        "coding_configurations": [
                            {"coded_field": "dup_coded", "scheme_file": "gender.json",
                             "coding_mode": "single", "fold_mode": "assert_equal"}
                        ]
                    },
                    {
                        "raw_field": "b_raw",
                        "coded_file": "b.json",
                        "raw_field_fold_mode": "assert_equal",
                        "coding_configurations": [
                            {"coded_field": "dup_coded", "scheme_file": "gender.json",
                             "coding_mode": "single", "fold_mode": "assert_equal"}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        let err = manifest.resolve(dir.path()).unwrap_err();
        match err {
            PlanError::InvalidManifest { errors } => {
                assert!(errors.iter().any(|e| e.contains("dup_coded")));
            }
            other => panic!("expected InvalidManifest, got {other}"),
        }
    }

    #[test]
    fn incompatible_modes_reported_per_configuration() {
        let dir = tempfile::tempdir().unwrap();
        write_scheme(dir.path(), "gender.json", "Scheme-gender");

        let manifest = PlanManifest::from_json_str(
            r#"{
                "survey_plans": [
                    {
                        "raw_field": "gender_raw",
                        "coded_file": "gender.json",
                        "raw_field_fold_mode": "assert_equal",
                        "coding_configurations": [
                            {"coded_field": "gender_coded", "scheme_file": "gender.json",
                             "coding_mode": "multiple", "fold_mode": "assert_equal"}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            manifest.resolve(dir.path()),
            Err(PlanError::InvalidManifest { .. })
        ));
    }
}
