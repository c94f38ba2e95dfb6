//! # Analysis File Generation
//!
//! The order-dependent export orchestration. Starting from fully coded
//! per-message records:
//!
//! 1. Default every record to `consent_withdrawn: "false"`.
//! 2. Materialize export values from coded labels: the code's string
//!    value for single-coded fields, one `1`/`0` cell per code for
//!    multi-coded fields.
//! 3. Detect consent withdrawal on the per-message records.
//! 4. Fold per-message → per-respondent under the plan-configured
//!    fold modes.
//! 5. Apply the multi-coded matrix fixups to the folded rows.
//! 6. Propagate stop codes on both record sets.
//! 7. Write both sets as CSV with the identical ordered header list.
//!
//! Later steps assume earlier steps' invariants (consent detection reads
//! materialized matrix cells; the fold reads the consent marker), so the
//! order is part of the contract.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use harp_core::{Provenance, TracedRecord, UID_KEY, FALSE, MATRIX_0, MATRIX_1};
use harp_engine::consent::{determine_consent_withdrawn, set_stopped, WITHDRAWN_KEY};
use harp_engine::fold::{fix_matrix_missing_columns, fold_records, FoldSpec};
use harp_plan::{CodingMode, FoldMode, PlanSet};
use harp_scheme::Label;
use serde_json::Value;

use crate::csv::export_records_csv;
use crate::error::ExportError;

const CALL_SITE: &str = "harp_export::analysis";

/// Both outputs of a pipeline run, for callers that keep processing
/// (graph generation, tests).
#[derive(Debug)]
pub struct AnalysisOutput {
    /// The per-message records, consent-propagated.
    pub messages: Vec<TracedRecord>,
    /// The folded per-respondent records, consent-propagated.
    pub respondents: Vec<TracedRecord>,
}

/// The ordered export header list: `uid`, the consent marker, then for
/// every plan (declaration order) every configuration's column(s), then
/// the plan's raw field. Identical for both outputs by construction.
pub fn export_keys(plans: &PlanSet) -> Vec<String> {
    let mut keys = vec![UID_KEY.to_string(), WITHDRAWN_KEY.to_string()];
    let mut push_unique = |keys: &mut Vec<String>, key: String| {
        if !keys.contains(&key) {
            keys.push(key);
        }
    };

    for plan in plans.all() {
        for cc in plan.coding_configurations() {
            let Some(key) = cc.analysis_file_key() else {
                continue;
            };
            match cc.coding_mode() {
                CodingMode::Single => push_unique(&mut keys, key.to_string()),
                CodingMode::Multiple => {
                    for code in cc.scheme().codes() {
                        push_unique(&mut keys, format!("{key}{}", code.string_value));
                    }
                }
            }
        }
        // Plans may share a raw field; one column suffices.
        push_unique(&mut keys, plan.raw_field().to_string());
    }
    keys
}

/// The per-key fold assignments implied by the plan set, plus the
/// pipeline-level keys: `uid` folds assert-equal, the consent marker
/// boolean-or.
pub fn build_fold_spec(plans: &PlanSet) -> FoldSpec {
    let mut spec = FoldSpec {
        equal_keys: vec![UID_KEY.to_string()],
        concat_keys: Vec::new(),
        bool_keys: vec![WITHDRAWN_KEY.to_string()],
        matrix_keys: Vec::new(),
    };

    for plan in plans.all() {
        for cc in plan.coding_configurations() {
            let Some(key) = cc.analysis_file_key() else {
                continue;
            };
            match (cc.coding_mode(), cc.fold_mode()) {
                (CodingMode::Single, FoldMode::AssertEqual) => {
                    spec.equal_keys.push(key.to_string());
                }
                (CodingMode::Single, FoldMode::BooleanOr) => {
                    spec.bool_keys.push(key.to_string());
                }
                (CodingMode::Single, FoldMode::Concatenate) => {
                    spec.concat_keys.push(key.to_string());
                }
                (CodingMode::Multiple, FoldMode::MatrixUnion) => {
                    for code in cc.scheme().codes() {
                        spec.matrix_keys
                            .push(format!("{key}{}", code.string_value));
                    }
                }
                // Remaining pairings are ruled out by
                // CodingConfiguration::new.
                (CodingMode::Single, FoldMode::MatrixUnion)
                | (CodingMode::Multiple, _) => {}
            }
        }

        let raw = plan.raw_field().to_string();
        match plan.raw_field_fold_mode() {
            FoldMode::Concatenate if !spec.concat_keys.contains(&raw) => {
                spec.concat_keys.push(raw);
            }
            FoldMode::AssertEqual if !spec.equal_keys.contains(&raw) => {
                spec.equal_keys.push(raw);
            }
            // Duplicates of an already-assigned raw field, and modes
            // ruled out by CodingPlan::new.
            _ => {}
        }
    }
    spec
}

/// Materialize export values from coded labels (step 2).
pub fn materialize_analysis_values(
    user: &str,
    records: &mut [TracedRecord],
    plans: &PlanSet,
) -> Result<(), ExportError> {
    for record in records.iter_mut() {
        let mut analysis_data = std::collections::BTreeMap::new();

        for plan in plans.all() {
            for cc in plan.coding_configurations() {
                let Some(key) = cc.analysis_file_key() else {
                    continue;
                };
                match cc.coding_mode() {
                    CodingMode::Single => {
                        let Some(value) = record.get(cc.coded_field()) else {
                            return Err(ExportError::MissingCodedField {
                                uid: record.uid().unwrap_or("?").to_string(),
                                coded_field: cc.coded_field().to_string(),
                            });
                        };
                        let label = Label::from_value(value)?;
                        let code = cc.scheme().code_with_id(&label.code_id)?;
                        analysis_data.insert(
                            key.to_string(),
                            Value::String(code.string_value.clone()),
                        );
                    }
                    CodingMode::Multiple => {
                        let labels = match record.get(cc.coded_field()) {
                            Some(value) => Label::list_from_value(value)?,
                            None => Vec::new(),
                        };
                        for label in &labels {
                            let code = cc.scheme().code_with_id(&label.code_id)?;
                            analysis_data.insert(
                                format!("{key}{}", code.string_value),
                                Value::String(MATRIX_1.to_string()),
                            );
                        }
                        for code in cc.scheme().codes() {
                            let cell = format!("{key}{}", code.string_value);
                            analysis_data
                                .entry(cell)
                                .or_insert_with(|| Value::String(MATRIX_0.to_string()));
                        }
                    }
                }
            }
        }

        record.append_data(analysis_data, Provenance::new(user, CALL_SITE));
    }
    Ok(())
}

/// Run the full export orchestration and write both CSV outputs.
pub fn generate_analysis_files(
    user: &str,
    mut messages: Vec<TracedRecord>,
    plans: &PlanSet,
    csv_by_message_path: &Path,
    csv_by_respondent_path: &Path,
) -> Result<AnalysisOutput, ExportError> {
    // 1. Default consent marker.
    for record in messages.iter_mut() {
        record.append_one(
            WITHDRAWN_KEY,
            Value::String(FALSE.to_string()),
            Provenance::new(user, CALL_SITE),
        );
    }

    // 2. Materialize string/matrix values.
    materialize_analysis_values(user, &mut messages, plans)?;

    // 3. Detect withdrawal on the per-message records.
    determine_consent_withdrawn(user, &mut messages, plans)?;

    // 4. Fold to one record per respondent.
    let spec = build_fold_spec(plans);
    let mut respondents = fold_records(user, &messages, &spec)?;

    // 5. Matrix fixups on the folded rows.
    fix_matrix_missing_columns(user, &mut respondents, plans)?;

    // 6. Propagate stop codes on both sets.
    let headers = export_keys(plans);
    set_stopped(user, &mut messages, &headers);
    set_stopped(user, &mut respondents, &headers);

    // 7. Tabular outputs, one shared header list.
    let mut message_writer = BufWriter::new(File::create(csv_by_message_path)?);
    export_records_csv(&messages, &headers, &mut message_writer)?;
    let mut respondent_writer = BufWriter::new(File::create(csv_by_respondent_path)?);
    export_records_csv(&respondents, &headers, &mut respondent_writer)?;

    tracing::info!(
        messages = messages.len(),
        respondents = respondents.len(),
        columns = headers.len(),
        "wrote analysis files"
    );

    Ok(AnalysisOutput {
        messages,
        respondents,
    })
}
