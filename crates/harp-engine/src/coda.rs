//! # Manual-Coding Round Trip
//!
//! The external coding tool is where humans verify and extend the
//! automatic codes. The round trip is file-based:
//!
//! - **Export**: one JSON file per plan, one entry per distinct message
//!   (raw text, sent-on time, deterministic message id, current labels)
//!   for coders to annotate.
//! - **Import**: the coded file comes back with verified labels; they are
//!   merged into the record set keyed by message id, overriding the
//!   auto-codes. Records absent from the file keep their auto-codes.
//!
//! After merging, wrong-scheme imputation runs: where a coder marked a
//! message's raw field as belonging to a different dataset and the
//! correct dataset could not be determined, every coded field of that
//! plan is overwritten with the coding-error control code — the message
//! was miscategorised upstream and its codes must not reach analysis.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Read, Write};

use harp_core::{ControlCode, Provenance, TracedRecord};
use harp_plan::{CodingConfiguration, CodingMode, CodingPlan, PlanSet};
use harp_scheme::{CodeScheme, Label};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

const CALL_SITE: &str = "harp_engine::coda";

/// The key suffix under which wrong-scheme labels are stored per plan.
const WS_FIELD_SUFFIX: &str = "_WS_correct_dataset";

/// One message entry in a coding file, in both directions of the round
/// trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodedMessage {
    /// Deterministic message id (see [`harp_core::MessageId`]).
    pub message_id: String,
    /// The raw answer text shown to coders.
    pub text: String,
    /// ISO 8601 sent-on time, if the plan has a time field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_on: Option<String>,
    /// Applied labels, across all schemes bound to the plan.
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// The record key carrying a plan's wrong-scheme label.
pub fn ws_field(plan: &CodingPlan) -> String {
    format!("{}{WS_FIELD_SUFFIX}", plan.raw_field())
}

/// Write the coding file for one plan: one entry per distinct message id,
/// in first-seen record order.
///
/// Requires message ids to be computed already
/// ([`crate::auto_code::compute_message_ids`]).
pub fn write_coding_file<W: Write>(
    records: &[TracedRecord],
    plan: &CodingPlan,
    writer: &mut W,
) -> Result<usize, EngineError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut messages: Vec<CodedMessage> = Vec::new();

    for record in records {
        let Some(text) = record.get_str(plan.raw_field()) else {
            continue;
        };
        let Some(message_id) = record.get_str(plan.id_field()) else {
            return Err(EngineError::CodedFile {
                file: plan.coded_file().to_string(),
                reason: format!(
                    "record with raw field {:?} has no message id; \
                     compute message ids before exporting",
                    plan.raw_field()
                ),
            });
        };
        if seen.contains(message_id) {
            continue;
        }

        let mut labels = Vec::new();
        for cc in plan.coding_configurations() {
            if let Some(value) = record.get(cc.coded_field()) {
                match cc.coding_mode() {
                    CodingMode::Single => {
                        labels.push(parse_label(cc.coded_field(), value)?);
                    }
                    CodingMode::Multiple => {
                        labels.extend(parse_label_list(cc.coded_field(), value)?);
                    }
                }
            }
        }

        seen.insert(message_id.to_string());
        messages.push(CodedMessage {
            message_id: message_id.to_string(),
            text: text.to_string(),
            sent_on: plan
                .time_field()
                .and_then(|field| record.get_str(field))
                .map(str::to_string),
            labels,
        });
    }

    serde_json::to_writer_pretty(writer, &messages)?;
    tracing::info!(
        plan = plan.raw_field(),
        messages = messages.len(),
        "wrote coding file"
    );
    Ok(messages.len())
}

/// Parse a coded file returned by the coding tool.
pub fn read_coded_file<R: Read>(reader: &mut R) -> Result<Vec<CodedMessage>, EngineError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Merge one configuration's verified labels into the record set, keyed
/// by the plan's message id field. Returns the number of records updated.
///
/// Single mode requires exactly one label per matched message for the
/// configuration's scheme; multiple mode takes the full list. Every
/// imported label's code id must resolve in the scheme.
pub fn merge_coded_labels(
    user: &str,
    records: &mut [TracedRecord],
    plan: &CodingPlan,
    cc: &CodingConfiguration,
    messages: &[CodedMessage],
) -> Result<usize, EngineError> {
    let scheme_id = cc.scheme().scheme_id();
    let mut by_id: HashMap<&str, Vec<&Label>> = HashMap::new();
    for message in messages {
        let labels: Vec<&Label> = message
            .labels
            .iter()
            .filter(|label| label.scheme_id == scheme_id)
            .collect();
        if labels.is_empty() {
            continue;
        }
        if cc.coding_mode() == CodingMode::Single && labels.len() > 1 {
            return Err(EngineError::CodedFile {
                file: plan.coded_file().to_string(),
                reason: format!(
                    "message {} carries {} labels for single-coded scheme {}",
                    message.message_id,
                    labels.len(),
                    scheme_id
                ),
            });
        }
        for label in &labels {
            // A label naming an unknown code is a corrupt coded file.
            cc.scheme().code_with_id(&label.code_id)?;
        }
        by_id.insert(message.message_id.as_str(), labels);
    }

    let mut merged = 0usize;
    for record in records.iter_mut() {
        let Some(message_id) = record.get_str(plan.id_field()) else {
            continue;
        };
        let Some(labels) = by_id.get(message_id) else {
            continue;
        };
        let value = match cc.coding_mode() {
            CodingMode::Single => serde_json::to_value(labels[0])?,
            CodingMode::Multiple => serde_json::to_value(labels)?,
        };
        record.append_one(cc.coded_field(), value, Provenance::new(user, CALL_SITE));
        merged += 1;
    }

    tracing::info!(
        coded_field = cc.coded_field(),
        merged,
        "merged manual codes"
    );
    Ok(merged)
}

/// Merge wrong-scheme labels (labels in the correct-dataset scheme) into
/// each matched record's `{raw_field}_WS_correct_dataset` key.
pub fn merge_ws_labels(
    user: &str,
    records: &mut [TracedRecord],
    plan: &CodingPlan,
    ws_scheme: &CodeScheme,
    messages: &[CodedMessage],
) -> Result<usize, EngineError> {
    let mut by_id: HashMap<&str, &Label> = HashMap::new();
    for message in messages {
        for label in &message.labels {
            if label.scheme_id == ws_scheme.scheme_id() {
                ws_scheme.code_with_id(&label.code_id)?;
                by_id.insert(message.message_id.as_str(), label);
            }
        }
    }

    let key = ws_field(plan);
    let mut merged = 0usize;
    for record in records.iter_mut() {
        let Some(message_id) = record.get_str(plan.id_field()) else {
            continue;
        };
        let Some(label) = by_id.get(message_id) else {
            continue;
        };
        record.append_one(
            key.clone(),
            serde_json::to_value(label)?,
            Provenance::new(user, CALL_SITE),
        );
        merged += 1;
    }
    Ok(merged)
}

/// Overwrite every coded field of a plan with the coding-error control
/// code wherever the plan's wrong-scheme label resolves to coding-error:
/// the coder established the message does not belong to this dataset and
/// could not place it in the right one.
pub fn impute_coding_errors(
    user: &str,
    records: &mut [TracedRecord],
    plans: &PlanSet,
    ws_scheme: &CodeScheme,
) -> Result<(), EngineError> {
    for record in records.iter_mut() {
        let mut coding_error_data: BTreeMap<String, Value> = BTreeMap::new();
        for plan in plans.all() {
            let key = ws_field(plan);
            let Some(value) = record.get(&key) else {
                continue;
            };
            let label = parse_label(&key, value)?;
            let code = ws_scheme.code_with_id(&label.code_id)?;
            if !code.is_control(ControlCode::CodingError) {
                continue;
            }
            for cc in plan.coding_configurations() {
                let ce = cc.scheme().code_with_control_code(ControlCode::CodingError)?;
                let label = Label::from_code(cc.scheme(), ce, "coda/ws_imputation", true);
                let value = label.to_value()?;
                let value = match cc.coding_mode() {
                    CodingMode::Single => value,
                    CodingMode::Multiple => Value::Array(vec![value]),
                };
                coding_error_data.insert(cc.coded_field().to_string(), value);
            }
        }
        record.append_data(coding_error_data, Provenance::new(user, CALL_SITE));
    }
    Ok(())
}

fn parse_label(key: &str, value: &Value) -> Result<Label, EngineError> {
    Label::from_value(value).map_err(|source| EngineError::MalformedField {
        key: key.to_string(),
        source,
    })
}

fn parse_label_list(key: &str, value: &Value) -> Result<Vec<Label>, EngineError> {
    Label::list_from_value(value).map_err(|source| EngineError::MalformedField {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_code::compute_message_ids;
    use harp_core::Timestamp;
    use harp_plan::FoldMode;
    use harp_scheme::Code;
    use serde_json::json;
    use std::sync::Arc;

    fn prov() -> Provenance {
        Provenance::at(
            "tester",
            "harp_engine::coda::tests",
            Timestamp::parse("2019-04-15T12:00:00Z").unwrap(),
        )
    }

    fn gender_scheme() -> Arc<CodeScheme> {
        Arc::new(
            CodeScheme::new(
                "Scheme-gender",
                "gender",
                "0.1",
                vec![
                    Code::normal("code-gender-f", "female", vec!["female".to_string()]),
                    Code::normal("code-gender-m", "male", vec!["male".to_string()]),
                    Code::control("code-NC", ControlCode::NotCoded),
                    Code::control("code-CE", ControlCode::CodingError),
                ],
            )
            .unwrap(),
        )
    }

    fn ws_scheme() -> Arc<CodeScheme> {
        Arc::new(
            CodeScheme::new(
                "Scheme-ws",
                "correct dataset",
                "0.1",
                vec![
                    Code::normal("code-ws-s01e01", "s01e01", vec![]),
                    Code::control("code-ws-CE", ControlCode::CodingError),
                ],
            )
            .unwrap(),
        )
    }

    fn plan() -> CodingPlan {
        CodingPlan::new(
            "gender_raw",
            "gender.json",
            FoldMode::AssertEqual,
            vec![CodingConfiguration::new(
                "gender_coded",
                CodingMode::Single,
                FoldMode::AssertEqual,
                gender_scheme(),
            )
            .unwrap()
            .with_analysis_file_key("gender")],
        )
        .unwrap()
    }

    fn records() -> Vec<TracedRecord> {
        let mut data = BTreeMap::new();
        data.insert("uid".to_string(), json!("u1"));
        data.insert("gender_raw".to_string(), json!("female"));
        vec![TracedRecord::new(data, prov())]
    }

    fn plan_set() -> PlanSet {
        PlanSet::new(vec![], vec![plan()])
    }

    #[test]
    fn export_import_roundtrip_overrides_auto_codes() {
        let plan = plan();
        let mut records = records();
        compute_message_ids("tester", &mut records, &plan).unwrap();

        let mut buffer = Vec::new();
        let written = write_coding_file(&records, &plan, &mut buffer).unwrap();
        assert_eq!(written, 1);

        // Simulate the coder applying "male" to the exported message.
        let mut messages = read_coded_file(&mut buffer.as_slice()).unwrap();
        let scheme = gender_scheme();
        let code = scheme.code_with_id("code-gender-m").unwrap();
        messages[0].labels = vec![Label::from_code(&scheme, code, "coder-1", true)];

        let cc = &plan.coding_configurations()[0];
        let merged =
            merge_coded_labels("tester", &mut records, &plan, cc, &messages).unwrap();
        assert_eq!(merged, 1);

        let label = Label::from_value(records[0].get("gender_coded").unwrap()).unwrap();
        assert_eq!(label.code_id, "code-gender-m");
        assert!(label.checked);
    }

    #[test]
    fn unmatched_records_keep_auto_codes() {
        let plan = plan();
        let mut records = records();
        compute_message_ids("tester", &mut records, &plan).unwrap();

        let cc = &plan.coding_configurations()[0];
        let merged = merge_coded_labels("tester", &mut records, &plan, cc, &[]).unwrap();
        assert_eq!(merged, 0);
        assert!(!records[0].contains_key("gender_coded"));
    }

    #[test]
    fn single_mode_rejects_multiple_labels() {
        let plan = plan();
        let mut records = records();
        compute_message_ids("tester", &mut records, &plan).unwrap();
        let message_id = records[0].get_str("gender_raw_id").unwrap().to_string();

        let scheme = gender_scheme();
        let f = scheme.code_with_id("code-gender-f").unwrap();
        let m = scheme.code_with_id("code-gender-m").unwrap();
        let messages = vec![CodedMessage {
            message_id,
            text: "female".to_string(),
            sent_on: None,
            labels: vec![
                Label::from_code(&scheme, f, "coder-1", true),
                Label::from_code(&scheme, m, "coder-1", true),
            ],
        }];

        let cc = &plan.coding_configurations()[0];
        let err =
            merge_coded_labels("tester", &mut records, &plan, cc, &messages).unwrap_err();
        assert!(matches!(err, EngineError::CodedFile { .. }));
    }

    #[test]
    fn unknown_code_id_in_coded_file_is_fatal() {
        let plan = plan();
        let mut records = records();
        compute_message_ids("tester", &mut records, &plan).unwrap();
        let message_id = records[0].get_str("gender_raw_id").unwrap().to_string();

        let scheme = gender_scheme();
        let f = scheme.code_with_id("code-gender-f").unwrap();
        let mut label = Label::from_code(&scheme, f, "coder-1", true);
        label.code_id = "code-nonexistent".to_string();
        let messages = vec![CodedMessage {
            message_id,
            text: "female".to_string(),
            sent_on: None,
            labels: vec![label],
        }];

        let cc = &plan.coding_configurations()[0];
        assert!(matches!(
            merge_coded_labels("tester", &mut records, &plan, cc, &messages),
            Err(EngineError::Scheme(_))
        ));
    }

    #[test]
    fn ws_coding_error_overwrites_all_coded_fields() {
        let plan = plan();
        let plans = plan_set();
        let ws = ws_scheme();
        let mut records = records();
        compute_message_ids("tester", &mut records, &plan).unwrap();
        let message_id = records[0].get_str("gender_raw_id").unwrap().to_string();

        // Auto-code first so the overwrite is observable.
        let scheme = gender_scheme();
        let f = scheme.code_with_id("code-gender-f").unwrap();
        records[0].append_one(
            "gender_coded",
            Label::from_code(&scheme, f, "cleaner/gender", false)
                .to_value()
                .unwrap(),
            prov(),
        );

        let ce = ws.code_with_id("code-ws-CE").unwrap();
        let messages = vec![CodedMessage {
            message_id,
            text: "female".to_string(),
            sent_on: None,
            labels: vec![Label::from_code(&ws, ce, "coder-1", true)],
        }];
        merge_ws_labels("tester", &mut records, &plan, &ws, &messages).unwrap();
        impute_coding_errors("tester", &mut records, &plans, &ws).unwrap();

        let label = Label::from_value(records[0].get("gender_coded").unwrap()).unwrap();
        assert_eq!(label.code_id, "code-CE");
    }

    #[test]
    fn ws_concrete_dataset_label_leaves_codes_alone() {
        let plan = plan();
        let plans = plan_set();
        let ws = ws_scheme();
        let mut records = records();
        compute_message_ids("tester", &mut records, &plan).unwrap();
        let message_id = records[0].get_str("gender_raw_id").unwrap().to_string();

        let moved = ws.code_with_id("code-ws-s01e01").unwrap();
        let messages = vec![CodedMessage {
            message_id,
            text: "female".to_string(),
            sent_on: None,
            labels: vec![Label::from_code(&ws, moved, "coder-1", true)],
        }];
        merge_ws_labels("tester", &mut records, &plan, &ws, &messages).unwrap();
        impute_coding_errors("tester", &mut records, &plans, &ws).unwrap();

        assert!(!records[0].contains_key("gender_coded"));
    }
}
