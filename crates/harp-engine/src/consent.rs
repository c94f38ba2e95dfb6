//! # Consent Engine — Stop-Code Detection and Propagation
//!
//! A respondent withdraws consent by texting a stop phrase; manual coders
//! (or cleaners) code that message with the scheme's `STOP` control code.
//! Withdrawal is terminal: once detected, every other exportable field of
//! the record is overwritten with `STOP` so nothing the respondent said
//! reaches analysis.
//!
//! Detection and propagation are separate passes because propagation must
//! run twice — once on the per-message records and once on the folded
//! per-respondent records. A per-message-only pass would not guarantee
//! the rolled-up respondent row inherits the stop: the signal can sit on
//! any one of the respondent's messages.
//!
//! Both operations are idempotent, and detection is monotonic: a record
//! is never un-marked.

use std::collections::BTreeMap;

use harp_core::{ControlCode, Provenance, TracedRecord, MATRIX_1, TRUE};
use harp_plan::{CodingMode, PlanSet};
use harp_scheme::Label;
use serde_json::Value;

use crate::error::EngineError;

const CALL_SITE: &str = "harp_engine::consent";

/// The record key marking withdrawal.
pub const WITHDRAWN_KEY: &str = "consent_withdrawn";

/// Whether any coded field governed by the plans carries a stop code.
///
/// Single-coded fields resolve their label through the scheme and test
/// the control code; multi-coded fields test the materialized `STOP`
/// matrix cell (so this runs after string-value materialization).
pub fn record_has_stop_code(
    record: &TracedRecord,
    plans: &PlanSet,
) -> Result<bool, EngineError> {
    for plan in plans.all() {
        for cc in plan.coding_configurations() {
            match cc.coding_mode() {
                CodingMode::Single => {
                    let Some(value) = record.get(cc.coded_field()) else {
                        continue;
                    };
                    let label = Label::from_value(value).map_err(|source| {
                        EngineError::MalformedField {
                            key: cc.coded_field().to_string(),
                            source,
                        }
                    })?;
                    let code = cc.scheme().code_with_id(&label.code_id)?;
                    if code.is_control(ControlCode::Stop) {
                        return Ok(true);
                    }
                }
                CodingMode::Multiple => {
                    let Some(key) = cc.analysis_file_key() else {
                        continue;
                    };
                    if !cc.scheme().has_control_code(ControlCode::Stop) {
                        continue;
                    }
                    let stop = cc.scheme().code_with_control_code(ControlCode::Stop)?;
                    let cell = format!("{key}{}", stop.string_value);
                    if record.get_str(&cell) == Some(MATRIX_1) {
                        return Ok(true);
                    }
                }
            }
        }
    }
    Ok(false)
}

/// Mark every record carrying a stop code with `consent_withdrawn: "true"`.
///
/// Records already marked (or without a stop code) are left untouched, so
/// re-running the pass is a no-op and a mark is never removed.
pub fn determine_consent_withdrawn(
    user: &str,
    records: &mut [TracedRecord],
    plans: &PlanSet,
) -> Result<(), EngineError> {
    let mut withdrawn = 0usize;
    for record in records.iter_mut() {
        if record.get_str(WITHDRAWN_KEY) == Some(TRUE) {
            withdrawn += 1;
            continue;
        }
        if record_has_stop_code(record, plans)? {
            record.append_one(
                WITHDRAWN_KEY,
                Value::String(TRUE.to_string()),
                Provenance::new(user, CALL_SITE),
            );
            withdrawn += 1;
        }
    }
    tracing::info!(withdrawn, total = records.len(), "determined consent");
    Ok(())
}

/// Overwrite every exportable key of withdrawn records with `STOP`.
///
/// The overwritten key set is the union of the record's own keys and
/// `additional_keys` (keys some records never carried but which appear
/// in the export header), minus the withdrawal marker itself.
pub fn set_stopped(user: &str, records: &mut [TracedRecord], additional_keys: &[String]) {
    let mut stopped = 0usize;
    for record in records.iter_mut() {
        if record.get_str(WITHDRAWN_KEY) != Some(TRUE) {
            continue;
        }
        let mut stop_data: BTreeMap<String, Value> = BTreeMap::new();
        let keys: Vec<String> = record
            .keys()
            .into_iter()
            .map(str::to_string)
            .chain(additional_keys.iter().cloned())
            .collect();
        for key in keys {
            if key != WITHDRAWN_KEY {
                stop_data.insert(
                    key,
                    Value::String(ControlCode::Stop.as_str().to_string()),
                );
            }
        }
        record.append_data(stop_data, Provenance::new(user, CALL_SITE));
        stopped += 1;
    }
    tracing::info!(stopped, total = records.len(), "propagated stop codes");
}
