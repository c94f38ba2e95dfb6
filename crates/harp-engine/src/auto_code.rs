//! # Auto-Coding — Cleaners, Missing-Data Policy, Message Ids
//!
//! The automatic half of coding: every coding configuration with a
//! cleaner attached classifies its plan's raw field on every record, and
//! the missing-data policy guarantees that after this phase (plus manual
//! import) every coded field resolves to a concrete code:
//!
//! - raw field entirely absent → every coded field of the plan is
//!   true-missing (`NA`);
//! - raw field present but empty → not-coded (`NC`);
//! - record flagged as noise → RQA coded fields not already set become
//!   not-coded.
//!
//! Auto-coding also derives the deterministic per-message ids that key
//! the manual-coding round trip.

use std::collections::BTreeMap;

use harp_cleaners::{CleanerRegistry, MatchResult};
use harp_core::{ControlCode, MessageId, Provenance, TracedRecord};
use harp_plan::{CodingConfiguration, CodingMode, CodingPlan, PlanSet};
use harp_scheme::Label;
use serde_json::Value;

use crate::error::EngineError;

const CALL_SITE: &str = "harp_engine::auto_code";

/// Build the record value for one applied code under the configuration's
/// coding mode: a label object for single coding, a one-element label
/// list for multiple coding (manual import may add more later).
fn label_value(
    cc: &CodingConfiguration,
    control_or_code: &harp_scheme::Code,
    origin: &str,
) -> Result<Value, EngineError> {
    let label = Label::from_code(cc.scheme(), control_or_code, origin, false);
    let value = label.to_value()?;
    Ok(match cc.coding_mode() {
        CodingMode::Single => value,
        CodingMode::Multiple => Value::Array(vec![value]),
    })
}

/// Run every attached cleaner over every record.
///
/// A cleaner match resolves through the scheme's match-value index; a
/// non-match writes the scheme's `NC` control code. Records without the
/// raw field are left for the missing-data policy.
///
/// # Errors
///
/// - [`EngineError::UnknownCleaner`] when a configuration references a
///   cleaner the registry does not provide (checked before any record is
///   touched).
/// - A scheme lookup error if a cleaner returns a match value the scheme
///   does not define — a configuration bug, and fatal.
pub fn apply_cleaners(
    user: &str,
    records: &mut [TracedRecord],
    plans: &PlanSet,
    registry: &CleanerRegistry,
) -> Result<(), EngineError> {
    // Resolve every cleaner up front so a bad reference aborts before
    // any record is mutated.
    let mut jobs = Vec::new();
    for plan in plans.all() {
        for cc in plan.coding_configurations() {
            if let Some(name) = cc.cleaner() {
                let cleaner =
                    registry
                        .get(name)
                        .ok_or_else(|| EngineError::UnknownCleaner {
                            name: name.to_string(),
                            coded_field: cc.coded_field().to_string(),
                        })?;
                jobs.push((plan, cc, cleaner));
            }
        }
    }

    for (plan, cc, cleaner) in &jobs {
        let origin = format!("cleaner/{}", cleaner.name());
        let mut coded = 0usize;
        for record in records.iter_mut() {
            let Some(raw) = record.get_str(plan.raw_field()) else {
                continue;
            };
            let code = match cleaner.classify(raw) {
                MatchResult::Matched(match_value) => {
                    cc.scheme().code_with_match_value(&match_value)?
                }
                MatchResult::NotCoded => {
                    cc.scheme().code_with_control_code(ControlCode::NotCoded)?
                }
            };
            let value = label_value(cc, code, &origin)?;
            record.append_one(
                cc.coded_field(),
                value,
                Provenance::new(user, CALL_SITE),
            );
            coded += 1;
        }
        tracing::info!(
            cleaner = cleaner.name(),
            coded_field = cc.coded_field(),
            coded,
            "applied cleaner"
        );
    }
    Ok(())
}

/// Apply the missing-data policy for every plan on every record.
pub fn apply_missing_policy(
    user: &str,
    records: &mut [TracedRecord],
    plans: &PlanSet,
) -> Result<(), EngineError> {
    for record in records.iter_mut() {
        let mut missing_data: BTreeMap<String, Value> = BTreeMap::new();
        for plan in plans.all() {
            let control = match record.get_str(plan.raw_field()) {
                None => {
                    if record.get(plan.raw_field()).is_some() {
                        // Present but not a string; leave for the coder.
                        continue;
                    }
                    ControlCode::TrueMissing
                }
                Some("") => ControlCode::NotCoded,
                Some(_) => continue,
            };
            for cc in plan.coding_configurations() {
                let code = cc.scheme().code_with_control_code(control)?;
                missing_data.insert(
                    cc.coded_field().to_string(),
                    label_value(cc, code, "auto_code/missing")?,
                );
            }
        }
        record.append_data(missing_data, Provenance::new(user, CALL_SITE));
    }
    Ok(())
}

/// Mark noise records' RQA coded fields as not-coded, where not already
/// set by a cleaner or the missing-data policy.
pub fn apply_noise_policy(
    user: &str,
    records: &mut [TracedRecord],
    plans: &PlanSet,
) -> Result<(), EngineError> {
    for record in records.iter_mut() {
        if !flag_is_set(record.get("noise")) {
            continue;
        }
        let mut noise_data: BTreeMap<String, Value> = BTreeMap::new();
        for plan in plans.rqa() {
            for cc in plan.coding_configurations() {
                if record.contains_key(cc.coded_field()) {
                    continue;
                }
                let code = cc.scheme().code_with_control_code(ControlCode::NotCoded)?;
                noise_data.insert(
                    cc.coded_field().to_string(),
                    label_value(cc, code, "auto_code/noise")?,
                );
            }
        }
        record.append_data(noise_data, Provenance::new(user, CALL_SITE));
    }
    Ok(())
}

/// Derive the deterministic per-message id for every record bearing the
/// plan's raw field.
pub fn compute_message_ids(
    user: &str,
    records: &mut [TracedRecord],
    plan: &CodingPlan,
) -> Result<(), EngineError> {
    for (position, record) in records.iter_mut().enumerate() {
        let Some(raw) = record.get_str(plan.raw_field()) else {
            continue;
        };
        let uid = record
            .uid()
            .ok_or(EngineError::MissingUid { position })?;
        let time = plan
            .time_field()
            .and_then(|field| record.get_str(field))
            .unwrap_or("");
        let id = MessageId::derive(uid, plan.raw_field(), raw, time);
        record.append_one(
            plan.id_field(),
            Value::String(id.as_str().to_string()),
            Provenance::new(user, CALL_SITE),
        );
    }
    Ok(())
}

fn flag_is_set(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(v) => v.as_str() == Some("true"),
        None => false,
    }
}
