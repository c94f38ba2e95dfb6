//! # Message Filters
//!
//! Record-set filters run between translation and coding. Each filter
//! consumes and returns the record vector and logs how much it dropped;
//! nothing here mutates a record.

use harp_core::{Timestamp, TracedRecord};
use serde_json::Value;

use crate::error::EngineError;

/// The record key flagging test traffic.
const TEST_RUN_KEY: &str = "test_run";
/// The record key flagging noise.
const NOISE_KEY: &str = "noise";

/// Drop records flagged as test traffic (`test_run` true).
pub fn filter_test_messages(records: Vec<TracedRecord>) -> Vec<TracedRecord> {
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|td| !flag_is_set(td.get(TEST_RUN_KEY)))
        .collect();
    tracing::info!(
        dropped = before - kept.len(),
        kept = kept.len(),
        "filtered test messages"
    );
    kept
}

/// Keep only records bearing at least one of the given raw fields —
/// runs that answered no week's question carry nothing to code.
pub fn filter_empty_messages(
    records: Vec<TracedRecord>,
    raw_fields: &[String],
) -> Vec<TracedRecord> {
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|td| raw_fields.iter().any(|field| td.contains_key(field)))
        .collect();
    tracing::info!(
        dropped = before - kept.len(),
        kept = kept.len(),
        "filtered empty messages"
    );
    kept
}

/// Keep only records whose time field falls within `[start, end)`.
/// Records without the time field are dropped.
///
/// # Errors
///
/// An unparseable time value is corrupt input and fatal.
pub fn filter_time_range(
    records: Vec<TracedRecord>,
    time_field: &str,
    start: Timestamp,
    end: Timestamp,
) -> Result<Vec<TracedRecord>, EngineError> {
    let before = records.len();
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        let Some(raw_time) = record.get_str(time_field) else {
            continue;
        };
        let time = Timestamp::parse_lenient(raw_time)?;
        if start <= time && time < end {
            kept.push(record);
        }
    }
    tracing::info!(
        dropped = before - kept.len(),
        kept = kept.len(),
        start = %start,
        end = %end,
        "filtered to project date range"
    );
    Ok(kept)
}

/// Drop records flagged as noise.
pub fn filter_noise(records: Vec<TracedRecord>) -> Vec<TracedRecord> {
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|td| !flag_is_set(td.get(NOISE_KEY)))
        .collect();
    tracing::info!(
        dropped = before - kept.len(),
        kept = kept.len(),
        "filtered noise"
    );
    kept
}

fn flag_is_set(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(v) => v.as_str() == Some("true"),
        None => false,
    }
}
