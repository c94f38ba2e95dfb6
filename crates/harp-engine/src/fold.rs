//! # Fold Engine — Per-Message → Per-Respondent Merge
//!
//! Collapses a sequence of per-message records sharing a respondent id
//! into exactly one per-respondent record, combining each exportable key
//! under its configured [`FoldMode`]. This is a generic multi-way merge
//! with explicit conflict policy — the central algorithm of the system.
//!
//! ## Combination Rules
//!
//! - **AssertEqual** — all non-absent values must agree; disagreement is
//!   a fatal [`EngineError::ValueConflict`]. Absent values and the
//!   true-missing cell (`NA`) are folding-transparent: they yield to a
//!   present concrete value. The stop cell (`STOP`) dominates, so a
//!   withdrawing respondent's group still folds. Two differing concrete
//!   values never fold.
//! - **Concatenate** — non-empty values joined with a single space, in
//!   fold order.
//! - **BooleanOr** — tri-state: `true` if any record is true, `false`
//!   only if every present value is false, `ambivalent` otherwise.
//! - **MatrixUnion** — per-column OR: `1` if any record sets the column.
//!
//! Keys with no fold assignment keep the value of the group's first
//! record in input order (the representative the output is copied from).
//!
//! Fold groups are disjoint by construction, so groups are independent;
//! the fold itself is single-threaded like the rest of the pipeline.

use std::collections::{BTreeMap, HashMap};

use harp_core::{ControlCode, Provenance, TracedRecord, AMBIVALENT, FALSE, MATRIX_0, MATRIX_1, TRUE};
use harp_plan::{CodingMode, FoldMode, PlanSet};
use serde_json::Value;

use crate::error::EngineError;

const CALL_SITE: &str = "harp_engine::fold";

/// The per-key fold assignments for one run, grouped by mode.
///
/// Built by the exporter from the plan set (every analysis key lands in
/// exactly one list) plus the pipeline-level keys: `uid` folds as
/// assert-equal, `consent_withdrawn` as boolean-or.
#[derive(Debug, Clone, Default)]
pub struct FoldSpec {
    /// Keys folded with [`FoldMode::AssertEqual`].
    pub equal_keys: Vec<String>,
    /// Keys folded with [`FoldMode::Concatenate`].
    pub concat_keys: Vec<String>,
    /// Keys folded with [`FoldMode::BooleanOr`].
    pub bool_keys: Vec<String>,
    /// Keys folded with [`FoldMode::MatrixUnion`].
    pub matrix_keys: Vec<String>,
}

impl FoldSpec {
    /// Every (key, mode) assignment, in list order.
    fn assignments(&self) -> impl Iterator<Item = (&str, FoldMode)> {
        let equal = self
            .equal_keys
            .iter()
            .map(|k| (k.as_str(), FoldMode::AssertEqual));
        let concat = self
            .concat_keys
            .iter()
            .map(|k| (k.as_str(), FoldMode::Concatenate));
        let boolean = self
            .bool_keys
            .iter()
            .map(|k| (k.as_str(), FoldMode::BooleanOr));
        let matrix = self
            .matrix_keys
            .iter()
            .map(|k| (k.as_str(), FoldMode::MatrixUnion));
        equal.chain(concat).chain(boolean).chain(matrix)
    }
}

/// Fold per-message records into one record per respondent.
///
/// Groups are emitted in order of each respondent's first appearance.
///
/// # Errors
///
/// - [`EngineError::MissingUid`] if any record has no `uid`.
/// - [`EngineError::ValueConflict`] on an assert-equal disagreement —
///   fatal, naming the group, key, and both values.
pub fn fold_records(
    user: &str,
    records: &[TracedRecord],
    spec: &FoldSpec,
) -> Result<Vec<TracedRecord>, EngineError> {
    let groups = partition_by_uid(records)?;
    tracing::info!(
        messages = records.len(),
        respondents = groups.len(),
        "folding records by respondent"
    );

    let mut folded = Vec::with_capacity(groups.len());
    for (uid, group) in &groups {
        folded.push(fold_group(user, uid, group, spec)?);
    }
    Ok(folded)
}

/// Partition records into disjoint groups by `uid`, preserving the order
/// of first appearance.
fn partition_by_uid(
    records: &[TracedRecord],
) -> Result<Vec<(String, Vec<&TracedRecord>)>, EngineError> {
    let mut groups: Vec<(String, Vec<&TracedRecord>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (position, record) in records.iter().enumerate() {
        let uid = record
            .uid()
            .ok_or(EngineError::MissingUid { position })?;
        match index.get(uid) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(uid.to_string(), groups.len());
                groups.push((uid.to_string(), vec![record]));
            }
        }
    }
    Ok(groups)
}

/// Fold one group into a single record: a copy of the group's first
/// record overlaid with the combined value for every assigned key.
fn fold_group(
    user: &str,
    uid: &str,
    group: &[&TracedRecord],
    spec: &FoldSpec,
) -> Result<TracedRecord, EngineError> {
    let mut combined: BTreeMap<String, Value> = BTreeMap::new();

    for (key, mode) in spec.assignments() {
        let values: Vec<&Value> = group.iter().filter_map(|td| td.get(key)).collect();

        // The one place fold modes are dispatched.
        let folded = match mode {
            FoldMode::AssertEqual => fold_assert_equal(uid, key, &values)?,
            FoldMode::Concatenate => fold_concatenate(&values),
            FoldMode::BooleanOr => fold_boolean_or(&values),
            FoldMode::MatrixUnion => fold_matrix_union(&values),
        };

        if let Some(value) = folded {
            combined.insert(key.to_string(), value);
        }
    }

    let mut output = (*group[0]).clone();
    output.append_data(combined, Provenance::new(user, CALL_SITE));
    Ok(output)
}

/// All non-absent values must be identical, with two control-cell
/// exemptions:
///
/// - true-missing (`NA`) cells yield to a concrete value; a group whose
///   only present values are `NA` folds to `NA`;
/// - stop (`STOP`) cells dominate: a withdrawing respondent's earlier
///   answers must fold, and the stop wins. Conflicts among the non-stop
///   concrete values still abort.
fn fold_assert_equal(
    uid: &str,
    key: &str,
    values: &[&Value],
) -> Result<Option<Value>, EngineError> {
    let missing = Value::String(ControlCode::TrueMissing.as_str().to_string());
    let stop = Value::String(ControlCode::Stop.as_str().to_string());
    let mut result: Option<&Value> = None;
    let mut missing_seen = false;
    let mut stop_seen = false;

    for value in values {
        if **value == missing {
            missing_seen = true;
            continue;
        }
        if **value == stop {
            stop_seen = true;
            continue;
        }
        match result {
            None => result = Some(value),
            Some(previous) if previous == *value => {}
            Some(previous) => {
                return Err(EngineError::ValueConflict {
                    group_id: uid.to_string(),
                    key: key.to_string(),
                    left: display_value(previous),
                    right: display_value(value),
                });
            }
        }
    }

    if stop_seen {
        return Ok(Some(stop));
    }
    Ok(result
        .cloned()
        .or_else(|| missing_seen.then_some(missing)))
}

/// Join non-empty string values with a single space, in fold order.
fn fold_concatenate(values: &[&Value]) -> Option<Value> {
    if values.is_empty() {
        return None;
    }
    let joined = values
        .iter()
        .filter_map(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some(Value::String(joined))
}

/// Tri-state boolean combination over `"true"`/`"false"` cells.
fn fold_boolean_or(values: &[&Value]) -> Option<Value> {
    if values.is_empty() {
        return None;
    }
    let any_true = values.iter().any(|v| v.as_str() == Some(TRUE));
    let all_false = values.iter().all(|v| v.as_str() == Some(FALSE));
    let folded = if any_true {
        TRUE
    } else if all_false {
        FALSE
    } else {
        AMBIVALENT
    };
    Some(Value::String(folded.to_string()))
}

/// Per-column logical OR over `"1"`/`"0"` cells.
fn fold_matrix_union(values: &[&Value]) -> Option<Value> {
    if values.is_empty() {
        return None;
    }
    let any_set = values.iter().any(|v| v.as_str() == Some(MATRIX_1));
    let folded = if any_set { MATRIX_1 } else { MATRIX_0 };
    Some(Value::String(folded.to_string()))
}

fn display_value(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Post-fold fixups for multi-coded (matrix) fields.
///
/// Generic folding treats every matrix column independently, which leaves
/// two wrong states on folded rows:
///
/// - a respondent who answered the show at all must not look
///   true-missing on a multi-coded field, so a present raw field forces
///   the `NA` column to `0`;
/// - a folded row with no substantive column set must read as not-coded,
///   so the `NC` column is forced to `1` when nothing but `NC` is set.
pub fn fix_matrix_missing_columns(
    user: &str,
    folded: &mut [TracedRecord],
    plans: &PlanSet,
) -> Result<(), EngineError> {
    for record in folded.iter_mut() {
        for plan in plans.all() {
            for cc in plan.coding_configurations() {
                if cc.coding_mode() != CodingMode::Multiple {
                    continue;
                }
                let Some(key) = cc.analysis_file_key() else {
                    continue;
                };
                let scheme = cc.scheme();

                let raw_present = record
                    .get_str(plan.raw_field())
                    .is_some_and(|s| !s.is_empty());
                if raw_present && scheme.has_control_code(ControlCode::TrueMissing) {
                    let na = scheme.code_with_control_code(ControlCode::TrueMissing)?;
                    record.append_one(
                        format!("{key}{}", na.string_value),
                        Value::String(MATRIX_0.to_string()),
                        Provenance::new(user, CALL_SITE),
                    );
                }

                if !scheme.has_control_code(ControlCode::NotCoded) {
                    continue;
                }
                let nc = scheme.code_with_control_code(ControlCode::NotCoded)?;
                let has_real_column = scheme
                    .codes()
                    .iter()
                    .filter(|code| code.control_code != Some(ControlCode::NotCoded))
                    .any(|code| {
                        record.get_str(&format!("{key}{}", code.string_value))
                            == Some(MATRIX_1)
                    });
                if !has_real_column {
                    record.append_one(
                        format!("{key}{}", nc.string_value),
                        Value::String(MATRIX_1.to_string()),
                        Provenance::new(user, CALL_SITE),
                    );
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_core::Timestamp;
    use proptest::prelude::*;
    use serde_json::json;

    fn prov() -> Provenance {
        Provenance::at(
            "tester",
            "harp_engine::fold::tests",
            Timestamp::parse("2019-04-15T12:00:00Z").unwrap(),
        )
    }

    fn record(entries: &[(&str, &str)]) -> TracedRecord {
        let data = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect();
        TracedRecord::new(data, prov())
    }

    fn spec() -> FoldSpec {
        FoldSpec {
            equal_keys: vec!["uid".to_string(), "gender".to_string()],
            concat_keys: vec!["s01e01_raw".to_string()],
            bool_keys: vec!["consent_withdrawn".to_string()],
            matrix_keys: vec!["s01e01_water".to_string(), "s01e01_food".to_string()],
        }
    }

    #[test]
    fn one_output_per_respondent_in_first_seen_order() {
        let records = vec![
            record(&[("uid", "u2"), ("gender", "male")]),
            record(&[("uid", "u1"), ("gender", "female")]),
            record(&[("uid", "u2"), ("gender", "male")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(folded.len(), 2);
        assert_eq!(folded[0].uid(), Some("u2"));
        assert_eq!(folded[1].uid(), Some("u1"));
    }

    #[test]
    fn assert_equal_agreeing_values_fold() {
        let records = vec![
            record(&[("uid", "u1"), ("gender", "female")]),
            record(&[("uid", "u1"), ("gender", "female")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(folded[0].get_str("gender"), Some("female"));
    }

    #[test]
    fn assert_equal_conflict_is_fatal_and_names_the_key() {
        let records = vec![
            record(&[("uid", "u1"), ("gender", "female")]),
            record(&[("uid", "u1"), ("gender", "male")]),
        ];
        let err = fold_records("tester", &records, &spec()).unwrap_err();
        match err {
            EngineError::ValueConflict {
                group_id,
                key,
                left,
                right,
            } => {
                assert_eq!(group_id, "u1");
                assert_eq!(key, "gender");
                assert_eq!(left, "female");
                assert_eq!(right, "male");
            }
            other => panic!("expected ValueConflict, got {other}"),
        }
    }

    #[test]
    fn assert_equal_true_missing_yields_to_concrete() {
        let records = vec![
            record(&[("uid", "u1"), ("gender", "female")]),
            record(&[("uid", "u1"), ("gender", "NA")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(folded[0].get_str("gender"), Some("female"));
    }

    #[test]
    fn assert_equal_all_missing_folds_to_missing() {
        let records = vec![
            record(&[("uid", "u1"), ("gender", "NA")]),
            record(&[("uid", "u1"), ("gender", "NA")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(folded[0].get_str("gender"), Some("NA"));
    }

    #[test]
    fn assert_equal_stop_dominates() {
        let records = vec![
            record(&[("uid", "u1"), ("gender", "female")]),
            record(&[("uid", "u1"), ("gender", "STOP")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(folded[0].get_str("gender"), Some("STOP"));
    }

    #[test]
    fn assert_equal_conflict_still_raises_alongside_stop() {
        let records = vec![
            record(&[("uid", "u1"), ("gender", "female")]),
            record(&[("uid", "u1"), ("gender", "STOP")]),
            record(&[("uid", "u1"), ("gender", "male")]),
        ];
        assert!(matches!(
            fold_records("tester", &records, &spec()),
            Err(EngineError::ValueConflict { .. })
        ));
    }

    #[test]
    fn assert_equal_absent_yields_to_concrete() {
        let records = vec![
            record(&[("uid", "u1")]),
            record(&[("uid", "u1"), ("gender", "female")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(folded[0].get_str("gender"), Some("female"));
    }

    #[test]
    fn concatenate_joins_in_fold_order_skipping_empty() {
        let records = vec![
            record(&[("uid", "u1"), ("s01e01_raw", "no water")]),
            record(&[("uid", "u1"), ("s01e01_raw", "")]),
            record(&[("uid", "u1"), ("s01e01_raw", "also no food")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(
            folded[0].get_str("s01e01_raw"),
            Some("no water also no food")
        );
    }

    #[test]
    fn boolean_or_combination_table() {
        let cases: &[(&[&str], &str)] = &[
            (&["true", "false"], "true"),
            (&["false", "false"], "false"),
            (&["true", "true"], "true"),
            (&["false", "huh"], "ambivalent"),
        ];
        for (cells, expected) in cases {
            let records: Vec<_> = cells
                .iter()
                .map(|&c| record(&[("uid", "u1"), ("consent_withdrawn", c)]))
                .collect();
            let folded = fold_records("tester", &records, &spec()).unwrap();
            assert_eq!(
                folded[0].get_str("consent_withdrawn"),
                Some(*expected),
                "cells: {cells:?}"
            );
        }
    }

    #[test]
    fn matrix_union_ors_each_column_independently() {
        // Message 1 sets water, message 2 sets food; neither sets both.
        let records = vec![
            record(&[("uid", "u1"), ("s01e01_water", "1"), ("s01e01_food", "0")]),
            record(&[("uid", "u1"), ("s01e01_water", "0"), ("s01e01_food", "1")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(folded[0].get_str("s01e01_water"), Some("1"));
        assert_eq!(folded[0].get_str("s01e01_food"), Some("1"));
    }

    #[test]
    fn matrix_union_all_unset_stays_unset() {
        let records = vec![
            record(&[("uid", "u1"), ("s01e01_water", "0")]),
            record(&[("uid", "u1"), ("s01e01_water", "0")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        assert_eq!(folded[0].get_str("s01e01_water"), Some("0"));
    }

    #[test]
    fn unassigned_keys_keep_first_records_value() {
        let records = vec![
            record(&[("uid", "u1"), ("operator", "hormud")]),
            record(&[("uid", "u1"), ("operator", "telesom")]),
        ];
        let folded = fold_records("tester", &records, &spec()).unwrap();
        // "operator" has no fold assignment: deterministic representative.
        assert_eq!(folded[0].get_str("operator"), Some("hormud"));
    }

    #[test]
    fn missing_uid_is_fatal() {
        let records = vec![record(&[("gender", "female")])];
        assert!(matches!(
            fold_records("tester", &records, &spec()),
            Err(EngineError::MissingUid { position: 0 })
        ));
    }

    #[test]
    fn folding_duplicates_matches_folding_deduplicated() {
        let one = record(&[
            ("uid", "u1"),
            ("gender", "female"),
            ("s01e01_raw", "no water"),
            ("consent_withdrawn", "false"),
            ("s01e01_water", "1"),
        ]);
        let once = fold_records("tester", &[one.clone()], &spec()).unwrap();
        let twice = fold_records("tester", &[one.clone(), one], &spec()).unwrap();
        for key in ["uid", "gender", "consent_withdrawn", "s01e01_water"] {
            assert_eq!(once[0].get(key), twice[0].get(key), "key: {key}");
        }
        // Concatenate is the one mode where a duplicate record repeats
        // its contribution; both messages really did say "no water".
        assert_eq!(twice[0].get_str("s01e01_raw"), Some("no water no water"));
    }

    proptest! {
        #[test]
        fn boolean_or_matches_definition(cells in proptest::collection::vec("true|false", 1..8)) {
            let records: Vec<_> = cells
                .iter()
                .map(|c| record(&[("uid", "u1"), ("consent_withdrawn", c.as_str())]))
                .collect();
            let folded = fold_records("tester", &records, &spec()).unwrap();
            let expected = if cells.iter().any(|c| c == "true") { "true" } else { "false" };
            prop_assert_eq!(folded[0].get_str("consent_withdrawn"), Some(expected));
        }

        #[test]
        fn matrix_union_matches_definition(cells in proptest::collection::vec("0|1", 1..8)) {
            let records: Vec<_> = cells
                .iter()
                .map(|c| record(&[("uid", "u1"), ("s01e01_water", c.as_str())]))
                .collect();
            let folded = fold_records("tester", &records, &spec()).unwrap();
            let expected = if cells.iter().any(|c| c == "1") { "1" } else { "0" };
            prop_assert_eq!(folded[0].get_str("s01e01_water"), Some(expected));
        }
    }
}
