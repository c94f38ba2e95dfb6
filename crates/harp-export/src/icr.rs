//! # ICR Sample Export
//!
//! Inter-coder reliability review needs a random-but-reproducible sample
//! of each show's messages: two coders label the same sample
//! independently and their agreement is measured. The sample is drawn
//! with a fixed seed so re-running the pipeline reproduces it exactly.

use std::io::Write;

use harp_core::TracedRecord;
use harp_plan::CodingPlan;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::csv::write_row;
use crate::error::ExportError;

/// Sample size used by the radio-survey projects.
pub const ICR_MESSAGES_COUNT: usize = 200;
/// Fixed seed: the sample must be identical across re-runs.
pub const ICR_SEED: u64 = 0;

/// Write a deterministic random sample of the plan's messages as CSV
/// (message id + raw text). Returns the sample size actually drawn.
pub fn export_icr_sample<W: Write>(
    records: &[TracedRecord],
    plan: &CodingPlan,
    count: usize,
    seed: u64,
    writer: &mut W,
) -> Result<usize, ExportError> {
    let candidates: Vec<&TracedRecord> = records
        .iter()
        .filter(|td| td.contains_key(plan.raw_field()))
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let sample: Vec<&&TracedRecord> = candidates
        .choose_multiple(&mut rng, count.min(candidates.len()))
        .collect();

    write_row(writer, [plan.id_field(), plan.raw_field()].into_iter())?;
    for record in &sample {
        let id = record.get_str(plan.id_field()).unwrap_or("");
        let text = record.get_str(plan.raw_field()).unwrap_or("");
        write_row(writer, [id, text].into_iter())?;
    }

    tracing::info!(
        plan = plan.raw_field(),
        sampled = sample.len(),
        candidates = candidates.len(),
        "wrote ICR sample"
    );
    Ok(sample.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_core::{Provenance, Timestamp};
    use harp_plan::{CodingConfiguration, CodingMode, FoldMode};
    use harp_scheme::{Code, CodeScheme};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn plan() -> CodingPlan {
        let scheme = Arc::new(
            CodeScheme::new(
                "Scheme-reasons",
                "reasons",
                "0.1",
                vec![Code::normal("code-a", "a", vec!["a".to_string()])],
            )
            .unwrap(),
        );
        CodingPlan::new(
            "s01e01_raw",
            "s01e01.json",
            FoldMode::Concatenate,
            vec![CodingConfiguration::new(
                "s01e01_coded",
                CodingMode::Multiple,
                FoldMode::MatrixUnion,
                scheme,
            )
            .unwrap()],
        )
        .unwrap()
    }

    fn record(uid: &str, text: Option<&str>) -> TracedRecord {
        let mut data = BTreeMap::new();
        data.insert("uid".to_string(), json!(uid));
        if let Some(text) = text {
            data.insert("s01e01_raw".to_string(), json!(text));
        }
        TracedRecord::new(
            data,
            Provenance::at(
                "tester",
                "harp_export::icr::tests",
                Timestamp::parse("2019-04-15T12:00:00Z").unwrap(),
            ),
        )
    }

    #[test]
    fn sample_is_deterministic() {
        let records: Vec<_> = (0..50)
            .map(|i| record(&format!("u{i}"), Some(&format!("answer {i}"))))
            .collect();
        let plan = plan();

        let mut first = Vec::new();
        export_icr_sample(&records, &plan, 10, ICR_SEED, &mut first).unwrap();
        let mut second = Vec::new();
        export_icr_sample(&records, &plan, 10, ICR_SEED, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sample_clamps_to_candidate_count() {
        let records = vec![
            record("u1", Some("a")),
            record("u2", None),
            record("u3", Some("c")),
        ];
        let mut buffer = Vec::new();
        let drawn = export_icr_sample(&records, &plan(), 200, ICR_SEED, &mut buffer).unwrap();
        assert_eq!(drawn, 2);
        // Header plus two rows.
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
