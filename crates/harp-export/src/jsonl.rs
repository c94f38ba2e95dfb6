//! # Traced-Record JSONL Persistence
//!
//! Pipeline stages hand record sets to each other as files: one JSON
//! object per line, full layer history included, so any stage's output
//! can be audited or re-fed to the next stage.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use harp_core::TracedRecord;

use crate::error::ExportError;

/// Write records as one JSON object per line.
pub fn export_jsonl<W: Write>(
    records: &[TracedRecord],
    writer: &mut W,
) -> Result<(), ExportError> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read records from a JSONL stream. Blank lines are skipped.
pub fn import_jsonl<R: BufRead>(reader: R) -> Result<Vec<TracedRecord>, ExportError> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Write records to a JSONL file at `path`.
pub fn export_jsonl_file(records: &[TracedRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    export_jsonl(records, &mut writer)?;
    tracing::info!(records = records.len(), path = %path.display(), "wrote records");
    Ok(())
}

/// Read records from a JSONL file at `path`.
pub fn import_jsonl_file(path: &Path) -> Result<Vec<TracedRecord>, ExportError> {
    let records = import_jsonl(BufReader::new(File::open(path)?))?;
    tracing::info!(records = records.len(), path = %path.display(), "read records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_core::{Provenance, Timestamp};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn record(uid: &str) -> TracedRecord {
        let mut data = BTreeMap::new();
        data.insert("uid".to_string(), json!(uid));
        let mut td = TracedRecord::new(
            data,
            Provenance::at(
                "tester",
                "harp_export::jsonl::tests",
                Timestamp::parse("2019-04-15T12:00:00Z").unwrap(),
            ),
        );
        td.append_one(
            "gender_raw",
            json!("female"),
            Provenance::at(
                "tester",
                "harp_export::jsonl::tests",
                Timestamp::parse("2019-04-15T12:01:00Z").unwrap(),
            ),
        );
        td
    }

    #[test]
    fn roundtrip_preserves_layer_history() {
        let records = vec![record("u1"), record("u2")];
        let mut buffer = Vec::new();
        export_jsonl(&records, &mut buffer).unwrap();

        let parsed = import_jsonl(buffer.as_slice()).unwrap();
        assert_eq!(records, parsed);
        assert_eq!(parsed[0].layers().len(), 2);
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stage.jsonl");
        let records = vec![record("u1")];
        export_jsonl_file(&records, &path).unwrap();
        let parsed = import_jsonl_file(&path).unwrap();
        assert_eq!(records, parsed);
    }

    #[test]
    fn blank_lines_skipped() {
        let parsed = import_jsonl("\n\n".as_bytes()).unwrap();
        assert!(parsed.is_empty());
    }
}
