//! # CSV Writer
//!
//! A minimal tabular writer for the analysis outputs: a fixed, ordered
//! header row, one record per row, string-only cells. Quoting follows
//! RFC 4180: cells containing a comma, quote, or line break are wrapped
//! in double quotes with interior quotes doubled.

use std::borrow::Cow;
use std::io::Write;

use harp_core::TracedRecord;
use serde_json::Value;

use crate::error::ExportError;

/// Write a header row and one row per record.
///
/// Cells resolve each header key against the record: strings verbatim,
/// other JSON values in their compact JSON form, absent keys as the
/// empty string.
pub fn export_records_csv<W: Write>(
    records: &[TracedRecord],
    headers: &[String],
    writer: &mut W,
) -> Result<(), ExportError> {
    write_row(writer, headers.iter().map(String::as_str))?;
    for record in records {
        let cells: Vec<String> = headers
            .iter()
            .map(|key| cell_value(record.get(key)))
            .collect();
        write_row(writer, cells.iter().map(String::as_str))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one CSV row with RFC 4180 quoting and a `\r\n` terminator.
pub fn write_row<'a, W: Write>(
    writer: &mut W,
    cells: impl Iterator<Item = &'a str>,
) -> Result<(), ExportError> {
    let mut first = true;
    for cell in cells {
        if !first {
            writer.write_all(b",")?;
        }
        first = false;
        writer.write_all(escape_cell(cell).as_bytes())?;
    }
    writer.write_all(b"\r\n")?;
    Ok(())
}

fn cell_value(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_cell(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harp_core::{Provenance, Timestamp};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn record(entries: &[(&str, Value)]) -> TracedRecord {
        let data = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>();
        TracedRecord::new(
            data,
            Provenance::at(
                "tester",
                "harp_export::csv::tests",
                Timestamp::parse("2019-04-15T12:00:00Z").unwrap(),
            ),
        )
    }

    fn export(records: &[TracedRecord], headers: &[&str]) -> String {
        let headers: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
        let mut buffer = Vec::new();
        export_records_csv(records, &headers, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn header_row_then_one_row_per_record() {
        let records = vec![
            record(&[("uid", json!("u1")), ("gender", json!("female"))]),
            record(&[("uid", json!("u2"))]),
        ];
        let csv = export(&records, &["uid", "gender"]);
        assert_eq!(csv, "uid,gender\r\nu1,female\r\nu2,\r\n");
    }

    #[test]
    fn cells_with_commas_and_quotes_are_quoted() {
        let records = vec![record(&[
            ("uid", json!("u1")),
            ("s01e01_raw", json!("no water, no \"food\"")),
        ])];
        let csv = export(&records, &["uid", "s01e01_raw"]);
        assert_eq!(
            csv,
            "uid,s01e01_raw\r\nu1,\"no water, no \"\"food\"\"\"\r\n"
        );
    }

    #[test]
    fn newlines_are_quoted() {
        let records = vec![record(&[("text", json!("line one\nline two"))])];
        let csv = export(&records, &["text"]);
        assert_eq!(csv, "text\r\n\"line one\nline two\"\r\n");
    }

    #[test]
    fn absent_keys_export_as_empty_cells() {
        let records = vec![record(&[("uid", json!("u1"))])];
        let csv = export(&records, &["uid", "missing_a", "missing_b"]);
        assert_eq!(csv, "uid,missing_a,missing_b\r\nu1,,\r\n");
    }
}
