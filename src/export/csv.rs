//! CSV serialization.
//!
//! RFC 4180 quoting via the `csv` crate: comma delimiter, double-quote
//! escaping, LF line terminator. A header-only artifact is disallowed, so
//! zero records is an error rather than an empty table.

use std::io;

use crate::catalog::models::SchedulationResult;
use crate::error_handling::ExportError;

use super::scalar_text;

/// Serializes the result as CSV: one header row from `fields`, then one row
/// per record in original order. Fields missing from a record render as
/// empty cells.
pub fn serialize(result: &SchedulationResult) -> Result<Vec<u8>, ExportError> {
    if result.records.is_empty() {
        return Err(ExportError::DataUnavailable(result.resource_name.clone()));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&result.fields)?;

    for record in &result.records {
        let row: Vec<String> = result
            .fields
            .iter()
            .map(|field| record.get(field).map(scalar_text).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn result(fields: &[&str], records: Vec<Value>) -> SchedulationResult {
        SchedulationResult {
            resource_name: "parcheggi".to_string(),
            file_extension: "csv".to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            records: records
                .into_iter()
                .map(|value| match value {
                    Value::Object(record) => record,
                    other => panic!("test records must be objects, got {other}"),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_records_is_data_unavailable() {
        let err = serialize(&result(&["a"], vec![])).expect_err("must fail");
        assert!(matches!(err, ExportError::DataUnavailable(name) if name == "parcheggi"));
    }

    #[test]
    fn test_header_and_one_row() {
        let data = serialize(&result(&["a", "b"], vec![json!({"a": "1", "b": "2"})]))
            .expect("serialize");
        assert_eq!(String::from_utf8(data).expect("utf8"), "a,b\n1,2\n");
    }

    #[test]
    fn test_missing_field_renders_empty_cell() {
        let data = serialize(&result(
            &["a", "b", "c"],
            vec![json!({"a": "1", "b": "2", "c": "3"}), json!({"a": "4", "c": "6"})],
        ))
        .expect("serialize");
        assert_eq!(
            String::from_utf8(data).expect("utf8"),
            "a,b,c\n1,2,3\n4,,6\n"
        );
    }

    #[test]
    fn test_quoting_of_embedded_delimiters() {
        let data = serialize(&result(
            &["name", "note"],
            vec![json!({"name": "centro, nord", "note": "say \"hi\""})],
        ))
        .expect("serialize");
        assert_eq!(
            String::from_utf8(data).expect("utf8"),
            "name,note\n\"centro, nord\",\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_scalar_rendering() {
        let data = serialize(&result(
            &["n", "f", "b", "null"],
            vec![json!({"n": 7, "f": 2.5, "b": true, "null": null})],
        ))
        .expect("serialize");
        assert_eq!(
            String::from_utf8(data).expect("utf8"),
            "n,f,b,null\n7,2.5,true,\n"
        );
    }
}
