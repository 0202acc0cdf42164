//! JSON serialization.
//!
//! Pass-through: the records are serialized verbatim as a pretty-printed
//! JSON array of objects. Non-ASCII text is preserved un-escaped (serde_json
//! never forces ASCII escapes) and no field-presence validation happens.

use crate::catalog::models::SchedulationResult;
use crate::error_handling::ExportError;

/// Serializes the records as a human-readable JSON array.
pub fn serialize(result: &SchedulationResult) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(&result.records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn result(records: Vec<Value>) -> SchedulationResult {
        SchedulationResult {
            resource_name: "musei".to_string(),
            file_extension: "json".to_string(),
            fields: vec![],
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
    fn test_round_trip() {
        let input = result(vec![
            json!({"nome": "Museo Egizio", "visitatori": 853320, "aperto": true}),
            json!({"nome": "GAM", "visitatori": null, "aperto": false}),
        ]);

        let data = serialize(&input).expect("serialize");
        let decoded: Value = serde_json::from_slice(&data).expect("artifact must be valid JSON");
        assert_eq!(decoded, serde_json::to_value(&input.records).expect("to_value"));
    }

    #[test]
    fn test_empty_record_set_is_allowed() {
        let data = serialize(&result(vec![])).expect("serialize");
        assert_eq!(String::from_utf8(data).expect("utf8"), "[]");
    }

    #[test]
    fn test_utf8_preserved_unescaped() {
        let data = serialize(&result(vec![json!({"città": "Torino è qui"})]))
            .expect("serialize");
        let text = String::from_utf8(data).expect("utf8");
        assert!(text.contains("città"), "non-ASCII keys stay readable");
        assert!(text.contains("Torino è qui"), "non-ASCII values stay readable");
        assert!(!text.contains("\\u"), "no forced ASCII escaping");
    }

    #[test]
    fn test_key_order_preserved() {
        let data = serialize(&result(vec![json!({"zeta": 1, "alpha": 2})]))
            .expect("serialize");
        let text = String::from_utf8(data).expect("utf8");
        let zeta = text.find("zeta").expect("zeta present");
        let alpha = text.find("alpha").expect("alpha present");
        assert!(zeta < alpha, "insertion order survives serialization");
    }
}
