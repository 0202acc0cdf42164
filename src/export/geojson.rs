//! GeoJSON serialization.
//!
//! Each record's reserved `geom` field carries a serialized geometry object;
//! it is parsed as JSON and embedded as the feature geometry, with the
//! remaining fields as properties in original order. The whole result is
//! wrapped in a FeatureCollection and pretty-printed with UTF-8 preserved.

use serde_json::{json, Value};

use crate::catalog::models::{Record, SchedulationResult};
use crate::error_handling::ExportError;

/// Reserved field holding the serialized geometry.
const GEOMETRY_FIELD: &str = "geom";

/// Serializes the result as a GeoJSON FeatureCollection.
///
/// Precondition (fatal): `geom` among the result's fields. Per record, a
/// `geom` value whose JSON parse yields a falsy result is rejected — not a
/// strict geometry validation, but the documented contract: null, `false`,
/// `0`, an empty string, array or object (and unparseable text) all fail
/// identically.
pub fn serialize(result: &SchedulationResult) -> Result<Vec<u8>, ExportError> {
    if !result.fields.iter().any(|f| f == GEOMETRY_FIELD) {
        return Err(ExportError::PreconditionFailed(format!(
            "GeoJSON export requires the '{GEOMETRY_FIELD}' field"
        )));
    }

    let mut features = Vec::with_capacity(result.records.len());
    for record in &result.records {
        let geometry = parse_geometry(record, &result.resource_name)?;

        let mut properties = Record::new();
        for (field, value) in record {
            if field != GEOMETRY_FIELD {
                properties.insert(field.clone(), value.clone());
            }
        }

        features.push(json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": properties,
        }));
    }

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    Ok(serde_json::to_vec_pretty(&collection)?)
}

/// Parses one record's `geom` text, rejecting falsy results.
fn parse_geometry(record: &Record, resource: &str) -> Result<Value, ExportError> {
    let invalid = |reason: &str| ExportError::InvalidGeometry {
        resource: resource.to_string(),
        reason: reason.to_string(),
    };

    let parsed = match record.get(GEOMETRY_FIELD) {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(text)) => serde_json::from_str(text).unwrap_or(Value::Null),
        // a non-text geom column still goes through a JSON parse of its
        // textual form, mirroring how the value would arrive off the wire
        Some(other) => serde_json::from_str(&other.to_string()).unwrap_or(Value::Null),
    };

    if is_falsy(&parsed) {
        return Err(invalid("geometry parsed to a falsy value"));
    }
    Ok(parsed)
}

/// Falsy in the loose sense of the export contract: null, false, zero,
/// empty string/array/object.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(fields: &[&str], records: Vec<Value>) -> SchedulationResult {
        SchedulationResult {
            resource_name: "aree_verdi".to_string(),
            file_extension: "geojson".to_string(),
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
    fn test_missing_geom_field_is_precondition_failure() {
        let input = result(&["name"], vec![json!({"name": "x"})]);
        let err = serialize(&input).expect_err("must fail");
        assert!(matches!(err, ExportError::PreconditionFailed(msg) if msg.contains("geom")));
    }

    #[test]
    fn test_point_feature_with_properties() {
        let input = result(
            &["geom", "name"],
            vec![json!({
                "geom": "{\"type\":\"Point\",\"coordinates\":[1,2]}",
                "name": "x",
            })],
        );
        let data = serialize(&input).expect("serialize");
        let decoded: Value = serde_json::from_slice(&data).expect("valid JSON");

        assert_eq!(decoded["type"], "FeatureCollection");
        let features = decoded["features"].as_array().expect("features array");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["type"], "Feature");
        assert_eq!(
            features[0]["geometry"],
            json!({"type": "Point", "coordinates": [1, 2]})
        );
        assert_eq!(features[0]["properties"], json!({"name": "x"}));
    }

    #[test]
    fn test_falsy_geometries_are_rejected_identically() {
        for falsy in ["0", "false", "\"\"", "{}", "[]", "null", "not json at all"] {
            let input = result(&["geom"], vec![json!({ "geom": falsy })]);
            let err = serialize(&input).expect_err("must fail");
            assert!(
                matches!(err, ExportError::InvalidGeometry { .. }),
                "geom={falsy:?} should be InvalidGeometry"
            );
        }
    }

    #[test]
    fn test_record_missing_geom_value_is_invalid_geometry() {
        let input = result(
            &["geom", "name"],
            vec![
                json!({"geom": "{\"type\":\"Point\",\"coordinates\":[0,1]}", "name": "a"}),
                json!({"name": "b"}),
            ],
        );
        let err = serialize(&input).expect_err("must fail");
        assert!(matches!(err, ExportError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_utf8_preserved_in_properties() {
        let input = result(
            &["geom", "città"],
            vec![json!({
                "geom": "{\"type\":\"Point\",\"coordinates\":[7.7,45.1]}",
                "città": "Torino",
            })],
        );
        let data = serialize(&input).expect("serialize");
        let text = String::from_utf8(data).expect("utf8");
        assert!(text.contains("città"));
        assert!(!text.contains("\\u"));
    }
}
