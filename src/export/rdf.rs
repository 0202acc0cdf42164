//! RDF/XML serialization.
//!
//! Emits one `rdf:Description` per record. The subject URI is the configured
//! base URL concatenated with the record's `identificativo` value; every
//! other field except the reserved `geom` becomes an `ex:`-prefixed child
//! element with XML-escaped text content (via `quick_xml`).
//!
//! Field names are trusted as valid XML local names; a field name containing
//! characters illegal in an XML name produces malformed output. That is a
//! documented limitation of the format, not a runtime failure.

use quick_xml::escape::escape;

use crate::catalog::models::SchedulationResult;
use crate::error_handling::ExportError;

use super::scalar_text;

/// Namespace always declared on the root element.
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Reserved field name whose identifier becomes the subject URI suffix.
const IDENTIFIER_FIELD: &str = "identificativo";

/// Reserved geometry field, never emitted as a child element.
const GEOMETRY_FIELD: &str = "geom";

/// Serializes the result as an RDF/XML document.
///
/// Preconditions (fatal): a non-empty `base_url` and `identificativo`
/// among the result's fields.
pub fn serialize(
    result: &SchedulationResult,
    base_url: Option<&str>,
    namespaces: &[(String, String)],
) -> Result<Vec<u8>, ExportError> {
    let base_url = base_url.filter(|url| !url.is_empty()).ok_or_else(|| {
        ExportError::PreconditionFailed("RDF export requires a base URL".to_string())
    })?;

    if !result.fields.iter().any(|f| f == IDENTIFIER_FIELD) {
        return Err(ExportError::PreconditionFailed(format!(
            "RDF export requires the '{IDENTIFIER_FIELD}' field"
        )));
    }

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<rdf:RDF xmlns:rdf=\"{RDF_NS}\""));
    for (prefix, uri) in namespaces {
        xml.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(uri)));
    }
    xml.push_str(">\n");

    for record in &result.records {
        let id = record.get(IDENTIFIER_FIELD).map(scalar_text).unwrap_or_default();
        xml.push_str(&format!(
            "  <rdf:Description rdf:about=\"{}{}\">\n",
            escape(base_url),
            escape(&id)
        ));

        for (field, value) in record {
            if field == GEOMETRY_FIELD {
                continue;
            }
            let text = scalar_text(value);
            xml.push_str(&format!("    <ex:{field}>{}</ex:{field}>\n", escape(&text)));
        }

        xml.push_str("  </rdf:Description>\n");
    }

    xml.push_str("</rdf:RDF>\n");
    Ok(xml.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn result(fields: &[&str], records: Vec<Value>) -> SchedulationResult {
        SchedulationResult {
            resource_name: "monumenti".to_string(),
            file_extension: "rdf".to_string(),
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
    fn test_missing_base_url_is_precondition_failure() {
        let input = result(&["identificativo"], vec![]);
        for base in [None, Some("")] {
            let err = serialize(&input, base, &[]).expect_err("must fail");
            assert!(matches!(err, ExportError::PreconditionFailed(_)));
        }
    }

    #[test]
    fn test_missing_identifier_field_is_precondition_failure() {
        let input = result(&["name"], vec![json!({"name": "x"})]);
        let err = serialize(&input, Some("http://ex/"), &[]).expect_err("must fail");
        assert!(matches!(err, ExportError::PreconditionFailed(msg)
            if msg.contains("identificativo")));
    }

    #[test]
    fn test_subject_uri_and_escaped_children() {
        let input = result(
            &["identificativo", "name"],
            vec![json!({"identificativo": "42", "name": "A&B"})],
        );
        let data = serialize(&input, Some("http://ex/"), &[]).expect("serialize");
        let text = String::from_utf8(data).expect("utf8");

        assert!(text.contains("rdf:about=\"http://ex/42\""));
        assert!(text.contains("<ex:name>A&amp;B</ex:name>"));
        assert!(
            text.contains("<ex:identificativo>42</ex:identificativo>"),
            "the identifier is also emitted as a child"
        );
    }

    #[test]
    fn test_root_declares_rdf_and_supplied_namespaces() {
        let input = result(&["identificativo"], vec![]);
        let namespaces = vec![
            ("ex".to_string(), "http://example.org/ns#".to_string()),
            ("dc".to_string(), "http://purl.org/dc/elements/1.1/".to_string()),
        ];
        let data = serialize(&input, Some("http://ex/"), &namespaces).expect("serialize");
        let text = String::from_utf8(data).expect("utf8");

        assert!(text.contains(&format!("xmlns:rdf=\"{RDF_NS}\"")));
        assert!(text.contains("xmlns:ex=\"http://example.org/ns#\""));
        assert!(text.contains("xmlns:dc=\"http://purl.org/dc/elements/1.1/\""));
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    }

    #[test]
    fn test_geom_field_is_excluded() {
        let input = result(
            &["identificativo", "geom"],
            vec![json!({"identificativo": "1", "geom": "{\"type\":\"Point\"}"})],
        );
        let data = serialize(&input, Some("http://ex/"), &[]).expect("serialize");
        let text = String::from_utf8(data).expect("utf8");
        assert!(!text.contains("<ex:geom>"));
    }

    #[test]
    fn test_all_xml_special_characters_escaped() {
        let input = result(
            &["identificativo", "note"],
            vec![json!({"identificativo": "1", "note": "<b> \"q\" & 'a'"})],
        );
        let data = serialize(&input, Some("http://ex/"), &[]).expect("serialize");
        let text = String::from_utf8(data).expect("utf8");
        assert!(text.contains("&lt;b&gt;"));
        assert!(text.contains("&amp;"));
        assert!(!text.contains("<b>"));
    }

    #[test]
    fn test_record_missing_identifier_renders_bare_base_url() {
        // fields come from the first row; later heterogeneous rows fall
        // back to absent-as-empty
        let input = result(
            &["identificativo"],
            vec![json!({"identificativo": "1"}), json!({})],
        );
        let data = serialize(&input, Some("http://ex/"), &[]).expect("serialize");
        let text = String::from_utf8(data).expect("utf8");
        assert!(text.contains("rdf:about=\"http://ex/1\""));
        assert!(text.contains("rdf:about=\"http://ex/\""));
    }
}
