//! Export writer: serializes a loaded schedulation into its artifact.
//!
//! Dispatch is a closed enum over the supported formats, so adding a format
//! is a compile-time-checked change and an unknown extension is an error
//! value, never a silent fallback.

mod csv;
mod geojson;
mod json;
mod rdf;

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde_json::Value;

use crate::audit::AuditLog;
use crate::catalog::models::SchedulationResult;
use crate::error_handling::ExportError;

/// Audit category for successful exports.
const AUDIT_CATEGORY: &str = "export";

/// Supported artifact formats, keyed by declared file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Tabular, header + one line per record.
    Csv,
    /// Records serialized verbatim as a JSON array.
    Json,
    /// RDF/XML linked-data document.
    Rdf,
    /// GeoJSON FeatureCollection.
    GeoJson,
}

impl ExportFormat {
    /// Parses a lower-cased file extension.
    pub fn from_extension(extension: &str) -> Result<Self, ExportError> {
        match extension {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "rdf" => Ok(ExportFormat::Rdf),
            "geojson" => Ok(ExportFormat::GeoJson),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Canonical extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Rdf => "rdf",
            ExportFormat::GeoJson => "geojson",
        }
    }
}

/// Options consumed by the export writer and the RDF serializer.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Base URL prepended to each record's `identificativo` in RDF
    /// exports; required for the rdf format, ignored elsewhere.
    pub rdf_base_url: Option<String>,
    /// Extra `(prefix, uri)` namespaces declared on the RDF root element.
    pub rdf_namespaces: Vec<(String, String)>,
}

/// Serializes `result` into its artifact under `output_dir` and appends an
/// audit entry for the generated file.
///
/// The artifact is `{output_dir}/{resource_name}.{extension}`, overwritten
/// on every run. Errors propagate to the caller; the batch loop decides
/// whether to continue with the remaining schedulations.
pub fn export(
    result: &SchedulationResult,
    output_dir: &Path,
    audit: &AuditLog,
    options: &ExportOptions,
) -> Result<PathBuf, ExportError> {
    let format = ExportFormat::from_extension(&result.file_extension)?;

    let data = match format {
        ExportFormat::Csv => csv::serialize(result)?,
        ExportFormat::Json => json::serialize(result)?,
        ExportFormat::Rdf => rdf::serialize(
            result,
            options.rdf_base_url.as_deref(),
            &options.rdf_namespaces,
        )?,
        ExportFormat::GeoJson => geojson::serialize(result)?,
    };

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.{}", result.resource_name, format.extension()));
    fs::write(&path, data)?;

    if let Err(audit_err) = audit.append(
        AUDIT_CATEGORY,
        &format!(
            "Export {} generated: {}",
            format.extension(),
            path.display()
        ),
    ) {
        warn!("failed to audit export of '{}': {audit_err}", result.resource_name);
    }

    Ok(path)
}

/// Renders a JSON scalar the way the text formats expect: null as empty,
/// strings verbatim, numbers and booleans via their JSON spelling.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn result_with(extension: &str) -> SchedulationResult {
        let record = json!({"a": "1"});
        let Value::Object(record) = record else {
            unreachable!()
        };
        SchedulationResult {
            resource_name: "demo".to_string(),
            file_extension: extension.to_string(),
            fields: vec!["a".to_string()],
            records: vec![record],
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_extension("csv").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_extension("json").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_extension("rdf").unwrap(), ExportFormat::Rdf);
        assert_eq!(
            ExportFormat::from_extension("geojson").unwrap(),
            ExportFormat::GeoJson
        );
    }

    #[test]
    fn test_unknown_extension_is_an_error_value() {
        let err = ExportFormat::from_extension("xlsx").expect_err("must fail");
        assert!(matches!(err, ExportError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn test_export_creates_output_dir_and_artifact() {
        let dir = TempDir::new().expect("temp dir");
        let output_dir = dir.path().join("nested").join("artifacts");
        let audit = AuditLog::new(dir.path().join("logs"));

        let path = export(&result_with("csv"), &output_dir, &audit, &ExportOptions::default())
            .expect("export should succeed");

        assert_eq!(path, output_dir.join("demo.csv"));
        assert!(path.exists());
    }

    #[test]
    fn test_export_unsupported_extension_writes_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let output_dir = dir.path().join("artifacts");
        let audit = AuditLog::new(dir.path().join("logs"));

        let err = export(
            &result_with("xlsx"),
            &output_dir,
            &audit,
            &ExportOptions::default(),
        )
        .expect_err("must fail");
        assert!(matches!(err, ExportError::UnsupportedFormat(_)));
        assert!(!output_dir.exists(), "nothing should be created on failure");
    }

    #[test]
    fn test_export_overwrites_existing_artifact() {
        let dir = TempDir::new().expect("temp dir");
        let output_dir = dir.path().join("artifacts");
        let audit = AuditLog::new(dir.path().join("logs"));
        let result = result_with("json");

        let path = export(&result, &output_dir, &audit, &ExportOptions::default())
            .expect("first export");
        let first = fs::read(&path).expect("read");

        let path = export(&result, &output_dir, &audit, &ExportOptions::default())
            .expect("second export");
        let second = fs::read(&path).expect("read");

        assert_eq!(first, second, "identical input yields byte-identical artifact");
    }
}
