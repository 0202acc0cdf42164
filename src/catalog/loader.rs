//! Schedulation loading.
//!
//! Reads schedulation definitions from the catalog view, runs each
//! definition's embedded query through the record source and assembles the
//! in-memory [`SchedulationResult`]s the export writer consumes.
//!
//! Failure containment: one broken definition (empty or malformed
//! `query_spec`, failing query) must not sink the batch. Every skip is
//! logged and audited, and the loader carries on with the remaining
//! definitions.

use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::audit::AuditLog;
use crate::catalog::models::SchedulationResult;
use crate::catalog::records::fetch_records;
use crate::error_handling::ExportError;

/// Audit category for schedulations skipped during loading.
const AUDIT_CATEGORY: &str = "export_error";

/// Selection and execution options for one load pass.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Load only the definition with this id. When `None` the loader runs
    /// in daily-batch mode: refresh the view, then take everything flagged
    /// as due today.
    pub filter_id: Option<i64>,
    /// Statement executed before a daily-batch selection to refresh the
    /// backing catalog view (the store-side equivalent of
    /// `REFRESH MATERIALIZED VIEW`). Skipped when `filter_id` is set.
    pub refresh_sql: Option<String>,
    /// Per-query deadline forwarded to the record source.
    pub query_deadline: Option<Duration>,
}

/// Embedded query document carried by each definition.
///
/// `query` is a full SQL statement, executed as-is. It is privileged,
/// caller-trusted content; access to the catalog view is the capability
/// boundary, not this parser.
#[derive(Debug, Deserialize)]
struct QuerySpec {
    query: String,
}

/// Loads every selected schedulation definition and materializes its rows.
///
/// Returns the successfully built results in catalog selection order.
/// An empty selection yields `Ok(vec![])`, not an error. Failures of the
/// selection query itself (or of the view refresh) are not per-definition
/// failures and do propagate.
pub async fn load_schedulations(
    pool: &SqlitePool,
    opts: &LoaderOptions,
    audit: &AuditLog,
) -> Result<Vec<SchedulationResult>, ExportError> {
    let rows = match opts.filter_id {
        Some(id) => {
            sqlx::query(
                "SELECT id, resource_name, file_extension, query_spec
                 FROM all_schedulation
                 WHERE id = ?",
            )
            .bind(id)
            .fetch_all(pool)
            .await?
        }
        None => {
            if let Some(refresh) = opts.refresh_sql.as_deref() {
                debug!("refreshing catalog view");
                sqlx::query(refresh).execute(pool).await?;
            }
            sqlx::query(
                "SELECT id, resource_name, file_extension, query_spec
                 FROM all_schedulation
                 WHERE is_schedulation_day = 1",
            )
            .fetch_all(pool)
            .await?
        }
    };

    let mut results = Vec::with_capacity(rows.len());
    for row in &rows {
        match build_schedulation(pool, row, opts.query_deadline).await {
            Ok(schedulation) => {
                debug!(
                    "loaded schedulation '{}' ({} records, {} fields)",
                    schedulation.resource_name,
                    schedulation.records.len(),
                    schedulation.fields.len()
                );
                results.push(schedulation);
            }
            Err(err) => {
                let resource: String = row
                    .try_get("resource_name")
                    .unwrap_or_else(|_| "unknown".to_string());
                warn!("skipping schedulation '{resource}': {err}");
                if let Err(audit_err) = audit.append(
                    AUDIT_CATEGORY,
                    &format!("schedulation '{resource}' skipped: {err}"),
                ) {
                    warn!("failed to audit skipped schedulation: {audit_err}");
                }
            }
        }
    }

    info!(
        "loaded {} of {} schedulation definitions",
        results.len(),
        rows.len()
    );
    Ok(results)
}

/// Builds one schedulation: parse `query_spec`, run the embedded query,
/// derive fields from the first row, lower-case the extension.
async fn build_schedulation(
    pool: &SqlitePool,
    row: &SqliteRow,
    deadline: Option<Duration>,
) -> Result<SchedulationResult, ExportError> {
    let resource_name: String = row.try_get("resource_name")?;
    let file_extension: String = row.try_get("file_extension")?;
    let raw_spec: Option<String> = row.try_get("query_spec")?;

    let raw_spec = raw_spec.filter(|spec| !spec.trim().is_empty()).ok_or_else(|| {
        ExportError::ConfigurationMissing {
            resource: resource_name.clone(),
            reason: "query_spec is empty".to_string(),
        }
    })?;

    let spec: QuerySpec =
        serde_json::from_str(&raw_spec).map_err(|e| ExportError::ConfigurationMissing {
            resource: resource_name.clone(),
            reason: format!("query_spec is not valid JSON with a 'query' key: {e}"),
        })?;

    if spec.query.trim().is_empty() {
        return Err(ExportError::ConfigurationMissing {
            resource: resource_name,
            reason: "query_spec has an empty 'query' key".to_string(),
        });
    }

    let set = fetch_records(pool, &spec.query, deadline).await?;

    Ok(SchedulationResult {
        resource_name,
        file_extension: file_extension.to_lowercase(),
        fields: set.fields,
        records: set.records,
    })
}
