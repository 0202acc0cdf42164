//! opendata_export library: scheduled open-data export pipeline
//!
//! This library loads "schedulation" definitions from a relational catalog,
//! executes the SQL each definition carries and serializes the resulting
//! rows into open-data artifacts (CSV, JSON, RDF/XML, GeoJSON), one file per
//! schedulation, with an append-only audit trail.
//!
//! # Example
//!
//! ```no_run
//! use opendata_export::{run_export, ExportConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig {
//!     db_path: std::path::PathBuf::from("./catalog.db"),
//!     output_dir: std::path::PathBuf::from("./artifacts"),
//!     ..Default::default()
//! };
//!
//! let report = run_export(config).await?;
//! println!("Exported {} of {} schedulations", report.succeeded, report.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod audit;
pub mod catalog;
pub mod ckan;
pub mod config;
pub mod error_handling;
pub mod export;
pub mod initialization;

// Re-export public API
pub use config::{ExportConfig, LogFormat, LogLevel};
pub use error_handling::{ErrorKind, ExportError};
pub use run::{run_export, ExportReport};

// Internal run module (contains the batch loop)
mod run {
    use std::path::PathBuf;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use log::{info, warn};
    use strum::IntoEnumIterator;

    use crate::audit::AuditLog;
    use crate::catalog::{init_db_pool_with_path, load_schedulations, LoaderOptions};
    use crate::config::ExportConfig;
    use crate::error_handling::{ErrorKind, ExportStats};
    use crate::export::{self, ExportOptions};

    /// Results of one export batch.
    #[derive(Debug, Clone)]
    pub struct ExportReport {
        /// Number of schedulations loaded from the catalog
        pub total: usize,
        /// Number of artifacts successfully written
        pub succeeded: usize,
        /// Number of schedulations whose export failed
        pub failed: usize,
        /// Paths of the generated artifacts, in batch order
        pub artifacts: Vec<PathBuf>,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs one export batch with the provided configuration.
    ///
    /// This is the main entry point for the library. It connects to the
    /// catalog, loads the selected schedulations and exports each one
    /// sequentially. One bad schedulation must not sink the batch: both the
    /// load phase and the export phase contain per-item failures, log them
    /// and write them to the audit sink, then carry on.
    ///
    /// Only batch-level failures (catalog unreachable, selection query
    /// failing) surface as `Err`; those too leave an audit line, under the
    /// `cli_error` category, before propagating.
    pub async fn run_export(config: ExportConfig) -> Result<ExportReport> {
        let audit = AuditLog::new(&config.log_dir);
        match run_batch(&config, &audit).await {
            Ok(report) => Ok(report),
            Err(err) => {
                if let Err(audit_err) =
                    audit.append("cli_error", &format!("export batch failed: {err:#}"))
                {
                    warn!("failed to audit batch failure: {audit_err}");
                }
                Err(err)
            }
        }
    }

    async fn run_batch(config: &ExportConfig, audit: &AuditLog) -> Result<ExportReport> {
        let started = Instant::now();

        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to initialize catalog pool")?;

        let loader_opts = LoaderOptions {
            filter_id: config.schedulation_id,
            refresh_sql: config.refresh_sql.clone(),
            query_deadline: config.query_timeout,
        };
        let schedulations = load_schedulations(&pool, &loader_opts, audit)
            .await
            .context("Failed to load schedulations")?;

        if schedulations.is_empty() {
            info!("no schedulations due, nothing to export");
        }

        let export_opts = ExportOptions {
            rdf_base_url: config.rdf_base_url.clone(),
            rdf_namespaces: config.rdf_namespaces.clone(),
        };

        let stats = ExportStats::new();
        let mut artifacts = Vec::with_capacity(schedulations.len());
        let mut failed = 0usize;

        for schedulation in &schedulations {
            match export::export(schedulation, &config.output_dir, audit, &export_opts) {
                Ok(path) => {
                    info!(
                        "export completed for '{}': {}",
                        schedulation.resource_name,
                        path.display()
                    );
                    artifacts.push(path);
                }
                Err(err) => {
                    failed += 1;
                    stats.increment(err.kind());
                    warn!(
                        "export failed for '{}': {err}",
                        schedulation.resource_name
                    );
                    if let Err(audit_err) = audit.append(
                        "export_error",
                        &format!(
                            "export failed for '{}': {err}",
                            schedulation.resource_name
                        ),
                    ) {
                        warn!("failed to audit export failure: {audit_err}");
                    }
                }
            }
        }

        log_error_statistics(&stats);

        Ok(ExportReport {
            total: schedulations.len(),
            succeeded: artifacts.len(),
            failed,
            artifacts,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }

    fn log_error_statistics(stats: &ExportStats) {
        for kind in ErrorKind::iter() {
            let count = stats.get_count(kind);
            if count > 0 {
                warn!("{}: {count}", kind.as_str());
            }
        }
    }
}
