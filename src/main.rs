//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `opendata_export` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use opendata_export::config::Opt;
use opendata_export::initialization::init_logger_with;
use opendata_export::{run_export, ExportConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    let log_level = opt.log_level.clone();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let config = ExportConfig::from(opt);
    let output_dir = config.output_dir.clone();

    match run_export(config).await {
        Ok(report) => {
            println!(
                "✅ Exported {} of {} schedulation{} in {:.1}s - artifacts in {}",
                report.succeeded,
                report.total,
                if report.total == 1 { "" } else { "s" },
                report.elapsed_seconds,
                output_dir.display()
            );
            if report.failed > 0 {
                eprintln!(
                    "⚠️ {} schedulation{} failed - see the audit log for details",
                    report.failed,
                    if report.failed == 1 { "" } else { "s" }
                );
                process::exit(2);
            }
        }
        Err(e) => {
            log::error!("export batch failed: {e:#}");
            process::exit(1);
        }
    }

    Ok(())
}
