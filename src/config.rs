//! Configuration types, CLI options and constants.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Default catalog database path (SQLite file).
pub const DB_PATH: &str = "./opendata_catalog.db";

/// Default directory for generated artifacts.
pub const OUTPUT_DIR: &str = "./artifacts";

/// Default base directory for the date-partitioned audit log.
pub const LOG_DIR: &str = "./logs";

// Retry strategy for remote catalog calls
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 20;
/// Maximum number of attempts per remote catalog call
pub const RETRY_MAX_ATTEMPTS: usize = 3;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to
/// most verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// This struct is automatically generated by `clap` from the field
/// attributes. All options have defaults and can be overridden via flags.
///
/// # Examples
///
/// ```bash
/// # Daily batch: refresh the catalog view, export everything due today
/// opendata_export --db-path ./catalog.db --output-dir ./artifacts
///
/// # Export a single schedulation by id
/// opendata_export --schedulation-id 42
///
/// # RDF exports need a base URL and usually a namespace for the ex: prefix
/// opendata_export --rdf-base-url http://dati.example.it/resource/ \
///     --rdf-namespace ex=http://dati.example.it/ontology#
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "opendata_export",
    about = "Exports scheduled open-data resources from a relational catalog."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Catalog database path (SQLite file)
    #[arg(long, value_parser, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Directory where artifacts are written (created if missing)
    #[arg(long, value_parser, default_value = OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Base directory for the date-partitioned audit log
    #[arg(long, value_parser, default_value = LOG_DIR)]
    pub log_dir: PathBuf,

    /// Export only the schedulation with this id, skipping the catalog
    /// view refresh (daily-batch runs omit this flag)
    #[arg(long)]
    pub schedulation_id: Option<i64>,

    /// SQL statement run before a daily-batch selection to refresh the
    /// backing catalog view (e.g. "REFRESH MATERIALIZED VIEW ...")
    #[arg(long)]
    pub refresh_sql: Option<String>,

    /// Per-query deadline in seconds (0 disables the deadline)
    #[arg(long, default_value_t = 0)]
    pub query_timeout_seconds: u64,

    /// Base URL prepended to each record's identifier in RDF exports
    /// (required when any schedulation declares the rdf extension)
    #[arg(long)]
    pub rdf_base_url: Option<String>,

    /// Extra XML namespace declared on the RDF root element, as prefix=uri.
    /// Repeat the flag for multiple namespaces.
    #[arg(long = "rdf-namespace", value_parser = parse_namespace)]
    pub rdf_namespaces: Vec<(String, String)>,
}

/// Parses a `prefix=uri` pair for `--rdf-namespace`.
fn parse_namespace(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((prefix, uri)) if !prefix.is_empty() && !uri.is_empty() => {
            Ok((prefix.to_string(), uri.to_string()))
        }
        _ => Err(format!("expected prefix=uri, got '{raw}'")),
    }
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the library. It can be
/// constructed programmatically without any CLI dependencies; nothing is
/// read from ambient files or the environment.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Catalog database path (SQLite file)
    pub db_path: PathBuf,

    /// Directory where artifacts are written
    pub output_dir: PathBuf,

    /// Base directory for the date-partitioned audit log
    pub log_dir: PathBuf,

    /// Export only the schedulation with this id; `None` means a daily
    /// batch over everything flagged as due today
    pub schedulation_id: Option<i64>,

    /// Statement run before a daily-batch selection to refresh the
    /// backing catalog view
    pub refresh_sql: Option<String>,

    /// Per-query deadline; `None` blocks until the store answers
    pub query_timeout: Option<Duration>,

    /// Base URL for RDF subjects
    pub rdf_base_url: Option<String>,

    /// Extra XML namespaces for the RDF root element
    pub rdf_namespaces: Vec<(String, String)>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DB_PATH),
            output_dir: PathBuf::from(OUTPUT_DIR),
            log_dir: PathBuf::from(LOG_DIR),
            schedulation_id: None,
            refresh_sql: None,
            query_timeout: None,
            rdf_base_url: None,
            rdf_namespaces: Vec::new(),
        }
    }
}

impl From<Opt> for ExportConfig {
    fn from(opt: Opt) -> Self {
        ExportConfig {
            db_path: opt.db_path,
            output_dir: opt.output_dir,
            log_dir: opt.log_dir,
            schedulation_id: opt.schedulation_id,
            refresh_sql: opt.refresh_sql,
            query_timeout: match opt.query_timeout_seconds {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            rdf_base_url: opt.rdf_base_url,
            rdf_namespaces: opt.rdf_namespaces,
        }
    }
}
