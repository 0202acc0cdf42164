//! Error types and failure accounting for the export pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::SetLoggerError;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;
use tokio_retry::strategy::ExponentialBackoff;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error type covering every failure mode of the export pipeline.
///
/// Failures while loading a single schedulation are contained by the loader
/// (the definition is skipped and the batch continues); failures while
/// exporting a loaded result are contained by the batch loop. Either way the
/// error is appended to the audit sink before it is swallowed or reported.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The schedulation definition itself is unusable: empty or malformed
    /// `query_spec`, or a missing/empty `query` key.
    #[error("schedulation '{resource}' misconfigured: {reason}")]
    ConfigurationMissing {
        /// Resource name of the offending definition.
        resource: String,
        /// What exactly is wrong with the definition.
        reason: String,
    },

    /// The query produced zero records where at least one is required.
    #[error("no records to export for '{0}'")]
    DataUnavailable(String),

    /// A serializer precondition does not hold (missing required field,
    /// missing base URL).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The `geom` field of a record did not parse to a usable geometry.
    #[error("invalid geometry in '{resource}': {reason}")]
    InvalidGeometry {
        /// Resource name of the schedulation being exported.
        resource: String,
        /// Why the geometry was rejected.
        reason: String,
    },

    /// The declared file extension does not name a supported format.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// A query or connection error from the relational store.
    #[error("store failure: {0}")]
    StoreFailure(#[from] sqlx::Error),

    /// A query exceeded the caller-settable deadline.
    #[error("query deadline of {0:?} exceeded")]
    QueryDeadlineExceeded(Duration),

    /// Filesystem error while writing an artifact or audit entry.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse classification of [`ExportError`] values, used for per-kind
/// failure counters in the batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorKind {
    /// Malformed or empty schedulation definition.
    ConfigurationMissing,
    /// Zero records where at least one is required.
    DataUnavailable,
    /// Serializer precondition violated.
    PreconditionFailed,
    /// Geometry text did not parse to a usable value.
    InvalidGeometry,
    /// Unknown file extension.
    UnsupportedFormat,
    /// Relational store failure (including query deadlines).
    StoreFailure,
    /// Filesystem failure.
    Io,
    /// Serialization failure.
    Serialization,
}

impl ErrorKind {
    /// Human-readable label for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigurationMissing => "configuration missing",
            ErrorKind::DataUnavailable => "data unavailable",
            ErrorKind::PreconditionFailed => "precondition failed",
            ErrorKind::InvalidGeometry => "invalid geometry",
            ErrorKind::UnsupportedFormat => "unsupported format",
            ErrorKind::StoreFailure => "store failure",
            ErrorKind::Io => "I/O failure",
            ErrorKind::Serialization => "serialization failure",
        }
    }
}

impl ExportError {
    /// Maps the error to its counter classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            ExportError::DataUnavailable(_) => ErrorKind::DataUnavailable,
            ExportError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            ExportError::InvalidGeometry { .. } => ErrorKind::InvalidGeometry,
            ExportError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ExportError::StoreFailure(_) | ExportError::QueryDeadlineExceeded(_) => {
                ErrorKind::StoreFailure
            }
            ExportError::Io(_) => ErrorKind::Io,
            ExportError::Json(_) | ExportError::Csv(_) => ErrorKind::Serialization,
        }
    }
}

/// Errors from the remote open-data catalog client.
#[derive(Error, Debug)]
pub enum CkanError {
    /// The configured base URL is not a valid URL.
    #[error("invalid catalog base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// Transport-level HTTP failure.
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered but reported an unsuccessful action.
    #[error("catalog action '{action}' failed: {message}")]
    Api {
        /// The catalog action that was invoked.
        action: String,
        /// Error detail reported by the catalog.
        message: String,
    },

    /// Failure reading a local file to upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-kind failure counters for one batch run.
///
/// Counters are atomic so the struct can be shared behind an `Arc` if the
/// batch loop ever grows concurrent; today the loop is strictly sequential.
pub struct ExportStats {
    errors: HashMap<ErrorKind, AtomicUsize>,
}

impl ExportStats {
    /// Creates a tracker with every kind initialized to zero.
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for kind in ErrorKind::iter() {
            errors.insert(kind, AtomicUsize::new(0));
        }
        ExportStats { errors }
    }

    /// Increments the counter for `kind`.
    pub fn increment(&self, kind: ErrorKind) {
        // All ErrorKind variants are initialized in new(), so unwrap() is safe
        self.errors
            .get(&kind)
            .unwrap()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for `kind`.
    pub fn get_count(&self, kind: ErrorKind) -> usize {
        // All ErrorKind variants are initialized in new(), so unwrap() is safe
        self.errors.get(&kind).unwrap().load(Ordering::SeqCst)
    }
}

impl Default for ExportStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates an exponential backoff retry strategy for remote catalog calls.
///
/// Configured with:
/// - Initial delay: `RETRY_INITIAL_DELAY_MS` milliseconds
/// - Backoff factor: `RETRY_FACTOR` (doubles delay each retry)
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
pub fn get_retry_strategy() -> ExponentialBackoff {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
}
