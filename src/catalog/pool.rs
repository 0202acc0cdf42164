//! Database connection pool management.
//!
//! The catalog connection is a single long-lived resource acquired once per
//! process invocation and released at process exit; there is no per-batch
//! transaction and no explicit pooling policy beyond sqlx defaults.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

use log::{error, info};
use sqlx::SqlitePool;

use crate::error_handling::ExportError;

/// Initializes and returns the catalog connection pool.
///
/// Creates the database file if it doesn't exist, so a first run against a
/// fresh path yields an empty catalog instead of a connection error.
pub async fn init_db_pool_with_path(db_path: &Path) -> Result<SqlitePool, ExportError> {
    let db_path_str = db_path.to_string_lossy().to_string();
    match OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(&db_path_str)
    {
        Ok(_) => info!("Catalog database file created."),
        Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
            info!("Catalog database file already exists.")
        }
        Err(e) => {
            error!("Failed to create catalog database file: {e}");
            return Err(ExportError::Io(e));
        }
    }

    let pool = SqlitePool::connect(&format!("sqlite:{}", db_path_str))
        .await
        .map_err(|e| {
            error!("Failed to connect to catalog database: {e}");
            ExportError::StoreFailure(e)
        })?;

    Ok(pool)
}
