// catalog/mod.rs
// Relational catalog access: pool bootstrap, record source, schedulation loader

pub mod loader;
pub mod models;
pub mod pool;
pub mod records;

// Re-export commonly used items
pub use loader::{load_schedulations, LoaderOptions};
pub use models::{Record, SchedulationResult};
pub use pool::init_db_pool_with_path;
pub use records::{fetch_records, RecordSet};
