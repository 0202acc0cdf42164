//! In-memory shapes produced by the schedulation loader.

use serde_json::{Map, Value};

/// One result row: an insertion-ordered mapping from column name to a JSON
/// scalar. `serde_json` is built with `preserve_order`, so key order is the
/// column order of the originating query.
pub type Record = Map<String, Value>;

/// A fully materialized schedulation, ready for the export writer.
///
/// Created by the loader, consumed once, then discarded. `fields` is derived
/// from the first record only (empty when the query returned zero rows); rows
/// with keys missing from `fields` are tolerated by the serializers, which
/// render absent values as empty.
#[derive(Debug, Clone)]
pub struct SchedulationResult {
    /// Resource name; becomes the artifact file stem.
    pub resource_name: String,
    /// Declared extension, lower-cased (csv|json|rdf|geojson).
    pub file_extension: String,
    /// Ordered, unique field names taken from the first record.
    pub fields: Vec<String>,
    /// All rows returned by the definition's query, in query order.
    pub records: Vec<Record>,
}
