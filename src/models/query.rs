//! Query-related data models.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default number of rows, datasets or tables a tool returns.
pub const DEFAULT_MAX_RESULTS: u32 = 100;

/// One result row: column name to value, in schema order.
pub type Row = serde_json::Map<String, JsonValue>;

/// Rows and job statistics reported by the engine for a finished query.
///
/// `rows` may hold more than the caller asked for; the query tool truncates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResultSet {
    pub rows: Vec<Row>,
    /// Total rows in the result as reported by the engine
    pub total_rows: Option<u64>,
    pub bytes_processed: Option<i64>,
    pub bytes_billed: Option<i64>,
}

impl QueryResultSet {
    /// Create a result set with rows and no statistics.
    pub fn new(rows: Vec<Row>) -> Self {
        let total_rows = Some(rows.len() as u64);
        Self {
            rows,
            total_rows,
            bytes_processed: None,
            bytes_billed: None,
        }
    }

    /// Override the engine-reported total.
    pub fn with_total_rows(mut self, total_rows: u64) -> Self {
        self.total_rows = Some(total_rows);
        self
    }

    /// Set processed and billed byte counts.
    pub fn with_bytes(mut self, processed: i64, billed: i64) -> Self {
        self.bytes_processed = Some(processed);
        self.bytes_billed = Some(billed);
        self
    }

    /// Keep at most `max_rows` rows.
    pub fn truncate(&mut self, max_rows: usize) {
        self.rows.truncate(max_rows);
    }
}
