//! Data models for the BigQuery MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod dataset;
pub mod query;
pub mod table;

// Re-export commonly used types
pub use dataset::DatasetEntry;
pub use query::{DEFAULT_MAX_RESULTS, QueryResultSet, Row};
pub use table::{FieldMode, FieldSchema, TableDetail, TableEntry};
