//! MCP tool implementations.
//!
//! This module contains all BigQuery tool handlers:
//! - `query`: `run_query`, execute a SQL query with a row cap
//! - `schema`: `list_datasets` and `list_tables`
//! - `envelope`: the `{success, ...}` response wrapper shared by all tools

pub mod envelope;
pub mod query;
pub mod schema;

pub use envelope::ToolResponse;
pub use query::{QueryToolHandler, RunQueryInput, RunQueryOutput};
pub use schema::{
    DatasetDescriptor, FieldDescriptor, ListDatasetsInput, ListDatasetsOutput, ListTablesInput,
    ListTablesOutput, SchemaToolHandler, TableDescriptor,
};
