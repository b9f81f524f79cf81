//! Query execution tool.
//!
//! This module implements the `run_query` MCP tool. Results are hard-truncated to
//! `max_results` rows; `total_rows` still reports the engine's full count.

use crate::bigquery::ClientResolver;
use crate::error::{BqError, BqResult};
use crate::models::{DEFAULT_MAX_RESULTS, Row};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

/// Input for the run_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunQueryInput {
    /// Standard SQL query to execute
    pub query: String,
    /// GCP project to run the query in. Defaults to the server's configured project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Maximum rows to return. Default: 100
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

/// Output from the run_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RunQueryOutput {
    /// Result rows as column-name to value maps, in schema column order
    pub rows: Vec<Row>,
    /// Total rows in the result as reported by BigQuery (may exceed rows_returned)
    pub total_rows: Option<u64>,
    /// Number of rows in `rows`
    pub rows_returned: usize,
    /// Bytes scanned by the query
    pub bytes_processed: Option<i64>,
    /// Bytes billed for the query
    pub bytes_billed: Option<i64>,
}

/// Handler for query execution.
pub struct QueryToolHandler {
    resolver: Arc<ClientResolver>,
}

impl QueryToolHandler {
    /// Create a new query tool handler.
    pub fn new(resolver: Arc<ClientResolver>) -> Self {
        Self { resolver }
    }

    /// Handle the run_query tool call.
    pub async fn run_query(&self, input: RunQueryInput) -> BqResult<RunQueryOutput> {
        if input.query.trim().is_empty() {
            return Err(BqError::invalid_input("query must not be empty"));
        }

        let client = self.resolver.resolve(input.project_id.as_deref())?;
        let max_results = input.max_results as usize;

        let mut result = client.run_query(&input.query, max_results).await?;
        result.truncate(max_results);

        let rows_returned = result.rows.len();
        info!(
            project_id = %client.project_id(),
            rows_returned = rows_returned,
            total_rows = ?result.total_rows,
            bytes_processed = ?result.bytes_processed,
            "Query executed"
        );

        Ok(RunQueryOutput {
            rows: result.rows,
            total_rows: result.total_rows,
            rows_returned,
            bytes_processed: result.bytes_processed,
            bytes_billed: result.bytes_billed,
        })
    }
}
