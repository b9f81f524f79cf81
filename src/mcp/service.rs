//! MCP service implementation using rmcp.
//!
//! This module defines the BigQueryService struct with all BigQuery tools
//! exposed via the MCP protocol using the rmcp framework's macros.
//! Every tool answers with a `ToolResponse` envelope, never a protocol error.

use crate::bigquery::ClientResolver;
use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TABLE_DETAIL_CONCURRENCY};
use crate::error::{BqError, BqResult};
use crate::tools::query::{QueryToolHandler, RunQueryInput, RunQueryOutput};
use crate::tools::schema::{
    ListDatasetsInput, ListDatasetsOutput, ListTablesInput, ListTablesOutput, SchemaToolHandler,
};
use crate::tools::ToolResponse;
use rmcp::Json;
use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Per-call limits applied by the service.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    /// Upper bound for one tool call
    pub request_timeout: Duration,
    /// Table metadata fetches list_tables may run at once
    pub table_detail_concurrency: usize,
}

impl ServiceOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout_duration(),
            table_detail_concurrency: config.table_detail_concurrency,
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            table_detail_concurrency: DEFAULT_TABLE_DETAIL_CONCURRENCY,
        }
    }
}

#[derive(Clone)]
pub struct BigQueryService {
    /// Project resolution and handle creation
    resolver: Arc<ClientResolver>,
    options: ServiceOptions,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl BigQueryService {
    /// Create a new BigQueryService instance.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Shared project resolver used by every tool call
    /// * `options` - Timeout and concurrency limits
    pub fn new(resolver: Arc<ClientResolver>, options: ServiceOptions) -> Self {
        Self {
            resolver,
            options,
            tool_router: Self::tool_router(),
        }
    }

    /// Run one tool call under the request timeout and wrap the outcome.
    async fn respond<T, F>(&self, tool: &'static str, call: F) -> ToolResponse<T>
    where
        F: Future<Output = BqResult<T>>,
    {
        let timeout = self.options.request_timeout;
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BqError::timeout(tool, timeout.as_secs())),
        };

        if let Err(e) = &result {
            warn!(
                tool = tool,
                error_type = %e.error_type(),
                retryable = e.is_retryable(),
                error = %e,
                "Tool call failed"
            );
        }
        ToolResponse::from(result)
    }
}

#[tool_router]
impl BigQueryService {
    #[tool(
        description = "Execute a BigQuery standard SQL query and return results.\nReturns at most max_results rows (default 100); total_rows reports the full result size.\nAlso reports bytes_processed and bytes_billed.\nAlways returns {success: ...}; on failure, error and error_type describe what went wrong."
    )]
    pub async fn run_query(
        &self,
        Parameters(input): Parameters<RunQueryInput>,
    ) -> Json<ToolResponse<RunQueryOutput>> {
        let handler = QueryToolHandler::new(self.resolver.clone());
        Json(self.respond("run_query", handler.run_query(input)).await)
    }

    #[tool(
        description = "List datasets in a BigQuery project, sorted by dataset_id.\nproject_id defaults to the server's configured project."
    )]
    pub async fn list_datasets(
        &self,
        Parameters(input): Parameters<ListDatasetsInput>,
    ) -> Json<ToolResponse<ListDatasetsOutput>> {
        let handler = SchemaToolHandler::new(self.resolver.clone());
        Json(self.respond("list_datasets", handler.list_datasets(input)).await)
    }

    #[tool(
        description = "List tables in a BigQuery dataset, sorted by table_id.\nEach table includes type, description, timestamps, row/byte counts and column schema."
    )]
    pub async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Json<ToolResponse<ListTablesOutput>> {
        let handler = SchemaToolHandler::with_detail_concurrency(
            self.resolver.clone(),
            self.options.table_detail_concurrency,
        );
        Json(self.respond("list_tables", handler.list_tables(input)).await)
    }
}

#[tool_handler]
impl ServerHandler for BigQueryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "bigquery-mcp-server".to_owned(),
                title: Some("BigQuery MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "BigQuery tools for running queries and browsing datasets.\n\
                \n\
                ## Workflow\n\
                1. Call `list_datasets` to see datasets in the project\n\
                2. Call `list_tables` with a `dataset_id` to see tables and their columns\n\
                3. Call `run_query` with standard SQL, e.g. `SELECT * FROM `project.dataset.table` LIMIT 10`\n\
                \n\
                ## Projects\n\
                Every tool accepts an optional `project_id`. Without it the server's default project is used.\n\
                If no default is configured, calls fail with error_type `ConfigurationError`.\n\
                \n\
                ## Results\n\
                Every response has a `success` field. On failure, `error` holds the message and\n\
                `error_type` the category (BigQuery reasons such as `invalidQuery`, `notFound`,\n\
                `accessDenied`, `quotaExceeded`, or `Timeout`). Nothing is retried automatically.\n\
                `run_query` returns at most `max_results` rows; compare `rows_returned` with `total_rows`."
                    .to_string(),
            ),
        }
    }
}
