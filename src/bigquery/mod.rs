//! BigQuery access layer.
//!
//! This module provides engine access functionality:
//! - The `WarehouseClient` / `ClientFactory` seams the tools are written against
//! - Project resolution (`ClientResolver`)
//! - An implementation over `gcp_bigquery_client`
//! - Credential selection (key file or default chain)
//! - Result row decoding

pub mod api;
pub mod client;
pub mod credentials;
pub mod decode;
pub mod resolver;

pub use client::{GcpClient, GcpClientFactory};
pub use credentials::Credentials;
pub use resolver::ClientResolver;

use crate::error::BqResult;
use crate::models::{DatasetEntry, QueryResultSet, TableDetail, TableEntry};
use async_trait::async_trait;

/// A handle bound to one project.
///
/// Every method is a single logical engine call; callers own the handle for the
/// duration of one tool invocation.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// The project this handle is bound to.
    fn project_id(&self) -> &str;

    /// Run a standard-SQL query and wait for it to finish.
    ///
    /// Implementations may stop fetching once `max_results` rows are available;
    /// they may also return more.
    async fn run_query(&self, sql: &str, max_results: usize) -> BqResult<QueryResultSet>;

    /// List up to `max_results` datasets in the project.
    async fn list_datasets(&self, max_results: usize) -> BqResult<Vec<DatasetEntry>>;

    /// List up to `max_results` table summaries in a dataset.
    async fn list_tables(&self, dataset_id: &str, max_results: usize)
    -> BqResult<Vec<TableEntry>>;

    /// Fetch full metadata for one table.
    async fn get_table(&self, dataset_id: &str, table_id: &str) -> BqResult<TableDetail>;
}

/// Creates project-bound handles.
pub trait ClientFactory: Send + Sync {
    fn connect(&self, project_id: &str) -> BqResult<Box<dyn WarehouseClient>>;
}
