//! Catalog browsing tools.
//!
//! This module implements the `list_datasets` and `list_tables` MCP tools.
//! Both sort their output by id so results do not depend on engine ordering.

use crate::bigquery::ClientResolver;
use crate::error::{BqError, BqResult};
use crate::models::{DEFAULT_MAX_RESULTS, DatasetEntry, FieldSchema, TableDetail, TableEntry};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

/// Format bytes as human-readable size string.
///
/// Uses binary units (1 KB = 1024 bytes).
///
/// # Examples
///
/// ```
/// use bigquery_mcp_server::tools::schema::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1024), "1 kB");
/// assert_eq!(format_size(1048576), "1 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::WINDOWS)
}

/// Input for the list_datasets tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListDatasetsInput {
    /// GCP project to list. Defaults to the server's configured project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Maximum datasets to return. Default: 100
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

/// Output from the list_datasets tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatasetsOutput {
    /// Datasets sorted by dataset_id
    pub datasets: Vec<DatasetDescriptor>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DatasetDescriptor {
    pub dataset_id: String,
    pub project: String,
    /// `project:dataset`
    pub full_id: String,
    pub friendly_name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// RFC 3339
    pub created: Option<String>,
    /// RFC 3339
    pub modified: Option<String>,
}

impl From<DatasetEntry> for DatasetDescriptor {
    fn from(entry: DatasetEntry) -> Self {
        Self {
            dataset_id: entry.dataset_id,
            project: entry.project_id,
            full_id: entry.full_id,
            friendly_name: entry.friendly_name,
            description: entry.description,
            location: entry.location,
            created: entry.created.map(|dt| dt.to_rfc3339()),
            modified: entry.modified.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Dataset to list tables from
    pub dataset_id: String,
    /// GCP project owning the dataset. Defaults to the server's configured project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Maximum tables to return. Default: 100
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    /// Tables sorted by table_id, with full metadata and schema
    pub tables: Vec<TableDescriptor>,
    pub count: usize,
    pub dataset_id: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableDescriptor {
    pub table_id: String,
    pub project: String,
    pub dataset_id: String,
    /// `project.dataset.table`
    pub full_id: String,
    /// TABLE, VIEW, EXTERNAL, MATERIALIZED_VIEW or SNAPSHOT
    #[serde(rename = "type")]
    pub table_type: Option<String>,
    pub friendly_name: Option<String>,
    pub description: Option<String>,
    /// RFC 3339
    pub created: Option<String>,
    /// RFC 3339
    pub modified: Option<String>,
    pub num_rows: Option<u64>,
    pub num_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_bytes_formatted: Option<String>,
    /// Columns in table order; empty when the table has no schema
    pub schema: Vec<FieldDescriptor>,
}

impl TableDescriptor {
    /// Merge a listing summary with its fetched metadata.
    pub fn from_parts(entry: TableEntry, detail: TableDetail) -> Self {
        Self {
            full_id: entry.full_id(),
            table_id: entry.table_id,
            project: entry.project_id,
            dataset_id: entry.dataset_id,
            table_type: entry.table_type,
            friendly_name: entry.friendly_name,
            description: detail.description,
            created: detail.created.map(|dt| dt.to_rfc3339()),
            modified: detail.modified.map(|dt| dt.to_rfc3339()),
            num_rows: detail.num_rows,
            num_bytes: detail.num_bytes,
            num_bytes_formatted: detail.num_bytes.map(format_size),
            schema: detail.schema.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FieldDescriptor {
    pub name: String,
    /// STRING, INTEGER, FLOAT, BOOLEAN, TIMESTAMP, RECORD, ...
    #[serde(rename = "type")]
    pub field_type: String,
    /// NULLABLE, REQUIRED or REPEATED
    pub mode: String,
    pub description: Option<String>,
    /// Sub-fields of RECORD columns
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
}

impl From<FieldSchema> for FieldDescriptor {
    fn from(field: FieldSchema) -> Self {
        Self {
            name: field.name,
            field_type: field.field_type,
            mode: field.mode.to_string(),
            description: field.description,
            fields: field.fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Handler for catalog tools.
pub struct SchemaToolHandler {
    resolver: Arc<ClientResolver>,
    detail_concurrency: usize,
}

impl SchemaToolHandler {
    /// Create a handler that fetches table metadata one table at a time.
    pub fn new(resolver: Arc<ClientResolver>) -> Self {
        Self::with_detail_concurrency(resolver, 1)
    }

    /// Create a handler allowing up to `detail_concurrency` metadata fetches at once.
    pub fn with_detail_concurrency(resolver: Arc<ClientResolver>, detail_concurrency: usize) -> Self {
        Self {
            resolver,
            detail_concurrency: detail_concurrency.max(1),
        }
    }

    /// Handle the list_datasets tool call.
    pub async fn list_datasets(&self, input: ListDatasetsInput) -> BqResult<ListDatasetsOutput> {
        let client = self.resolver.resolve(input.project_id.as_deref())?;
        let max_results = input.max_results as usize;

        let mut entries = client.list_datasets(max_results).await?;
        entries.truncate(max_results);

        let mut datasets: Vec<DatasetDescriptor> = entries.into_iter().map(Into::into).collect();
        datasets.sort_by(|a, b| a.dataset_id.cmp(&b.dataset_id));

        let count = datasets.len();
        info!(project_id = %client.project_id(), count = count, "Datasets listed");

        Ok(ListDatasetsOutput { datasets, count })
    }

    /// Handle the list_tables tool call.
    ///
    /// Fetches full metadata for every listed table. A failure on any one table
    /// fails the whole call; no partial list is returned.
    pub async fn list_tables(&self, input: ListTablesInput) -> BqResult<ListTablesOutput> {
        let dataset_id = input.dataset_id.trim();
        if dataset_id.is_empty() {
            return Err(BqError::invalid_input("dataset_id must not be empty"));
        }

        let client = self.resolver.resolve(input.project_id.as_deref())?;
        let max_results = input.max_results as usize;
        let start = Instant::now();

        let mut entries = client.list_tables(dataset_id, max_results).await?;
        entries.truncate(max_results);

        let client = client.as_ref();
        let mut tables: Vec<TableDescriptor> = stream::iter(entries)
            .map(move |entry| async move {
                let detail = client.get_table(dataset_id, &entry.table_id).await?;
                Ok::<_, BqError>(TableDescriptor::from_parts(entry, detail))
            })
            .buffered(self.detail_concurrency)
            .try_collect()
            .await?;
        tables.sort_by(|a, b| a.table_id.cmp(&b.table_id));

        let count = tables.len();
        info!(
            project_id = %client.project_id(),
            dataset_id = %dataset_id,
            count = count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tables listed"
        );

        Ok(ListTablesOutput {
            tables,
            count,
            dataset_id: dataset_id.to_string(),
        })
    }
}
