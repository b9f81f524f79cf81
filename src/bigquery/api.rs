//! Views over BigQuery API payloads.
//!
//! `gcp_bigquery_client` models are re-read through [`reshape`] into these
//! types, which keep only the fields this server reports. 64-bit integers are
//! strings on the wire; [`int64`] accepts them as strings or numbers.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{BqError, BqResult};
use crate::models::{DatasetEntry, FieldMode, FieldSchema, TableDetail, TableEntry};

/// Re-read a client library model as one of the views in this module.
pub fn reshape<M: Serialize, V: DeserializeOwned>(model: &M) -> BqResult<V> {
    Ok(serde_json::from_value(serde_json::to_value(model)?)?)
}

/// Treat `null` like a missing value.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn int64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        Some(JsonValue::Number(n)) => n.as_i64(),
        _ => None,
    })
}

/// Page of a query result, from `jobs.query` or `jobs.getQueryResults`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    pub job_reference: Option<JobReference>,
    pub schema: Option<TableSchema>,
    #[serde(default, deserialize_with = "nullable")]
    pub rows: Vec<TableRow>,
    #[serde(default, deserialize_with = "int64")]
    pub total_rows: Option<i64>,
    pub page_token: Option<String>,
    pub job_complete: Option<bool>,
}

impl QueryPage {
    pub fn is_complete(&self) -> bool {
        self.job_complete.unwrap_or(false)
    }

    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows.and_then(|n| u64::try_from(n).ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub job_id: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableSchema {
    #[serde(default, deserialize_with = "nullable")]
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub field_type: String,
    pub mode: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub fields: Vec<TableFieldSchema>,
}

impl TableFieldSchema {
    pub fn is_repeated(&self) -> bool {
        self.mode
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("REPEATED"))
    }
}

impl From<TableFieldSchema> for FieldSchema {
    fn from(field: TableFieldSchema) -> Self {
        Self {
            name: field.name,
            field_type: field.field_type,
            mode: field.mode.as_deref().map(FieldMode::parse).unwrap_or_default(),
            description: field.description,
            fields: field.fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableRow {
    #[serde(default, deserialize_with = "nullable")]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: JsonValue,
}

/// Result of `jobs.get`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Job {
    pub status: Option<JobStatus>,
    pub statistics: Option<JobStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub error_result: Option<ErrorProto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatistics {
    #[serde(default, deserialize_with = "int64")]
    pub total_bytes_processed: Option<i64>,
    pub query: Option<QueryStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatistics {
    #[serde(default, deserialize_with = "int64")]
    pub total_bytes_processed: Option<i64>,
    #[serde(default, deserialize_with = "int64")]
    pub total_bytes_billed: Option<i64>,
}

impl Job {
    pub fn bytes_processed(&self) -> Option<i64> {
        let stats = self.statistics.as_ref()?;
        stats
            .query
            .as_ref()
            .and_then(|q| q.total_bytes_processed)
            .or(stats.total_bytes_processed)
    }

    pub fn bytes_billed(&self) -> Option<i64> {
        self.statistics.as_ref()?.query.as_ref()?.total_bytes_billed
    }

    /// The job's terminal error, if it failed.
    pub fn error(&self) -> Option<BqError> {
        let err = self.status.as_ref()?.error_result.as_ref()?;
        Some(BqError::engine(
            err.message.clone().unwrap_or_else(|| "Query job failed".to_string()),
            err.reason.clone().unwrap_or_else(|| "jobFailed".to_string()),
            None,
        ))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorProto {
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// Page of `datasets.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetList {
    #[serde(default, deserialize_with = "nullable")]
    pub datasets: Vec<DatasetListItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListItem {
    pub id: Option<String>,
    pub dataset_reference: DatasetReference,
    pub friendly_name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub project_id: String,
    pub dataset_id: String,
}

impl From<DatasetListItem> for DatasetEntry {
    fn from(item: DatasetListItem) -> Self {
        let mut entry = DatasetEntry::new(
            item.dataset_reference.project_id,
            item.dataset_reference.dataset_id,
        );
        if let Some(id) = item.id.filter(|id| !id.is_empty()) {
            entry.full_id = id;
        }
        entry.friendly_name = item.friendly_name;
        entry.location = item.location.filter(|l| !l.is_empty());
        entry
    }
}

/// Page of `tables.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableList {
    #[serde(default, deserialize_with = "nullable")]
    pub tables: Vec<TableListItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableListItem {
    pub table_reference: TableReference,
    #[serde(rename = "type")]
    pub table_type: Option<String>,
    pub friendly_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl From<TableListItem> for TableEntry {
    fn from(item: TableListItem) -> Self {
        let reference = item.table_reference;
        Self {
            table_id: reference.table_id,
            dataset_id: reference.dataset_id,
            project_id: reference.project_id,
            table_type: item.table_type,
            friendly_name: item.friendly_name,
        }
    }
}

/// Result of `tables.get`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub description: Option<String>,
    #[serde(default, deserialize_with = "int64")]
    pub creation_time: Option<i64>,
    #[serde(default, deserialize_with = "int64")]
    pub last_modified_time: Option<i64>,
    #[serde(default, deserialize_with = "int64")]
    pub num_rows: Option<i64>,
    #[serde(default, deserialize_with = "int64")]
    pub num_bytes: Option<i64>,
    pub schema: Option<TableSchema>,
}

impl From<Table> for TableDetail {
    fn from(table: Table) -> Self {
        Self {
            description: table.description,
            created: table.creation_time.and_then(DateTime::<Utc>::from_timestamp_millis),
            modified: table
                .last_modified_time
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            num_rows: table.num_rows.and_then(|n| u64::try_from(n).ok()),
            num_bytes: table.num_bytes.and_then(|n| u64::try_from(n).ok()),
            schema: table
                .schema
                .map(|s| s.fields.into_iter().map(Into::into).collect())
                .unwrap_or_default(),
        }
    }
}
