//! In-memory BigQuery stand-in shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bigquery_mcp_server::bigquery::{ClientFactory, ClientResolver, WarehouseClient};
use bigquery_mcp_server::error::{BqError, BqResult};
use bigquery_mcp_server::models::{
    DatasetEntry, FieldSchema, QueryResultSet, Row, TableDetail, TableEntry,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted engine state plus call counters.
#[derive(Default)]
pub struct MockEngine {
    pub rows: Vec<Row>,
    pub total_rows: Option<u64>,
    pub bytes: Option<(i64, i64)>,
    pub datasets: Vec<String>,
    pub tables: Vec<String>,
    pub query_error: Option<BqError>,
    pub list_error: Option<BqError>,
    /// Table whose metadata fetch fails with `notFound`
    pub failing_table: Option<String>,
    pub delay: Option<Duration>,

    pub connects: Mutex<Vec<String>>,
    pub query_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub get_table_calls: AtomicUsize,
    pub last_sql: Mutex<Option<String>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` rows shaped `{"n": i}`, reporting `total` rows in all.
    pub fn with_rows(mut self, count: usize, total: u64) -> Self {
        self.rows = (0..count)
            .map(|i| {
                let mut row = Row::new();
                row.insert("n".to_string(), json!(i as i64));
                row
            })
            .collect();
        self.total_rows = Some(total);
        self
    }

    pub fn with_bytes(mut self, processed: i64, billed: i64) -> Self {
        self.bytes = Some((processed, billed));
        self
    }

    pub fn with_datasets(mut self, ids: &[&str]) -> Self {
        self.datasets = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_tables(mut self, ids: &[&str]) -> Self {
        self.tables = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_query_error(mut self, err: BqError) -> Self {
        self.query_error = Some(err);
        self
    }

    pub fn with_list_error(mut self, err: BqError) -> Self {
        self.list_error = Some(err);
        self
    }

    pub fn with_failing_table(mut self, table_id: &str) -> Self {
        self.failing_table = Some(table_id.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
            + self.list_calls.load(Ordering::SeqCst)
            + self.get_table_calls.load(Ordering::SeqCst)
    }

    pub fn connected_projects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn clone_error(err: &BqError) -> BqError {
    match err {
        BqError::Engine {
            message,
            reason,
            status,
        } => BqError::engine(message.clone(), reason.clone(), *status),
        other => BqError::internal(other.to_string()),
    }
}

pub struct MockFactory {
    pub engine: Arc<MockEngine>,
}

impl ClientFactory for MockFactory {
    fn connect(&self, project_id: &str) -> BqResult<Box<dyn WarehouseClient>> {
        self.engine
            .connects
            .lock()
            .unwrap()
            .push(project_id.to_string());
        Ok(Box::new(MockClient {
            project_id: project_id.to_string(),
            engine: self.engine.clone(),
        }))
    }
}

struct MockClient {
    project_id: String,
    engine: Arc<MockEngine>,
}

#[async_trait]
impl WarehouseClient for MockClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn run_query(&self, sql: &str, _max_results: usize) -> BqResult<QueryResultSet> {
        self.engine.query_calls.fetch_add(1, Ordering::SeqCst);
        *self.engine.last_sql.lock().unwrap() = Some(sql.to_string());
        self.engine.pause().await;
        if let Some(err) = &self.engine.query_error {
            return Err(clone_error(err));
        }

        let mut result = QueryResultSet::new(self.engine.rows.clone());
        if let Some(total) = self.engine.total_rows {
            result = result.with_total_rows(total);
        }
        if let Some((processed, billed)) = self.engine.bytes {
            result = result.with_bytes(processed, billed);
        }
        Ok(result)
    }

    async fn list_datasets(&self, _max_results: usize) -> BqResult<Vec<DatasetEntry>> {
        self.engine.list_calls.fetch_add(1, Ordering::SeqCst);
        self.engine.pause().await;
        if let Some(err) = &self.engine.list_error {
            return Err(clone_error(err));
        }
        Ok(self
            .engine
            .datasets
            .iter()
            .map(|id| DatasetEntry::new(&self.project_id, id).with_location("US"))
            .collect())
    }

    async fn list_tables(&self, dataset_id: &str, _max_results: usize) -> BqResult<Vec<TableEntry>> {
        self.engine.list_calls.fetch_add(1, Ordering::SeqCst);
        self.engine.pause().await;
        if let Some(err) = &self.engine.list_error {
            return Err(clone_error(err));
        }
        Ok(self
            .engine
            .tables
            .iter()
            .map(|id| TableEntry::new(&self.project_id, dataset_id, id).with_type("TABLE"))
            .collect())
    }

    async fn get_table(&self, dataset_id: &str, table_id: &str) -> BqResult<TableDetail> {
        self.engine.get_table_calls.fetch_add(1, Ordering::SeqCst);
        if self.engine.failing_table.as_deref() == Some(table_id) {
            return Err(BqError::engine(
                format!(
                    "Not found: Table {}:{}.{}",
                    self.project_id, dataset_id, table_id
                ),
                "notFound",
                Some(404),
            ));
        }
        if table_id.starts_with("empty") {
            return Ok(TableDetail::default());
        }
        Ok(TableDetail::default()
            .with_description(format!("{} table", table_id))
            .with_size(10, 1024)
            .with_field(FieldSchema::new("id", "INTEGER"))
            .with_field(FieldSchema::new("name", "STRING")))
    }
}

/// Resolver backed by `engine`, with an optional default project.
pub fn resolver(engine: Arc<MockEngine>, default_project: Option<&str>) -> Arc<ClientResolver> {
    Arc::new(ClientResolver::new(
        default_project.map(String::from),
        Arc::new(MockFactory { engine }),
    ))
}
