//! BigQuery access through `gcp_bigquery_client`.
//!
//! `GcpClientFactory` owns one authenticated library client, built on first
//! use and shared by every handle; each `connect` produces a cheap `GcpClient`
//! bound to one project.

use crate::bigquery::api::{DatasetList, Job, JobReference, QueryPage, Table, TableList, reshape};
use crate::bigquery::decode::decode_rows;
use crate::bigquery::{ClientFactory, Credentials, WarehouseClient};
use crate::error::{BqError, BqResult};
use crate::models::{DatasetEntry, QueryResultSet, TableDetail, TableEntry};
use async_trait::async_trait;
use gcp_bigquery_client::Client;
use gcp_bigquery_client::model::get_query_results_parameters::GetQueryResultsParameters;
use gcp_bigquery_client::model::query_request::QueryRequest;
use gcp_bigquery_client::{dataset, table};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Largest page requested from the query and list endpoints.
const MAX_PAGE_SIZE: usize = 10_000;

/// Library client shared by all handles. A failed build is retried on the next call.
struct SharedClient {
    credentials: Credentials,
    client: OnceCell<Client>,
}

impl SharedClient {
    async fn get(&self) -> BqResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                let client = self.credentials.build().await?;
                info!(credentials = self.credentials.kind(), "BigQuery client ready");
                Ok::<_, BqError>(client)
            })
            .await
    }
}

#[derive(Clone)]
pub struct GcpClientFactory {
    shared: Arc<SharedClient>,
    query_timeout: Duration,
}

impl GcpClientFactory {
    /// Create a factory.
    ///
    /// # Arguments
    ///
    /// * `credentials` - How the library client authenticates
    /// * `query_timeout` - How long BigQuery may hold each query/poll request open
    pub fn new(credentials: Credentials, query_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(SharedClient {
                credentials,
                client: OnceCell::new(),
            }),
            query_timeout,
        }
    }
}

impl ClientFactory for GcpClientFactory {
    fn connect(&self, project_id: &str) -> BqResult<Box<dyn WarehouseClient>> {
        Ok(Box::new(GcpClient {
            project_id: project_id.to_string(),
            shared: self.shared.clone(),
            query_timeout: self.query_timeout,
        }))
    }
}

/// Handle bound to a single project.
pub struct GcpClient {
    project_id: String,
    shared: Arc<SharedClient>,
    query_timeout: Duration,
}

impl GcpClient {
    async fn query_results(
        &self,
        client: &Client,
        job_id: &str,
        location: Option<&str>,
        page_token: Option<String>,
        page_size: usize,
    ) -> BqResult<QueryPage> {
        let params = GetQueryResultsParameters {
            location: location.map(String::from),
            max_results: page_size.try_into().ok(),
            page_token,
            timeout_ms: self.query_timeout.as_millis().try_into().ok(),
            ..Default::default()
        };
        let response = client
            .job()
            .get_query_results(&self.project_id, job_id, params)
            .await?;
        reshape(&response)
    }
}

/// Fetch pages until `max_items` are collected or no page token remains.
///
/// `fetch` receives the token of the page to read (`None` for the first) and
/// returns the page's items with the token of the next page.
pub(crate) async fn collect_pages<T, F, Fut>(max_items: usize, mut fetch: F) -> BqResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = BqResult<(Vec<T>, Option<String>)>>,
{
    let mut items = Vec::new();
    if max_items == 0 {
        return Ok(items);
    }

    let mut page_token = None;
    loop {
        let (page, next) = fetch(page_token.take()).await?;
        items.extend(page);
        match next.filter(|t| !t.is_empty()) {
            Some(token) if items.len() < max_items => page_token = Some(token),
            _ => break,
        }
    }
    items.truncate(max_items);
    Ok(items)
}

#[async_trait]
impl WarehouseClient for GcpClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn run_query(&self, sql: &str, max_results: usize) -> BqResult<QueryResultSet> {
        let client = self.shared.get().await?;
        let start = Instant::now();
        let page_size = max_results.clamp(1, MAX_PAGE_SIZE);

        let mut request = QueryRequest::new(sql.to_string());
        request.max_results = page_size.try_into().ok();
        request.timeout_ms = self.query_timeout.as_millis().try_into().ok();

        let response = client.job().query(&self.project_id, request).await?;
        let mut page: QueryPage = reshape(&response)?;
        let JobReference { job_id, location } = page.job_reference.take().unwrap_or_default();
        let job_id =
            job_id.ok_or_else(|| BqError::internal("Query response is missing a job reference"))?;

        while !page.is_complete() {
            debug!(job_id = %job_id, "Query job still running");
            page = self
                .query_results(client, &job_id, location.as_deref(), None, page_size)
                .await?;
        }

        let schema = page.schema.take().unwrap_or_default().fields;
        let total_rows = page.total_rows();
        let mut rows = decode_rows(&schema, std::mem::take(&mut page.rows));
        let mut page_token = page.page_token.take();

        while rows.len() < max_results {
            let Some(token) = page_token.take().filter(|t| !t.is_empty()) else {
                break;
            };
            let next = self
                .query_results(client, &job_id, location.as_deref(), Some(token), page_size)
                .await?;
            rows.extend(decode_rows(&schema, next.rows));
            page_token = next.page_token;
        }
        rows.truncate(max_results);

        let job = client
            .job()
            .get_job(&self.project_id, &job_id, location.as_deref())
            .await?;
        let stats: Job = reshape(&job)?;
        if let Some(err) = stats.error() {
            return Err(err);
        }

        info!(
            project_id = %self.project_id,
            job_id = %job_id,
            row_count = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query job finished"
        );

        Ok(QueryResultSet {
            rows,
            total_rows,
            bytes_processed: stats.bytes_processed(),
            bytes_billed: stats.bytes_billed(),
        })
    }

    async fn list_datasets(&self, max_results: usize) -> BqResult<Vec<DatasetEntry>> {
        let client = self.shared.get().await?;
        let page_size = max_results.clamp(1, MAX_PAGE_SIZE) as u64;
        let project_id = self.project_id.as_str();

        let datasets = collect_pages(max_results, move |page_token| async move {
            let mut options = dataset::ListOptions::default().max_results(page_size);
            if let Some(token) = page_token {
                options = options.page_token(token);
            }
            let response = client.dataset().list(project_id, options).await?;
            let page: DatasetList = reshape(&response)?;
            Ok::<_, BqError>((page.datasets, page.next_page_token))
        })
        .await?;

        debug!(project_id = %self.project_id, count = datasets.len(), "Listed datasets");
        Ok(datasets.into_iter().map(Into::into).collect())
    }

    async fn list_tables(
        &self,
        dataset_id: &str,
        max_results: usize,
    ) -> BqResult<Vec<TableEntry>> {
        let client = self.shared.get().await?;
        let page_size = max_results.clamp(1, MAX_PAGE_SIZE) as u64;
        let project_id = self.project_id.as_str();

        let tables = collect_pages(max_results, move |page_token| async move {
            let mut options = table::ListOptions::default().max_results(page_size);
            if let Some(token) = page_token {
                options = options.page_token(token);
            }
            let response = client.table().list(project_id, dataset_id, options).await?;
            let page: TableList = reshape(&response)?;
            Ok::<_, BqError>((page.tables, page.next_page_token))
        })
        .await?;

        debug!(
            project_id = %self.project_id,
            dataset_id = %dataset_id,
            count = tables.len(),
            "Listed tables"
        );
        Ok(tables.into_iter().map(Into::into).collect())
    }

    async fn get_table(&self, dataset_id: &str, table_id: &str) -> BqResult<TableDetail> {
        let client = self.shared.get().await?;
        let table = client
            .table()
            .get(&self.project_id, dataset_id, table_id, None)
            .await?;
        let table: Table = reshape(&table)?;
        Ok(table.into())
    }
}
