//! Integration tests for the MCP service layer.

mod common;

use bigquery_mcp_server::mcp::{BigQueryService, ServiceOptions};
use bigquery_mcp_server::tools::query::RunQueryInput;
use bigquery_mcp_server::tools::schema::{ListDatasetsInput, ListTablesInput};
use common::{MockEngine, resolver};
use rmcp::Json;
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn service(engine: Arc<MockEngine>, options: ServiceOptions) -> BigQueryService {
    BigQueryService::new(resolver(engine, Some("p")), options)
}

#[tokio::test]
async fn test_run_query_through_service() {
    let engine = Arc::new(MockEngine::new().with_rows(3, 3).with_bytes(10485760, 10485760));
    let service = service(engine, ServiceOptions::default());

    let Json(response) = service
        .run_query(Parameters(RunQueryInput {
            query: "SELECT n FROM t".to_string(),
            project_id: None,
            max_results: 2,
        }))
        .await;

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["rows_returned"], json!(2));
    assert_eq!(value["total_rows"], json!(3));
    assert_eq!(value["bytes_billed"], json!(10485760));
}

#[tokio::test]
async fn test_list_datasets_through_service() {
    let engine = Arc::new(MockEngine::new().with_datasets(&["z", "m"]));
    let service = service(engine, ServiceOptions::default());

    let Json(response) = service
        .list_datasets(Parameters(ListDatasetsInput {
            project_id: None,
            max_results: 100,
        }))
        .await;

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["count"], json!(2));
    assert_eq!(value["datasets"][0]["dataset_id"], json!("m"));
}

#[tokio::test]
async fn test_list_tables_failure_envelope() {
    let engine = Arc::new(MockEngine::new().with_tables(&["a", "b"]).with_failing_table("b"));
    let service = service(
        engine,
        ServiceOptions {
            table_detail_concurrency: 2,
            ..ServiceOptions::default()
        },
    );

    let Json(response) = service
        .list_tables(Parameters(ListTablesInput {
            dataset_id: "d".to_string(),
            project_id: None,
            max_results: 100,
        }))
        .await;

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["error_type"], json!("notFound"));
    assert!(value.get("tables").is_none());
}

#[tokio::test]
async fn test_slow_call_times_out() {
    let engine = Arc::new(
        MockEngine::new()
            .with_rows(1, 1)
            .with_delay(Duration::from_secs(5)),
    );
    let service = service(
        engine,
        ServiceOptions {
            request_timeout: Duration::from_millis(50),
            ..ServiceOptions::default()
        },
    );

    let Json(response) = service
        .run_query(Parameters(RunQueryInput {
            query: "SELECT 1".to_string(),
            project_id: None,
            max_results: 100,
        }))
        .await;

    assert!(!response.success);
    assert_eq!(response.error_type.as_deref(), Some("Timeout"));
}
