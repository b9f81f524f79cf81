//! BigQuery MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to query Google BigQuery and browse its catalog.

use bigquery_mcp_server::bigquery::{ClientResolver, Credentials, GcpClientFactory};
use bigquery_mcp_server::config::{Config, TransportMode};
use bigquery_mcp_server::mcp::{BigQueryService, ServiceOptions};
use bigquery_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs always go to stderr: under the stdio transport stdout is the protocol channel.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    if let Err(message) = config.validate() {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }

    if config.enable_logs {
        init_tracing(&config);
    }

    info!(
        transport = %config.transport,
        "Starting BigQuery MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let credentials = match Credentials::resolve(config.credentials_file().as_deref()) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        credentials = credentials.kind(),
        key_file = ?credentials.path(),
        "Credentials configured"
    );

    let factory = Arc::new(GcpClientFactory::new(
        credentials,
        config.query_timeout_duration(),
    ));
    let resolver = Arc::new(ClientResolver::from_config(&config, factory));
    match resolver.default_project() {
        Some(project) => info!(project_id = %project, "Using default project"),
        None => warn!("GCP_PROJECT_ID is not set; every tool call must pass project_id explicitly"),
    }

    let service = BigQueryService::new(resolver, ServiceOptions::from_config(&config));

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            let transport = StdioTransport::new(service);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                bind_addr = %config.http_bind_addr(),
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                service,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
