//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.
//! Stdout carries protocol frames only; logs go to stderr.

use crate::error::{BqError, BqResult};
use crate::mcp::BigQueryService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// How long in-flight calls get after the first signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(5);

/// How a shutdown window ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownOutcome {
    Drained,
    TimedOut,
    Forced,
}

/// Let `drain` finish after a shutdown request, giving up after `grace` or when `force` fires.
async fn drain_or_force<D, S>(drain: D, grace: Duration, force: S) -> ShutdownOutcome
where
    D: Future,
    S: Future<Output = ()>,
{
    tokio::select! {
        _ = drain => ShutdownOutcome::Drained,
        _ = tokio::time::sleep(grace) => ShutdownOutcome::TimedOut,
        _ = force => ShutdownOutcome::Forced,
    }
}

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, following the MCP protocol specification.
pub struct StdioTransport {
    service: BigQueryService,
}

impl StdioTransport {
    /// Create a new stdio transport serving the given service.
    pub fn new(service: BigQueryService) -> Self {
        Self { service }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> BqResult<()> {
        info!("Starting MCP server with stdio transport");

        let transport = stdio();
        let running_service = self
            .service
            .clone()
            .serve(transport)
            .await
            .map_err(|e| BqError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let waiting = running_service.waiting();
        tokio::pin!(waiting);

        let shutdown_requested = tokio::select! {
            result = &mut waiting => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(BqError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received");
                true
            }
        };

        if shutdown_requested {
            info!(
                timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                "Waiting for in-flight calls (send signal again to force exit)..."
            );
            match drain_or_force(&mut waiting, GRACEFUL_TIMEOUT, wait_for_signal()).await {
                ShutdownOutcome::Drained => info!("Stdio session closed"),
                ShutdownOutcome::TimedOut => warn!("Graceful shutdown timeout, forcing exit"),
                ShutdownOutcome::Forced => warn!("Received second signal, forcing immediate exit"),
            }
            // tokio::select! cannot interrupt a blocking stdin read
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigquery::{ClientFactory, ClientResolver, WarehouseClient};
    use crate::mcp::ServiceOptions;
    use std::sync::Arc;

    struct NoFactory;

    impl ClientFactory for NoFactory {
        fn connect(&self, _project_id: &str) -> BqResult<Box<dyn WarehouseClient>> {
            Err(BqError::internal("not used"))
        }
    }

    #[test]
    fn test_stdio_transport_creation() {
        let resolver = Arc::new(ClientResolver::new(None, Arc::new(NoFactory)));
        let service = BigQueryService::new(resolver, ServiceOptions::default());
        let transport = StdioTransport::new(service);
        assert_eq!(transport.name(), "stdio");
    }

    #[tokio::test]
    async fn test_second_signal_forces_exit() {
        let outcome = drain_or_force(
            std::future::pending::<()>(),
            Duration::from_secs(30),
            async {},
        )
        .await;
        assert_eq!(outcome, ShutdownOutcome::Forced);
    }

    #[tokio::test]
    async fn test_session_drains_before_grace_period() {
        let outcome = drain_or_force(
            async {},
            Duration::from_secs(30),
            std::future::pending::<()>(),
        )
        .await;
        assert_eq!(outcome, ShutdownOutcome::Drained);
    }

    #[tokio::test]
    async fn test_grace_period_expires() {
        let outcome = drain_or_force(
            std::future::pending::<()>(),
            Duration::from_millis(10),
            std::future::pending::<()>(),
        )
        .await;
        assert_eq!(outcome, ShutdownOutcome::TimedOut);
    }
}
