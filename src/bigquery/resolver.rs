//! Project resolution.
//!
//! Picks the project for a tool call (explicit argument first, then the
//! configured default) and opens a fresh handle for it.

use crate::bigquery::{ClientFactory, WarehouseClient};
use crate::config::Config;
use crate::error::{BqError, BqResult};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct ClientResolver {
    default_project: Option<String>,
    factory: Arc<dyn ClientFactory>,
}

impl ClientResolver {
    /// Create a resolver with an optional default project.
    pub fn new(default_project: Option<String>, factory: Arc<dyn ClientFactory>) -> Self {
        let default_project = default_project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Self {
            default_project,
            factory,
        }
    }

    /// Create a resolver using the configured default project.
    pub fn from_config(config: &Config, factory: Arc<dyn ClientFactory>) -> Self {
        Self::new(config.default_project(), factory)
    }

    pub fn default_project(&self) -> Option<&str> {
        self.default_project.as_deref()
    }

    /// Pick the project for a call. Blank explicit values count as absent.
    pub fn resolve_project(&self, explicit: Option<&str>) -> BqResult<String> {
        explicit
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or(self.default_project.as_deref())
            .map(String::from)
            .ok_or_else(|| {
                BqError::configuration(
                    "GCP_PROJECT_ID environment variable or project_id parameter is required",
                )
            })
    }

    /// Open a handle for the call. Fails before any engine call when no project resolves.
    pub fn resolve(&self, explicit: Option<&str>) -> BqResult<Box<dyn WarehouseClient>> {
        let project_id = self.resolve_project(explicit)?;
        debug!(project_id = %project_id, "Opening BigQuery handle");
        self.factory.connect(&project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatasetEntry, QueryResultSet, TableDetail, TableEntry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullClient(String);

    #[async_trait]
    impl WarehouseClient for NullClient {
        fn project_id(&self) -> &str {
            &self.0
        }
        async fn run_query(&self, _sql: &str, _max: usize) -> BqResult<QueryResultSet> {
            Ok(QueryResultSet::default())
        }
        async fn list_datasets(&self, _max: usize) -> BqResult<Vec<DatasetEntry>> {
            Ok(Vec::new())
        }
        async fn list_tables(&self, _dataset: &str, _max: usize) -> BqResult<Vec<TableEntry>> {
            Ok(Vec::new())
        }
        async fn get_table(&self, _dataset: &str, _table: &str) -> BqResult<TableDetail> {
            Ok(TableDetail::default())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        connects: AtomicUsize,
    }

    impl ClientFactory for CountingFactory {
        fn connect(&self, project_id: &str) -> BqResult<Box<dyn WarehouseClient>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NullClient(project_id.to_string())))
        }
    }

    #[test]
    fn test_explicit_project_wins() {
        let resolver = ClientResolver::new(
            Some("default-proj".to_string()),
            Arc::new(CountingFactory::default()),
        );
        let client = resolver.resolve(Some("other-proj")).unwrap();
        assert_eq!(client.project_id(), "other-proj");
    }

    #[test]
    fn test_falls_back_to_default() {
        let resolver = ClientResolver::new(
            Some("default-proj".to_string()),
            Arc::new(CountingFactory::default()),
        );
        assert_eq!(resolver.resolve_project(None).unwrap(), "default-proj");
        assert_eq!(resolver.resolve_project(Some("  ")).unwrap(), "default-proj");
    }

    #[test]
    fn test_missing_project_never_connects() {
        let factory = Arc::new(CountingFactory::default());
        let resolver = ClientResolver::new(None, factory.clone());
        let err = resolver.resolve(None).err().unwrap();
        assert_eq!(err.error_type(), "ConfigurationError");
        assert!(err.to_string().contains("project_id"));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blank_default_is_ignored() {
        let resolver =
            ClientResolver::new(Some(" ".to_string()), Arc::new(CountingFactory::default()));
        assert!(resolver.default_project().is_none());
        assert!(resolver.resolve_project(None).is_err());
    }

    #[test]
    fn test_new_handle_per_call() {
        let factory = Arc::new(CountingFactory::default());
        let resolver = ClientResolver::new(Some("p".to_string()), factory.clone());
        resolver.resolve(None).unwrap();
        resolver.resolve(None).unwrap();
        assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
    }
}
