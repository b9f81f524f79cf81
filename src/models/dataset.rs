//! Dataset metadata as returned by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub dataset_id: String,
    pub project_id: String,
    /// Engine-assigned full id, `project:dataset`
    pub full_id: String,
    pub friendly_name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl DatasetEntry {
    /// Create a dataset entry with only its identity set.
    pub fn new(project_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        let dataset_id = dataset_id.into();
        Self {
            full_id: format!("{}:{}", project_id, dataset_id),
            dataset_id,
            project_id,
            friendly_name: None,
            description: None,
            location: None,
            created: None,
            modified: None,
        }
    }

    /// Set the friendly name.
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Set the storage location (e.g. "US", "europe-west1").
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_full_id() {
        let entry = DatasetEntry::new("proj", "sales");
        assert_eq!(entry.full_id, "proj:sales");
        assert!(entry.location.is_none());
    }

    #[test]
    fn test_builder() {
        let entry = DatasetEntry::new("proj", "sales")
            .with_location("EU")
            .with_friendly_name("Sales");
        assert_eq!(entry.location.as_deref(), Some("EU"));
        assert_eq!(entry.friendly_name.as_deref(), Some("Sales"));
    }
}
