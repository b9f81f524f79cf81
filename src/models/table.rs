//! Table-related data models.
//!
//! `TableEntry` is the summary returned by a table listing; `TableDetail` is the
//! full metadata fetched per table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    pub table_id: String,
    pub dataset_id: String,
    pub project_id: String,
    /// "TABLE", "VIEW", "EXTERNAL", "MATERIALIZED_VIEW", "SNAPSHOT"
    pub table_type: Option<String>,
    pub friendly_name: Option<String>,
}

impl TableEntry {
    /// Create a table entry.
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            dataset_id: dataset_id.into(),
            project_id: project_id.into(),
            table_type: None,
            friendly_name: None,
        }
    }

    /// Set the table type.
    pub fn with_type(mut self, table_type: impl Into<String>) -> Self {
        self.table_type = Some(table_type.into());
        self
    }

    /// Set the friendly name.
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Fully-qualified name, `project.dataset.table`.
    pub fn full_id(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDetail {
    pub description: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub num_rows: Option<u64>,
    pub num_bytes: Option<u64>,
    pub schema: Vec<FieldSchema>,
}

impl TableDetail {
    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set row and byte counts.
    pub fn with_size(mut self, num_rows: u64, num_bytes: u64) -> Self {
        self.num_rows = Some(num_rows);
        self.num_bytes = Some(num_bytes);
        self
    }

    /// Set creation and modification timestamps.
    pub fn with_timestamps(mut self, created: DateTime<Utc>, modified: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self.modified = Some(modified);
        self
    }

    /// Append a column.
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.schema.push(field);
        self
    }
}

/// A column in a table schema. RECORD columns carry nested fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    /// Engine type name, e.g. "STRING", "INTEGER", "RECORD"
    pub field_type: String,
    pub mode: FieldMode,
    pub description: Option<String>,
    pub fields: Vec<FieldSchema>,
}

impl FieldSchema {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode: FieldMode::Nullable,
            description: None,
            fields: Vec::new(),
        }
    }

    /// Set the mode.
    pub fn with_mode(mut self, mode: FieldMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set nested fields (RECORD columns).
    pub fn with_fields(mut self, fields: Vec<FieldSchema>) -> Self {
        self.fields = fields;
        self
    }
}

/// Column mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

impl FieldMode {
    /// Parse an engine mode string. Missing or unknown modes are nullable.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "REQUIRED" => Self::Required,
            "REPEATED" => Self::Repeated,
            _ => Self::Nullable,
        }
    }
}

impl std::fmt::Display for FieldMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nullable => write!(f, "NULLABLE"),
            Self::Required => write!(f, "REQUIRED"),
            Self::Repeated => write!(f, "REPEATED"),
        }
    }
}
