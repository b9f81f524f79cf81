//! BigQuery MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to run queries against Google BigQuery and browse its datasets and tables.

pub mod bigquery;
pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::BqError;
pub use mcp::BigQueryService;
