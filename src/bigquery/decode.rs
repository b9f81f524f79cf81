//! Decode BigQuery REST result rows into JSON rows.
//!
//! Cells arrive as `{"f": [{"v": ...}]}` with every scalar encoded as a string.
//! Values are converted according to the column type; anything that does not
//! parse is passed through unchanged.

use chrono::DateTime;
use serde_json::{Number, Value as JsonValue};

use crate::bigquery::api::{TableFieldSchema, TableRow};
use crate::models::Row;

/// Decode a page of rows against the result schema.
pub fn decode_rows(schema: &[TableFieldSchema], rows: Vec<TableRow>) -> Vec<Row> {
    rows.iter().map(|row| decode_record(schema, row)).collect()
}

fn decode_record(fields: &[TableFieldSchema], row: &TableRow) -> Row {
    let mut out = Row::new();
    for (i, field) in fields.iter().enumerate() {
        let value = row
            .f
            .get(i)
            .map(|cell| decode_field(field, &cell.v))
            .unwrap_or(JsonValue::Null);
        out.insert(field.name.clone(), value);
    }
    out
}

fn decode_field(field: &TableFieldSchema, value: &JsonValue) -> JsonValue {
    if value.is_null() {
        return JsonValue::Null;
    }
    if field.is_repeated() {
        return match value {
            // Repeated values are wrapped: [{"v": ...}, ...]
            JsonValue::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| decode_value(field, item.get("v").unwrap_or(item)))
                    .collect(),
            ),
            other => other.clone(),
        };
    }
    decode_value(field, value)
}

fn decode_value(field: &TableFieldSchema, value: &JsonValue) -> JsonValue {
    if value.is_null() {
        return JsonValue::Null;
    }
    match field.field_type.to_ascii_uppercase().as_str() {
        "RECORD" | "STRUCT" => match value.get("f").and_then(JsonValue::as_array) {
            Some(_) => match serde_json::from_value::<TableRow>(value.clone()) {
                Ok(row) => JsonValue::Object(decode_record(&field.fields, &row)),
                Err(_) => value.clone(),
            },
            None => value.clone(),
        },
        "INTEGER" | "INT64" => with_str(value, |s| s.parse::<i64>().ok().map(JsonValue::from)),
        "FLOAT" | "FLOAT64" => with_str(value, |s| {
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(JsonValue::Number)
        }),
        "BOOLEAN" | "BOOL" => with_str(value, |s| match s.to_ascii_lowercase().as_str() {
            "true" => Some(JsonValue::Bool(true)),
            "false" => Some(JsonValue::Bool(false)),
            _ => None,
        }),
        "TIMESTAMP" => with_str(value, decode_timestamp),
        "JSON" => with_str(value, |s| serde_json::from_str(s).ok()),
        _ => value.clone(),
    }
}

/// Apply `parse` to a string value, keeping the original when it does not apply.
fn with_str(value: &JsonValue, parse: impl FnOnce(&str) -> Option<JsonValue>) -> JsonValue {
    value
        .as_str()
        .and_then(parse)
        .unwrap_or_else(|| value.clone())
}

/// Timestamps are float seconds since the epoch, e.g. "1.7000000001E9".
fn decode_timestamp(s: &str) -> Option<JsonValue> {
    let seconds: f64 = s.parse().ok()?;
    let micros = (seconds * 1_000_000.0).round() as i64;
    DateTime::from_timestamp_micros(micros).map(|dt| JsonValue::String(dt.to_rfc3339()))
}
