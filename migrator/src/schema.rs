//! Destination schema inference and reconciliation.
//!
//! Before data migration proceeds, each mapping's expected column set is
//! inferred by running its transform against the transform's own sample
//! document, and any gap in the destination table is closed with one
//! `ADD COLUMN` per missing column. A missing table is a distinct
//! condition from a table with missing columns.

use chrono::DateTime;
use serde_json::Value;
use tracing::{error, info, warn};

use supabase_repository::{ColumnSpec, ColumnType, RepositoryError, TableStore};

use crate::data::stamp_standing_columns;
use crate::transform::{CollectionMapping, Transform, TransformError};

/// Id handed to transforms during schema inference.
pub const SAMPLE_DOCUMENT_ID: &str = "sample-id";

/// Map one output value to the column type it needs.
pub fn infer_column_type(value: &Value) -> ColumnType {
    match value {
        Value::Bool(_) => ColumnType::Boolean,
        Value::Number(number) if number.is_i64() || number.is_u64() => ColumnType::Integer,
        Value::Number(_) => ColumnType::Float8,
        Value::String(text) if DateTime::parse_from_rfc3339(text).is_ok() => {
            ColumnType::Timestamptz
        }
        // Nulls, plain strings, arrays, and objects all land in text.
        _ => ColumnType::Text,
    }
}

/// Infer the column set a mapping's destination table needs.
pub fn infer_schema(transform: &dyn Transform) -> Result<Vec<ColumnSpec>, TransformError> {
    let sample = transform.sample_document();
    let mut row = transform.apply(&sample, SAMPLE_DOCUMENT_ID)?;

    // The migrator stamps these on every row, so the table needs them too.
    stamp_standing_columns(&mut row, SAMPLE_DOCUMENT_ID);

    Ok(row
        .iter()
        .map(|(name, value)| ColumnSpec::new(name.clone(), infer_column_type(value)))
        .collect())
}

/// Diff the expected columns against the table's actual columns.
///
/// Returns the expected columns absent from the table. A missing table
/// propagates as [`RepositoryError::TableMissing`].
pub async fn validate_schema(
    store: &dyn TableStore,
    table: &str,
    expected: &[ColumnSpec],
) -> Result<Vec<ColumnSpec>, RepositoryError> {
    let actual = store.table_columns(table).await?;
    Ok(expected
        .iter()
        .filter(|spec| !actual.contains(&spec.name))
        .cloned()
        .collect())
}

/// Outcome of one column addition.
#[derive(Debug, Clone)]
pub struct ColumnChange {
    pub column: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome of correcting one table's schema.
#[derive(Debug, Clone)]
pub struct SchemaCorrection {
    /// Conjunction of all column additions.
    pub success: bool,
    pub results: Vec<ColumnChange>,
}

/// Add each missing column, sequentially.
///
/// A failure on one column does not prevent attempting the next. An
/// empty input is a no-op success.
pub async fn correct_schema(
    store: &dyn TableStore,
    table: &str,
    missing: &[ColumnSpec],
) -> SchemaCorrection {
    let mut results = Vec::with_capacity(missing.len());

    for column in missing {
        match store.add_column(table, column).await {
            Ok(()) => results.push(ColumnChange {
                column: column.name.clone(),
                success: true,
                error: None,
            }),
            Err(column_error) => {
                warn!(
                    table = %table,
                    column = %column.name,
                    error = %column_error,
                    "Column addition failed"
                );
                results.push(ColumnChange {
                    column: column.name.clone(),
                    success: false,
                    error: Some(column_error.to_string()),
                });
            }
        }
    }

    SchemaCorrection {
        success: results.iter().all(|change| change.success),
        results,
    }
}

/// Per-table outcome of the reconciliation pass.
#[derive(Debug)]
pub struct TableSchemaReport {
    pub table: String,
    /// Columns the table was missing before correction.
    pub missing_columns: Vec<String>,
    /// Outcomes of the column additions, empty when nothing was missing.
    pub corrections: Vec<ColumnChange>,
    /// Inference or validation error for this table, when one occurred.
    pub error: Option<String>,
}

impl TableSchemaReport {
    pub fn success(&self) -> bool {
        self.error.is_none() && self.corrections.iter().all(|change| change.success)
    }
}

/// Validate and correct every mapping's destination table.
///
/// A transform that fails on its own sample, or a missing table, is
/// recorded as that table's error; the pass continues with the next
/// mapping either way.
pub async fn validate_and_correct_schemas(
    store: &dyn TableStore,
    mappings: &[CollectionMapping],
) -> Vec<TableSchemaReport> {
    let mut reports = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let table = mapping.destination_table.clone();

        let expected = match infer_schema(mapping.transform.as_ref()) {
            Ok(expected) => expected,
            Err(inference_error) => {
                error!(table = %table, error = %inference_error, "Schema inference failed");
                reports.push(TableSchemaReport {
                    table,
                    missing_columns: Vec::new(),
                    corrections: Vec::new(),
                    error: Some(format!("schema inference failed: {}", inference_error)),
                });
                continue;
            }
        };

        let missing = match validate_schema(store, &table, &expected).await {
            Ok(missing) => missing,
            Err(validation_error) => {
                error!(table = %table, error = %validation_error, "Schema validation failed");
                reports.push(TableSchemaReport {
                    table,
                    missing_columns: Vec::new(),
                    corrections: Vec::new(),
                    error: Some(validation_error.to_string()),
                });
                continue;
            }
        };

        let missing_columns: Vec<String> =
            missing.iter().map(|spec| spec.name.clone()).collect();

        let corrections = if missing.is_empty() {
            Vec::new()
        } else {
            info!(
                table = %table,
                columns = %missing_columns.join(", "),
                "Adding missing columns"
            );
            correct_schema(store, &table, &missing).await.results
        };

        reports.push(TableSchemaReport {
            table,
            missing_columns,
            corrections,
            error: None,
        });
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::JsonMap;
    use serde_json::json;

    struct FixtureTransform;

    impl Transform for FixtureTransform {
        fn apply(&self, _document: &JsonMap, _id: &str) -> Result<JsonMap, TransformError> {
            let mut row = JsonMap::new();
            row.insert("title".to_string(), json!("One"));
            row.insert("clip_count".to_string(), json!(3));
            row.insert("duration_seconds".to_string(), json!(2.5));
            row.insert("is_published".to_string(), json!(true));
            row.insert("published_at".to_string(), json!("2024-01-10T08:00:00+00:00"));
            Ok(row)
        }

        fn sample_document(&self) -> JsonMap {
            JsonMap::new()
        }
    }

    #[test]
    fn infers_all_five_column_types() {
        assert_eq!(infer_column_type(&json!("plain")), ColumnType::Text);
        assert_eq!(infer_column_type(&json!(3)), ColumnType::Integer);
        assert_eq!(infer_column_type(&json!(2.5)), ColumnType::Float8);
        assert_eq!(infer_column_type(&json!(true)), ColumnType::Boolean);
        assert_eq!(
            infer_column_type(&json!("2024-01-10T08:00:00Z")),
            ColumnType::Timestamptz
        );
        assert_eq!(infer_column_type(&json!(null)), ColumnType::Text);
        assert_eq!(infer_column_type(&json!([1, 2])), ColumnType::Text);
    }

    #[test]
    fn inferred_schema_includes_standing_columns() {
        let schema = infer_schema(&FixtureTransform).unwrap();
        let names: Vec<&str> = schema.iter().map(|spec| spec.name.as_str()).collect();

        assert!(names.contains(&"title"));
        assert!(names.contains(&"firebase_id"));
        assert!(names.contains(&"created_at"));
        assert!(names.contains(&"updated_at"));

        let published = schema
            .iter()
            .find(|spec| spec.name == "published_at")
            .unwrap();
        assert_eq!(published.column_type, ColumnType::Timestamptz);

        let clip_count = schema.iter().find(|spec| spec.name == "clip_count").unwrap();
        assert_eq!(clip_count.column_type, ColumnType::Integer);
    }
}
