//! Postgres provider for row inserts, schema introspection, and DDL.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::TableStore;
use crate::types::ColumnSpec;
use crate::JsonMap;

/// Connection pool cap. Migration runs are strictly sequential, so a
/// small pool is plenty.
const PG_MAX_CONNECTIONS: u32 = 5;

/// Destination table store backed by a Postgres connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to Postgres and return a store.
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        info!("Connected to destination Postgres");
        Ok(PostgresStore { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Quote an identifier for interpolation into dynamic SQL.
///
/// Table and column names come from the static mapping table or from
/// transform output keys, never from source-document content, but the
/// quoting still rejects anything outside `[A-Za-z0-9_]`.
fn quote_identifier(name: &str) -> Result<String, RepositoryError> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(RepositoryError::validation(format!(
            "invalid identifier '{}'",
            name
        )));
    }
    Ok(format!("\"{}\"", name))
}

/// Read the `id` column of an inserted row, whatever its type.
fn extract_id(row: &PgRow) -> Option<String> {
    if let Ok(id) = row.try_get::<Uuid, _>("id") {
        return Some(id.to_string());
    }
    if let Ok(id) = row.try_get::<String, _>("id") {
        return Some(id);
    }
    if let Ok(id) = row.try_get::<i64, _>("id") {
        return Some(id.to_string());
    }
    if let Ok(id) = row.try_get::<i32, _>("id") {
        return Some(id.to_string());
    }
    None
}

#[async_trait]
impl TableStore for PostgresStore {
    async fn insert_row(
        &self,
        table: &str,
        row: &JsonMap,
    ) -> Result<Option<String>, RepositoryError> {
        if row.is_empty() {
            return Err(RepositoryError::validation(format!(
                "cannot insert an empty row into \"{}\"",
                table
            )));
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} (", quote_identifier(table)?));

        {
            let mut columns = builder.separated(", ");
            for key in row.keys() {
                columns.push(quote_identifier(key)?);
            }
        }

        builder.push(") VALUES (");

        {
            let mut values = builder.separated(", ");
            for value in row.values() {
                match value {
                    Value::Null => {
                        values.push("NULL");
                    }
                    Value::Bool(boolean) => {
                        values.push_bind(*boolean);
                    }
                    Value::Number(number) => {
                        if let Some(integer) = number.as_i64() {
                            values.push_bind(integer);
                        } else if let Some(float) = number.as_f64() {
                            values.push_bind(float);
                        } else {
                            return Err(RepositoryError::validation(format!(
                                "unrepresentable numeric value {} for \"{}\"",
                                number, table
                            )));
                        }
                    }
                    Value::String(text) => {
                        values.push_bind(text.clone());
                    }
                    // Nested structures land in jsonb columns.
                    nested @ (Value::Array(_) | Value::Object(_)) => {
                        values.push_bind(nested.clone());
                    }
                }
            }
        }

        builder.push(") RETURNING *");

        debug!(table = %table, columns = row.len(), "Inserting row");
        let inserted = builder.build().fetch_optional(&self.pool).await?;

        Ok(inserted.as_ref().and_then(extract_id))
    }

    async fn table_exists(&self, table: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            "SELECT EXISTS (
                 SELECT 1 FROM information_schema.tables
                 WHERE table_schema = 'public' AND table_name = $1
             )",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get(0)?)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>, RepositoryError> {
        if !self.table_exists(table).await? {
            return Err(RepositoryError::TableMissing(table.to_string()));
        }

        let rows = sqlx::query(
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = 'public' AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(row.try_get("column_name")?);
        }
        Ok(columns)
    }

    async fn add_column(&self, table: &str, column: &ColumnSpec) -> Result<(), RepositoryError> {
        let statement = format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
            quote_identifier(table)?,
            quote_identifier(&column.name)?,
            column.column_type.as_sql()
        );

        info!(table = %table, column = %column.name, column_type = %column.column_type, "Adding column");
        sqlx::query(&statement)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::schema(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifiers() {
        assert_eq!(quote_identifier("profiles").unwrap(), "\"profiles\"");
        assert_eq!(quote_identifier("clip_count").unwrap(), "\"clip_count\"");
    }

    #[test]
    fn rejects_hostile_identifiers() {
        assert!(quote_identifier("").is_err());
        assert!(quote_identifier("pro\"files").is_err());
        assert!(quote_identifier("drop table;--").is_err());
        assert!(quote_identifier("with space").is_err());
    }
}
