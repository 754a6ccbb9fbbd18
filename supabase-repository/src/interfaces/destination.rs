//! Destination-store traits.
//!
//! These traits abstract the two destination surfaces the migration
//! pipeline writes to: the relational table store (row inserts plus the
//! schema surface the reconciler needs) and the identity store's admin
//! endpoint. Implementations are injected into the pipeline to enable
//! dependency injection and easy testing with mocks.

use async_trait::async_trait;

use crate::errors::RepositoryError;
use crate::types::{ColumnSpec, CreatedAuthUser, NewAuthUser};
use crate::JsonMap;

/// Abstracts the destination table store.
///
/// The schema surface is an explicit part of the trait because the
/// reconciler runs real DDL (`ALTER TABLE … ADD COLUMN`) before data
/// migration proceeds; there is no runtime-introspected client wrapper.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Insert one flat row into the named table.
    ///
    /// Returns the inserted row's `id` when the table exposes one.
    async fn insert_row(
        &self,
        table: &str,
        row: &JsonMap,
    ) -> Result<Option<String>, RepositoryError>;

    /// Check whether the named table exists.
    async fn table_exists(&self, table: &str) -> Result<bool, RepositoryError>;

    /// List the named table's column names.
    ///
    /// A missing table is a distinct [`RepositoryError::TableMissing`],
    /// never an empty column list.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, RepositoryError>;

    /// Add a column to the named table.
    async fn add_column(&self, table: &str, column: &ColumnSpec) -> Result<(), RepositoryError>;
}

/// Abstracts the destination identity store's admin surface.
#[async_trait]
pub trait AuthAdmin: Send + Sync {
    /// Create an account.
    ///
    /// A duplicate email fails with [`RepositoryError::AlreadyRegistered`]
    /// so callers can treat the condition as an idempotent skip.
    async fn create_user(&self, user: &NewAuthUser) -> Result<CreatedAuthUser, RepositoryError>;
}
