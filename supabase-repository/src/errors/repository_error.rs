//! Unified error type for destination-store operations.
//!
//! Used by the [`TableStore`](crate::interfaces::TableStore) and
//! [`AuthAdmin`](crate::interfaces::AuthAdmin) traits for all destination
//! operations, covering both low-level backend errors (connection, SQL)
//! and migration-level conditions (duplicate accounts, missing tables).

use thiserror::Error;

/// Unified errors from destination-store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Validation error (e.g., an identifier with illegal characters, an
    /// empty row).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failed to establish a connection to the destination.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failed to insert a row.
    #[error("Insert error: {0}")]
    Insert(String),

    /// The account already exists in the destination identity store.
    ///
    /// Callers treat this as an idempotent skip, not a failure.
    #[error("User already registered: {0}")]
    AlreadyRegistered(String),

    /// The auth-admin endpoint rejected a request.
    #[error("Auth admin error (status {status}): {body}")]
    AuthAdmin { status: u16, body: String },

    /// The destination table does not exist.
    ///
    /// Surfaced distinctly from "table exists with missing columns" so
    /// schema reconciliation can tell absence from drift.
    #[error("Table \"{0}\" does not exist in the destination")]
    TableMissing(String),

    /// Schema introspection or DDL failure.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Failed to parse a destination response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error from the underlying database driver.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Error from the underlying HTTP client.
    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RepositoryError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an insert error.
    pub fn insert(msg: impl Into<String>) -> Self {
        Self::Insert(msg.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
