//! # Supabase Repository
//!
//! This crate provides traits and implementations for writing to the
//! migration destination. It includes definitions for errors, interfaces,
//! a Postgres implementation of the table surface (row inserts, schema
//! introspection, and `ALTER TABLE` DDL), and a GoTrue implementation of
//! the auth-admin surface.

pub mod auth;
pub mod errors;
pub mod interfaces;
pub mod mock;
pub mod postgres;
pub mod types;

pub use auth::GoTrueAdmin;
pub use errors::RepositoryError;
pub use interfaces::{AuthAdmin, TableStore};
pub use mock::{MockAuthAdmin, MockTableStore};
pub use postgres::PostgresStore;
pub use types::{
    CollectionSummary, ColumnSpec, ColumnType, CreatedAuthUser, MigrationOutcome, NewAuthUser,
    SourceUser,
};

/// Flat destination row: column name → plain JSON value.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
