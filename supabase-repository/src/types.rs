//! Request and result types for migration operations.

use serde::Serialize;

use crate::JsonMap;

/// A user record read from the source identity store.
#[derive(Debug, Clone)]
pub struct SourceUser {
    /// The source-assigned user id.
    pub uid: String,
    /// The account email. Required by the destination identity store.
    pub email: String,
    /// Whether the source considered the email verified.
    pub email_verified: bool,
    /// The user's display name.
    pub display_name: Option<String>,
    /// Optional avatar image URL.
    pub photo_url: Option<String>,
}

/// Request to create an account in the destination identity store.
#[derive(Debug, Clone)]
pub struct NewAuthUser {
    pub email: String,
    /// Throwaway credential generated per request; never logged, never
    /// returned to the caller.
    pub password: String,
    /// Marks the email confirmed on creation so the user is not re-sent a
    /// verification mail.
    pub email_confirm: bool,
    /// Free-form metadata stored alongside the account (display name,
    /// source uid, avatar URL).
    pub user_metadata: JsonMap,
}

/// An account created in the destination identity store.
#[derive(Debug, Clone)]
pub struct CreatedAuthUser {
    pub id: String,
}

/// Outcome of migrating a single record (a document or a user).
///
/// Created once per record, never mutated after creation, and aggregated
/// into summaries. An idempotent skip carries a `message` instead of a
/// `destination_id`.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationOutcome {
    /// The source record id.
    pub id: String,
    /// The source collection the record came from.
    pub collection: String,
    /// The destination table (or identity store) the record went to.
    pub table: String,
    /// Whether the record ended up in the destination (including skips).
    pub success: bool,
    /// The destination-assigned id, when the insert reported one.
    pub destination_id: Option<String>,
    /// Explanation for idempotent skips.
    pub message: Option<String>,
    /// Error text when the record failed.
    pub error: Option<String>,
}

impl MigrationOutcome {
    /// A record that was written to the destination.
    pub fn ok(
        id: impl Into<String>,
        collection: impl Into<String>,
        table: impl Into<String>,
        destination_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            table: table.into(),
            success: true,
            destination_id,
            message: None,
            error: None,
        }
    }

    /// A record that already existed in the destination and was skipped.
    pub fn skipped(
        id: impl Into<String>,
        collection: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            table: table.into(),
            success: true,
            destination_id: None,
            message: Some(message.into()),
            error: None,
        }
    }

    /// A record that failed to migrate.
    pub fn failed(
        id: impl Into<String>,
        collection: impl Into<String>,
        table: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            table: table.into(),
            success: false,
            destination_id: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Summary of migrating one collection, derived by reducing over the
/// per-record outcomes.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    /// The destination table.
    pub table: String,
    /// Total number of records attempted.
    pub total: usize,
    /// Number of records that succeeded (including idempotent skips).
    pub succeeded: usize,
    /// Individual outcomes for each record.
    pub results: Vec<MigrationOutcome>,
}

impl CollectionSummary {
    /// Derive a summary from collected outcomes.
    pub fn from_results(table: impl Into<String>, results: Vec<MigrationOutcome>) -> Self {
        let succeeded = results.iter().filter(|outcome| outcome.success).count();
        Self {
            table: table.into(),
            total: results.len(),
            succeeded,
            results,
        }
    }

    /// A collection migration counts as successful when at least one
    /// record made it across.
    pub fn success(&self) -> bool {
        self.succeeded > 0
    }
}

/// Postgres column types the schema reconciler can add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float8,
    Boolean,
    Timestamptz,
}

impl ColumnType {
    /// Render the Postgres type name for DDL.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Float8 => "float8",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamptz => "timestamptz",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// A destination column the reconciler expects a table to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_skips_as_successes() {
        let results = vec![
            MigrationOutcome::ok("a", "users", "profiles", Some("row-1".to_string())),
            MigrationOutcome::skipped("b", "users", "profiles", "already exists"),
            MigrationOutcome::failed("c", "users", "profiles", "boom"),
        ];

        let summary = CollectionSummary::from_results("profiles", results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert!(summary.success());
    }

    #[test]
    fn empty_summary_is_not_a_success() {
        let summary = CollectionSummary::from_results("profiles", Vec::new());
        assert_eq!(summary.total, 0);
        assert!(!summary.success());
    }

    #[test]
    fn column_types_render_postgres_names() {
        assert_eq!(ColumnType::Text.as_sql(), "text");
        assert_eq!(ColumnType::Integer.as_sql(), "integer");
        assert_eq!(ColumnType::Float8.as_sql(), "float8");
        assert_eq!(ColumnType::Boolean.as_sql(), "boolean");
        assert_eq!(ColumnType::Timestamptz.as_sql(), "timestamptz");
    }
}
