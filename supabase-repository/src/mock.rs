//! Mock destination providers for testing and local development.
//!
//! `MockTableStore` and `MockAuthAdmin` can be pre-populated with tables
//! and existing accounts, and record everything written to them, allowing
//! pipeline tests to run without a database or network access. Both
//! support failure injection so per-record error paths can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::{AuthAdmin, TableStore};
use crate::types::{ColumnSpec, CreatedAuthUser, NewAuthUser};
use crate::JsonMap;

/// Mock table store that records inserts and serves configured schemas.
pub struct MockTableStore {
    tables: RwLock<HashMap<String, Vec<String>>>,
    inserts: RwLock<Vec<(String, JsonMap)>>,
    failing_tables: RwLock<HashSet<String>>,
    failing_columns: RwLock<HashSet<(String, String)>>,
    insert_counter: AtomicU64,
}

impl MockTableStore {
    /// Create an empty store with no tables.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            inserts: RwLock::new(Vec::new()),
            failing_tables: RwLock::new(HashSet::new()),
            failing_columns: RwLock::new(HashSet::new()),
            insert_counter: AtomicU64::new(0),
        }
    }

    /// Register a table with the given columns.
    pub fn register_table(&self, table: &str, columns: &[&str]) {
        self.tables.write().unwrap().insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
    }

    /// Make every insert into the named table fail.
    pub fn fail_inserts_into(&self, table: &str) {
        self.failing_tables.write().unwrap().insert(table.to_string());
    }

    /// Make adding the named column to the named table fail.
    pub fn fail_add_column(&self, table: &str, column: &str) {
        self.failing_columns
            .write()
            .unwrap()
            .insert((table.to_string(), column.to_string()));
    }

    /// Rows inserted into the named table, in insertion order.
    pub fn inserted_rows(&self, table: &str) -> Vec<JsonMap> {
        self.inserts
            .read()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// Total rows inserted across all tables.
    pub fn insert_count(&self) -> usize {
        self.inserts.read().unwrap().len()
    }

    /// Current column set of a registered table.
    pub fn columns_of(&self, table: &str) -> Option<Vec<String>> {
        self.tables.read().unwrap().get(table).cloned()
    }
}

impl Default for MockTableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for MockTableStore {
    async fn insert_row(
        &self,
        table: &str,
        row: &JsonMap,
    ) -> Result<Option<String>, RepositoryError> {
        if self.failing_tables.read().unwrap().contains(table) {
            return Err(RepositoryError::insert(format!(
                "injected failure for \"{}\"",
                table
            )));
        }

        self.inserts
            .write()
            .unwrap()
            .push((table.to_string(), row.clone()));

        let assigned = self.insert_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(format!("row-{}", assigned)))
    }

    async fn table_exists(&self, table: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.read().unwrap().contains_key(table))
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>, RepositoryError> {
        self.tables
            .read()
            .unwrap()
            .get(table)
            .cloned()
            .ok_or_else(|| RepositoryError::TableMissing(table.to_string()))
    }

    async fn add_column(&self, table: &str, column: &ColumnSpec) -> Result<(), RepositoryError> {
        if self
            .failing_columns
            .read()
            .unwrap()
            .contains(&(table.to_string(), column.name.clone()))
        {
            return Err(RepositoryError::schema(format!(
                "injected failure adding \"{}\" to \"{}\"",
                column.name, table
            )));
        }

        let mut tables = self.tables.write().unwrap();
        let columns = tables
            .get_mut(table)
            .ok_or_else(|| RepositoryError::TableMissing(table.to_string()))?;
        if !columns.contains(&column.name) {
            columns.push(column.name.clone());
        }
        Ok(())
    }
}

/// Mock auth admin that records created accounts.
///
/// Creating the same email twice yields [`RepositoryError::AlreadyRegistered`]
/// on the second attempt, matching the destination's uniqueness guard.
pub struct MockAuthAdmin {
    existing_emails: RwLock<HashSet<String>>,
    created: RwLock<Vec<NewAuthUser>>,
    failing_emails: RwLock<HashSet<String>>,
}

impl MockAuthAdmin {
    /// Create an admin with no existing accounts.
    pub fn new() -> Self {
        Self {
            existing_emails: RwLock::new(HashSet::new()),
            created: RwLock::new(Vec::new()),
            failing_emails: RwLock::new(HashSet::new()),
        }
    }

    /// Mark an email as already registered in the destination.
    pub fn register_existing(&self, email: &str) {
        self.existing_emails
            .write()
            .unwrap()
            .insert(email.to_string());
    }

    /// Make creation fail (with a server error) for the given email.
    pub fn fail_for(&self, email: &str) {
        self.failing_emails.write().unwrap().insert(email.to_string());
    }

    /// Accounts created through this admin, in creation order.
    pub fn created_emails(&self) -> Vec<String> {
        self.created
            .read()
            .unwrap()
            .iter()
            .map(|user| user.email.clone())
            .collect()
    }

    /// Number of accounts created (duplicates excluded).
    pub fn created_count(&self) -> usize {
        self.created.read().unwrap().len()
    }
}

impl Default for MockAuthAdmin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthAdmin for MockAuthAdmin {
    async fn create_user(&self, user: &NewAuthUser) -> Result<CreatedAuthUser, RepositoryError> {
        if self.failing_emails.read().unwrap().contains(&user.email) {
            return Err(RepositoryError::AuthAdmin {
                status: 500,
                body: format!("injected failure for {}", user.email),
            });
        }

        {
            let mut existing = self.existing_emails.write().unwrap();
            if existing.contains(&user.email) {
                return Err(RepositoryError::AlreadyRegistered(user.email.clone()));
            }
            existing.insert(user.email.clone());
        }

        self.created.write().unwrap().push(user.clone());
        Ok(CreatedAuthUser {
            id: Uuid::new_v4().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_inserted_rows() {
        let store = MockTableStore::new();
        let mut row = JsonMap::new();
        row.insert("title".to_string(), json!("One"));

        let id = store.insert_row("templates", &row).await.unwrap();
        assert_eq!(id, Some("row-1".to_string()));
        assert_eq!(store.inserted_rows("templates").len(), 1);
        assert_eq!(store.insert_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_reject_inserts() {
        let store = MockTableStore::new();
        store.fail_inserts_into("templates");

        let mut row = JsonMap::new();
        row.insert("title".to_string(), json!("One"));

        let result = store.insert_row("templates", &row).await;
        assert!(matches!(result, Err(RepositoryError::Insert(_))));
        assert_eq!(store.insert_count(), 0);
    }

    #[tokio::test]
    async fn missing_tables_are_distinct_from_empty_ones() {
        let store = MockTableStore::new();
        store.register_table("profiles", &[]);

        assert!(store.table_columns("profiles").await.unwrap().is_empty());
        assert!(matches!(
            store.table_columns("missing").await,
            Err(RepositoryError::TableMissing(_))
        ));
    }

    #[tokio::test]
    async fn add_column_extends_the_schema() {
        let store = MockTableStore::new();
        store.register_table("profiles", &["id"]);

        store
            .add_column("profiles", &ColumnSpec::new("email", crate::ColumnType::Text))
            .await
            .unwrap();
        assert_eq!(
            store.columns_of("profiles").unwrap(),
            vec!["id".to_string(), "email".to_string()]
        );
    }

    #[tokio::test]
    async fn duplicate_emails_are_already_registered() {
        let admin = MockAuthAdmin::new();
        let user = NewAuthUser {
            email: "a@x.com".to_string(),
            password: "pw".to_string(),
            email_confirm: true,
            user_metadata: JsonMap::new(),
        };

        assert!(admin.create_user(&user).await.is_ok());
        assert!(matches!(
            admin.create_user(&user).await,
            Err(RepositoryError::AlreadyRegistered(_))
        ));
        assert_eq!(admin.created_count(), 1);
    }
}
