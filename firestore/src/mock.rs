//! Mock Firestore client for testing and local development.
//!
//! The `MockFirestoreClient` can be pre-populated with collection →
//! documents mappings, allowing tests to run without network access.
//!
//! # Example
//!
//! ```ignore
//! use firestore::{DocumentSource, MockFirestoreClient, SourceDocument};
//!
//! let client = MockFirestoreClient::new();
//! client.register_document("templates", SourceDocument::new("tpl-1", fields));
//!
//! let documents = client.list_documents("templates").await?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{DocumentSource, FirestoreError, Result, SourceDocument};

/// Mock source store that returns pre-configured documents.
///
/// Use this for testing and local development without network access.
pub struct MockFirestoreClient {
    collections: RwLock<HashMap<String, Vec<SourceDocument>>>,
}

impl MockFirestoreClient {
    /// Create a new empty mock client.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Create a mock client pre-populated with the given collections.
    pub fn with_collections(collections: HashMap<String, Vec<SourceDocument>>) -> Self {
        Self {
            collections: RwLock::new(collections),
        }
    }

    /// Register a document under a collection, appending to any existing
    /// documents.
    pub fn register_document(&self, collection: &str, document: SourceDocument) {
        self.collections
            .write()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    /// Check if a collection has been registered.
    pub fn has_collection(&self, collection: &str) -> bool {
        self.collections.read().unwrap().contains_key(collection)
    }

    /// Number of documents registered under a collection.
    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .map(|documents| documents.len())
            .unwrap_or(0)
    }

    /// Check if the mock has no collections at all.
    pub fn is_empty(&self) -> bool {
        self.collections.read().unwrap().is_empty()
    }
}

impl Default for MockFirestoreClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentSource for MockFirestoreClient {
    async fn list_documents(&self, collection: &str) -> Result<Vec<SourceDocument>> {
        // Unknown collections list as empty, matching the hosted API.
        Ok(self
            .collections
            .read()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<SourceDocument> {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| document.id == id))
            .cloned()
            .ok_or_else(|| FirestoreError::NotFound(format!("{}/{}", collection, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_document(id: &str, title: &str) -> SourceDocument {
        let mut data = serde_json::Map::new();
        data.insert("title".to_string(), json!(title));
        SourceDocument::new(id, data)
    }

    #[tokio::test]
    async fn lists_registered_documents() {
        let client = MockFirestoreClient::new();
        client.register_document("templates", test_document("tpl-1", "One"));
        client.register_document("templates", test_document("tpl-2", "Two"));

        let documents = client.list_documents("templates").await.unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "tpl-1");
        assert_eq!(client.collection_len("templates"), 2);
    }

    #[tokio::test]
    async fn unknown_collection_lists_empty() {
        let client = MockFirestoreClient::new();
        let documents = client.list_documents("missing").await.unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn gets_document_by_id() {
        let client = MockFirestoreClient::new();
        client.register_document("templates", test_document("tpl-1", "One"));

        let document = client.get_document("templates", "tpl-1").await.unwrap();
        assert_eq!(document.data["title"], json!("One"));
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let client = MockFirestoreClient::new();
        client.register_document("templates", test_document("tpl-1", "One"));

        let result = client.get_document("templates", "tpl-9").await;
        match result {
            Err(FirestoreError::NotFound(path)) => assert_eq!(path, "templates/tpl-9"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
