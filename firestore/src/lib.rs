//! Firestore client for enumerating source collections during migration.
//!
//! This crate provides:
//! - [`FirestoreSource`] config enum for choosing between mock, live, and disabled clients
//! - [`DocumentSource`] trait for abstracting source-store access
//! - [`FirestoreClient`] production client that reads from the Firestore REST API
//! - [`MockFirestoreClient`] mock client for testing with pre-configured collections
//!
//! ## Usage with FirestoreSource (Recommended)
//!
//! ```ignore
//! use firestore::{FirestoreConfig, FirestoreSource};
//!
//! // Development/testing: use mock data
//! let mut collections = HashMap::new();
//! collections.insert("templates".to_string(), vec![doc1, doc2]);
//! let source = FirestoreSource::mock(collections).into_source();
//!
//! // Production: read from the hosted REST API
//! let config = FirestoreConfig {
//!     project_id: "my-project".to_string(),
//!     api_key: "AIza...".to_string(),
//! };
//! let source = FirestoreSource::live(config).into_source();
//!
//! let documents = source.list_documents("templates").await?;
//! ```

mod mock;
pub mod value;

pub use mock::MockFirestoreClient;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum FirestoreError {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("firestore returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("source store reads are disabled")]
    Disabled,
}

pub type Result<T> = std::result::Result<T, FirestoreError>;

/// A document read from a source collection.
///
/// The field map is opaque to the migration pipeline: fields are decoded
/// from the REST wire encoding into plain JSON and never mutated after
/// the read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// The source-assigned document id (the final path segment).
    pub id: String,
    /// The document's fields as plain JSON values.
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Connection settings for the hosted Firestore REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: String,
}

/// Trait for reading documents from the source store.
///
/// This trait abstracts the source store to enable dependency injection
/// and mocking for testing. Production code uses [`FirestoreClient`],
/// while tests can use [`MockFirestoreClient`].
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Enumerate every document in the named collection.
    ///
    /// An unknown collection yields an empty list, matching the hosted
    /// API's behavior.
    async fn list_documents(&self, collection: &str) -> Result<Vec<SourceDocument>>;

    /// Fetch a single document by id.
    async fn get_document(&self, collection: &str, id: &str) -> Result<SourceDocument>;
}

/// Production client that reads documents through the Firestore REST API.
///
/// List requests page at [`PAGE_SIZE`] documents and follow
/// `nextPageToken` until the collection is exhausted.
pub struct FirestoreClient {
    base_url: String,
    api_key: String,
    client: ReqwestClient,
}

/// Documents requested per list page.
const PAGE_SIZE: &str = "300";

impl FirestoreClient {
    pub fn new(config: &FirestoreConfig) -> Self {
        FirestoreClient {
            base_url: format!(
                "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
                config.project_id
            ),
            api_key: config.api_key.clone(),
            client: ReqwestClient::new(),
        }
    }

    async fn fetch_page(
        &self,
        collection: &str,
        page_token: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut request = self
            .client
            .get(format!("{}/{}", self.base_url, collection))
            .query(&[("key", self.api_key.as_str()), ("pageSize", PAGE_SIZE)]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FirestoreError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Decode one raw REST document into a [`SourceDocument`].
fn parse_document(raw: &serde_json::Value) -> Result<SourceDocument> {
    let name = raw
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| FirestoreError::Decode("document without a name".to_string()))?;

    // Names are full resource paths; the id is the final segment.
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let mut data = serde_json::Map::new();
    if let Some(fields) = raw.get("fields").and_then(|v| v.as_object()) {
        for (key, wrapped) in fields {
            data.insert(key.clone(), value::decode(wrapped)?);
        }
    }

    Ok(SourceDocument { id, data })
}

#[async_trait]
impl DocumentSource for FirestoreClient {
    async fn list_documents(&self, collection: &str) -> Result<Vec<SourceDocument>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(collection, page_token.as_deref()).await?;

            if let Some(raw_documents) = page.get("documents").and_then(|v| v.as_array()) {
                for raw in raw_documents {
                    documents.push(parse_document(raw)?);
                }
            }

            match page.get("nextPageToken").and_then(|v| v.as_str()) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<SourceDocument> {
        let response = self
            .client
            .get(format!("{}/{}/{}", self.base_url, collection, id))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(FirestoreError::NotFound(format!("{}/{}", collection, id)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FirestoreError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let raw: serde_json::Value = response.json().await?;
        parse_document(&raw)
    }
}

/// Source store with reads switched off.
///
/// Every call fails with [`FirestoreError::Disabled`]. This models the
/// deployment state where the source project has been deactivated but the
/// migration tooling is still installed.
pub struct DisabledSource;

#[async_trait]
impl DocumentSource for DisabledSource {
    async fn list_documents(&self, _collection: &str) -> Result<Vec<SourceDocument>> {
        Err(FirestoreError::Disabled)
    }

    async fn get_document(&self, _collection: &str, _id: &str) -> Result<SourceDocument> {
        Err(FirestoreError::Disabled)
    }
}

/// Configuration for the source data store.
///
/// Use this to explicitly choose between mock, live, and disabled
/// clients, following the same pattern as `StreamSource` in hermes-relay.
#[derive(Debug, Clone)]
pub enum FirestoreSource {
    /// Use a mock client with pre-configured collection → documents mappings.
    Mock(HashMap<String, Vec<SourceDocument>>),

    /// Read from the hosted Firestore REST API.
    Live { config: FirestoreConfig },

    /// Source reads are switched off; every call fails with
    /// [`FirestoreError::Disabled`].
    Disabled,
}

impl FirestoreSource {
    /// Create a mock source with the given collection → documents mappings.
    pub fn mock(collections: HashMap<String, Vec<SourceDocument>>) -> Self {
        Self::Mock(collections)
    }

    /// Create a live source for the given project.
    pub fn live(config: FirestoreConfig) -> Self {
        Self::Live { config }
    }

    /// Create a disabled source.
    pub fn disabled() -> Self {
        Self::Disabled
    }

    /// Create the appropriate [`DocumentSource`] implementation.
    pub fn into_source(self) -> Box<dyn DocumentSource> {
        match self {
            Self::Mock(collections) => Box::new(MockFirestoreClient::with_collections(collections)),
            Self::Live { config } => Box::new(FirestoreClient::new(&config)),
            Self::Disabled => Box::new(DisabledSource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_document_extracts_id_and_fields() {
        let raw = json!({
            "name": "projects/p/databases/(default)/documents/templates/tpl-1",
            "fields": {
                "title": { "stringValue": "Dance transition" },
                "clipCount": { "integerValue": "4" }
            },
            "createTime": "2024-01-10T08:00:00Z",
            "updateTime": "2024-02-01T08:00:00Z"
        });

        let document = parse_document(&raw).unwrap();
        assert_eq!(document.id, "tpl-1");
        assert_eq!(document.data["title"], json!("Dance transition"));
        assert_eq!(document.data["clipCount"], json!(4));
    }

    #[test]
    fn parse_document_without_name_fails() {
        let raw = json!({ "fields": {} });
        let result = parse_document(&raw);
        assert!(matches!(result, Err(FirestoreError::Decode(_))));
    }

    #[tokio::test]
    async fn disabled_source_rejects_reads() {
        let source = FirestoreSource::disabled().into_source();

        let listed = source.list_documents("templates").await;
        assert!(matches!(listed, Err(FirestoreError::Disabled)));

        let fetched = source.get_document("templates", "tpl-1").await;
        assert!(matches!(fetched, Err(FirestoreError::Disabled)));
    }
}
