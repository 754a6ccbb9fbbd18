//! Document and collection migration.
//!
//! Documents migrate one at a time: transform, stamp the standing
//! columns, insert, record the outcome. A failed document never blocks
//! the next one; a failed collection never blocks the next mapping.
//! There is no partial-collection resume; a re-run re-attempts every
//! document from scratch.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use firestore::DocumentSource;
use supabase_repository::{CollectionSummary, JsonMap, MigrationOutcome, TableStore};

use crate::transform::{CollectionMapping, DefaultTransform, Transform};

/// Stamp the columns every destination row carries, unless the transform
/// already supplied them: the source-document id and the two ISO-8601
/// bookkeeping timestamps.
pub fn stamp_standing_columns(row: &mut JsonMap, source_id: &str) {
    let stamp = Utc::now().to_rfc3339();
    if !row.contains_key("firebase_id") {
        row.insert("firebase_id".to_string(), json!(source_id));
    }
    if !row.contains_key("created_at") || row["created_at"].is_null() {
        row.insert("created_at".to_string(), json!(stamp));
    }
    if !row.contains_key("updated_at") || row["updated_at"].is_null() {
        row.insert("updated_at".to_string(), json!(stamp));
    }
}

/// Migrate one document into the destination table.
pub async fn migrate_document(
    store: &dyn TableStore,
    collection: &str,
    table: &str,
    document: &JsonMap,
    document_id: &str,
    transform: Option<&dyn Transform>,
) -> MigrationOutcome {
    let transformed = match transform {
        Some(transform) => transform.apply(document, document_id),
        None => DefaultTransform.apply(document, document_id),
    };

    let mut row = match transformed {
        Ok(row) => row,
        Err(error) => {
            return MigrationOutcome::failed(document_id, collection, table, error.to_string())
        }
    };

    stamp_standing_columns(&mut row, document_id);

    match store.insert_row(table, &row).await {
        Ok(destination_id) => MigrationOutcome::ok(document_id, collection, table, destination_id),
        Err(error) => MigrationOutcome::failed(document_id, collection, table, error.to_string()),
    }
}

/// Migrate a single document fetched by id.
pub async fn migrate_document_by_id(
    store: &dyn TableStore,
    source: &dyn DocumentSource,
    collection: &str,
    table: &str,
    document_id: &str,
    transform: Option<&dyn Transform>,
) -> Result<MigrationOutcome> {
    let document = source
        .get_document(collection, document_id)
        .await
        .with_context(|| format!("failed to read source document '{}/{}'", collection, document_id))?;

    Ok(migrate_document(store, collection, table, &document.data, &document.id, transform).await)
}

/// Migrate every document in one collection.
///
/// Errors when the source cannot be enumerated (including the disabled
/// source state); the caller records that as a whole-collection failure.
pub async fn migrate_collection(
    store: &dyn TableStore,
    source: &dyn DocumentSource,
    mapping: &CollectionMapping,
) -> Result<CollectionSummary> {
    let documents = source
        .list_documents(&mapping.source_collection)
        .await
        .with_context(|| {
            format!(
                "failed to enumerate source collection '{}'",
                mapping.source_collection
            )
        })?;

    info!(
        collection = %mapping.source_collection,
        table = %mapping.destination_table,
        count = documents.len(),
        "Migrating collection"
    );

    let mut results = Vec::with_capacity(documents.len());
    for document in &documents {
        let outcome = migrate_document(
            store,
            &mapping.source_collection,
            &mapping.destination_table,
            &document.data,
            &document.id,
            Some(mapping.transform.as_ref()),
        )
        .await;

        if let Some(document_error) = &outcome.error {
            warn!(
                collection = %mapping.source_collection,
                id = %document.id,
                error = %document_error,
                "Document migration failed"
            );
        }
        results.push(outcome);
    }

    let summary = CollectionSummary::from_results(&mapping.destination_table, results);
    info!(
        "✓ Migrated {}/{} documents from '{}' into \"{}\"",
        summary.succeeded, summary.total, mapping.source_collection, mapping.destination_table
    );

    Ok(summary)
}

/// Result of migrating a batch of collection mappings.
#[derive(Debug)]
pub struct MigrationReport {
    /// True only when every mapping succeeded.
    pub success: bool,
    /// Per-collection summaries, keyed by source collection name.
    pub collection_summaries: HashMap<String, CollectionSummary>,
    /// Source collections that failed wholesale (enumeration errors).
    pub failed_collections: Vec<String>,
    /// Batch-level error message, present when any collection failed.
    pub error: Option<String>,
}

impl MigrationReport {
    /// Total documents written across all collections.
    pub fn total_migrated(&self) -> usize {
        self.collection_summaries
            .values()
            .map(|summary| summary.succeeded)
            .sum()
    }
}

/// Migrate a batch of collection mappings, sequentially.
///
/// A collection that fails wholesale is recorded and the batch continues
/// with the next mapping. An empty batch is vacuously successful.
pub async fn migrate_collections(
    store: &dyn TableStore,
    source: &dyn DocumentSource,
    mappings: &[CollectionMapping],
) -> MigrationReport {
    let mut collection_summaries = HashMap::new();
    let mut failed_collections = Vec::new();

    for mapping in mappings {
        match migrate_collection(store, source, mapping).await {
            Ok(summary) => {
                collection_summaries.insert(mapping.source_collection.clone(), summary);
            }
            Err(collection_error) => {
                error!(
                    collection = %mapping.source_collection,
                    error = %collection_error,
                    "Collection migration failed"
                );
                failed_collections.push(mapping.source_collection.clone());
            }
        }
    }

    let success = failed_collections.is_empty();
    let error = (!success).then(|| "Some collections failed to migrate".to_string());

    MigrationReport {
        success,
        collection_summaries,
        failed_collections,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_missing_standing_columns() {
        let mut row = JsonMap::new();
        row.insert("title".to_string(), json!("One"));

        stamp_standing_columns(&mut row, "doc-1");

        assert_eq!(row["firebase_id"], json!("doc-1"));
        assert!(row["created_at"].is_string());
        assert!(row["updated_at"].is_string());
    }

    #[test]
    fn keeps_transform_supplied_standing_columns() {
        let mut row = JsonMap::new();
        row.insert("firebase_id".to_string(), json!("kept"));
        row.insert("created_at".to_string(), json!("2024-01-10T08:00:00Z"));

        stamp_standing_columns(&mut row, "doc-1");

        assert_eq!(row["firebase_id"], json!("kept"));
        assert_eq!(row["created_at"], json!("2024-01-10T08:00:00Z"));
        assert!(row["updated_at"].is_string());
    }

    #[test]
    fn replaces_null_timestamps() {
        let mut row = JsonMap::new();
        row.insert("created_at".to_string(), json!(null));

        stamp_standing_columns(&mut row, "doc-1");

        assert!(row["created_at"].is_string());
    }
}
