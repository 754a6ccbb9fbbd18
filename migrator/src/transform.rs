//! Typed transforms from source documents to destination rows.
//!
//! Each source collection migrates through a [`Transform`] implementation
//! that maps camelCase source fields to the destination table's snake_case
//! columns. Every transform also states a representative
//! [`sample_document`](Transform::sample_document), which is what schema
//! inference runs against; the inference never probes a transform with a
//! made-up input shape.

use std::sync::Arc;

use serde_json::{json, Value};

pub use supabase_repository::JsonMap;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("{0}")]
    Invalid(String),
}

/// A pure, deterministic mapping from one source document to one flat
/// destination row.
pub trait Transform: Send + Sync {
    /// Map one source document to a destination row.
    fn apply(&self, document: &JsonMap, id: &str) -> Result<JsonMap, TransformError>;

    /// A representative input document for this transform.
    ///
    /// Schema inference applies the transform to this sample, so the
    /// sample must carry every field the transform's output can produce.
    fn sample_document(&self) -> JsonMap;
}

/// Passthrough transform: spreads all document fields unchanged.
///
/// Used for ad-hoc collection migrations where no field renaming is
/// needed; the migrator still stamps the standing columns afterward.
pub struct DefaultTransform;

impl Transform for DefaultTransform {
    fn apply(&self, document: &JsonMap, _id: &str) -> Result<JsonMap, TransformError> {
        Ok(document.clone())
    }

    fn sample_document(&self) -> JsonMap {
        JsonMap::new()
    }
}

/// One unit of document migration: a source collection, its destination
/// table, and the transform between them.
#[derive(Clone)]
pub struct CollectionMapping {
    pub source_collection: String,
    pub destination_table: String,
    pub transform: Arc<dyn Transform>,
}

impl CollectionMapping {
    pub fn new(
        source_collection: impl Into<String>,
        destination_table: impl Into<String>,
        transform: Arc<dyn Transform>,
    ) -> Self {
        Self {
            source_collection: source_collection.into(),
            destination_table: destination_table.into(),
            transform,
        }
    }
}

/// The standard mapping table for the application's collections.
pub fn standard_mappings() -> Vec<CollectionMapping> {
    vec![
        CollectionMapping::new("users", "profiles", Arc::new(ProfileTransform)),
        CollectionMapping::new("templates", "templates", Arc::new(TemplateTransform)),
        CollectionMapping::new("favorites", "favorites", Arc::new(FavoriteTransform)),
        CollectionMapping::new(
            "template_analyses",
            "template_analyses",
            Arc::new(AnalysisTransform),
        ),
    ]
}

/// Copy a field as-is, `null` when absent.
fn field(document: &JsonMap, key: &str) -> Value {
    document.get(key).cloned().unwrap_or(Value::Null)
}

/// Copy a field that must be a non-empty string.
fn required_string(document: &JsonMap, key: &str) -> Result<Value, TransformError> {
    match document.get(key) {
        Some(Value::String(text)) if !text.is_empty() => Ok(json!(text)),
        _ => Err(TransformError::MissingField(key.to_string())),
    }
}

/// `users` documents → `profiles` rows.
pub struct ProfileTransform;

impl Transform for ProfileTransform {
    fn apply(&self, document: &JsonMap, _id: &str) -> Result<JsonMap, TransformError> {
        let mut row = JsonMap::new();
        row.insert("email".to_string(), required_string(document, "email")?);
        row.insert("display_name".to_string(), field(document, "displayName"));
        row.insert("avatar_url".to_string(), field(document, "photoURL"));
        row.insert(
            "email_verified".to_string(),
            field(document, "emailVerified"),
        );
        row.insert("bio".to_string(), field(document, "bio"));
        Ok(row)
    }

    fn sample_document(&self) -> JsonMap {
        sample(json!({
            "email": "creator@example.com",
            "displayName": "Creator",
            "photoURL": "https://cdn.example.com/avatar.png",
            "emailVerified": true,
            "bio": "Makes transition edits"
        }))
    }
}

/// `templates` documents → `templates` rows.
pub struct TemplateTransform;

impl Transform for TemplateTransform {
    fn apply(&self, document: &JsonMap, _id: &str) -> Result<JsonMap, TransformError> {
        let mut row = JsonMap::new();
        row.insert("title".to_string(), required_string(document, "title")?);
        row.insert("description".to_string(), field(document, "description"));
        row.insert("category".to_string(), field(document, "category"));
        row.insert("video_url".to_string(), field(document, "videoUrl"));
        row.insert("cover_url".to_string(), field(document, "coverImage"));
        row.insert("duration_seconds".to_string(), field(document, "duration"));
        row.insert("clip_count".to_string(), field(document, "clipCount"));
        row.insert("music_title".to_string(), field(document, "musicTitle"));
        row.insert("is_published".to_string(), field(document, "isPublished"));
        row.insert(
            "author_firebase_uid".to_string(),
            field(document, "authorId"),
        );
        row.insert("created_at".to_string(), field(document, "createdAt"));
        Ok(row)
    }

    fn sample_document(&self) -> JsonMap {
        sample(json!({
            "title": "Beat-synced outfit change",
            "description": "Three quick cuts on the drop",
            "category": "fashion",
            "videoUrl": "https://cdn.example.com/templates/outfit.mp4",
            "coverImage": "https://cdn.example.com/templates/outfit.jpg",
            "duration": 12.5,
            "clipCount": 3,
            "musicTitle": "Original sound",
            "isPublished": true,
            "authorId": "fb-uid-1",
            "createdAt": "2024-01-10T08:00:00Z"
        }))
    }
}

/// `favorites` documents → `favorites` rows.
pub struct FavoriteTransform;

impl Transform for FavoriteTransform {
    fn apply(&self, document: &JsonMap, _id: &str) -> Result<JsonMap, TransformError> {
        let mut row = JsonMap::new();
        row.insert(
            "user_firebase_uid".to_string(),
            required_string(document, "userId")?,
        );
        row.insert(
            "template_firebase_id".to_string(),
            required_string(document, "templateId")?,
        );
        row.insert("created_at".to_string(), field(document, "createdAt"));
        Ok(row)
    }

    fn sample_document(&self) -> JsonMap {
        sample(json!({
            "userId": "fb-uid-1",
            "templateId": "tpl-1",
            "createdAt": "2024-02-01T08:00:00Z"
        }))
    }
}

/// `template_analyses` documents → `template_analyses` rows.
pub struct AnalysisTransform;

impl Transform for AnalysisTransform {
    fn apply(&self, document: &JsonMap, _id: &str) -> Result<JsonMap, TransformError> {
        let mut row = JsonMap::new();
        row.insert("video_url".to_string(), required_string(document, "videoUrl")?);
        row.insert(
            "template_firebase_id".to_string(),
            field(document, "templateId"),
        );
        row.insert("clip_count".to_string(), field(document, "clipCount"));
        row.insert(
            "avg_clip_seconds".to_string(),
            field(document, "avgClipSeconds"),
        );
        row.insert("notes".to_string(), field(document, "notes"));
        row.insert("analyzed_at".to_string(), field(document, "analyzedAt"));
        Ok(row)
    }

    fn sample_document(&self) -> JsonMap {
        sample(json!({
            "videoUrl": "https://cdn.example.com/analyzed/clip.mp4",
            "templateId": "tpl-1",
            "clipCount": 5,
            "avgClipSeconds": 2.4,
            "notes": "Fast cuts, heavy zoom",
            "analyzedAt": "2024-03-01T08:00:00Z"
        }))
    }
}

fn sample(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transform_spreads_fields_unchanged() {
        let mut document = JsonMap::new();
        document.insert("anything".to_string(), json!(1));

        let row = DefaultTransform.apply(&document, "doc-1").unwrap();
        assert_eq!(row, document);
    }

    #[test]
    fn profile_transform_renames_fields() {
        let transform = ProfileTransform;
        let row = transform
            .apply(&transform.sample_document(), "fb-uid-1")
            .unwrap();

        assert_eq!(row["email"], json!("creator@example.com"));
        assert_eq!(row["display_name"], json!("Creator"));
        assert_eq!(row["avatar_url"], json!("https://cdn.example.com/avatar.png"));
        assert_eq!(row["email_verified"], json!(true));
        assert!(!row.contains_key("photoURL"));
    }

    #[test]
    fn profile_transform_requires_an_email() {
        let result = ProfileTransform.apply(&JsonMap::new(), "fb-uid-1");
        assert!(matches!(result, Err(TransformError::MissingField(field)) if field == "email"));
    }

    #[test]
    fn template_transform_keeps_numeric_and_boolean_fields() {
        let transform = TemplateTransform;
        let row = transform
            .apply(&transform.sample_document(), "tpl-1")
            .unwrap();

        assert_eq!(row["clip_count"], json!(3));
        assert_eq!(row["duration_seconds"], json!(12.5));
        assert_eq!(row["is_published"], json!(true));
        assert_eq!(row["created_at"], json!("2024-01-10T08:00:00Z"));
    }

    #[test]
    fn missing_optional_fields_become_null() {
        let mut document = JsonMap::new();
        document.insert("title".to_string(), json!("Bare template"));

        let row = TemplateTransform.apply(&document, "tpl-2").unwrap();
        assert_eq!(row["description"], Value::Null);
        assert_eq!(row["clip_count"], Value::Null);
    }

    #[test]
    fn favorite_transform_requires_both_sides() {
        let mut document = JsonMap::new();
        document.insert("userId".to_string(), json!("fb-uid-1"));

        let result = FavoriteTransform.apply(&document, "fav-1");
        assert!(
            matches!(result, Err(TransformError::MissingField(field)) if field == "templateId")
        );
    }

    #[test]
    fn standard_mappings_cover_the_application_collections() {
        let mappings = standard_mappings();
        let sources: Vec<&str> = mappings
            .iter()
            .map(|m| m.source_collection.as_str())
            .collect();
        assert_eq!(
            sources,
            vec!["users", "templates", "favorites", "template_analyses"]
        );
    }

    #[test]
    fn every_standard_transform_accepts_its_own_sample() {
        for mapping in standard_mappings() {
            let sample = mapping.transform.sample_document();
            let row = mapping.transform.apply(&sample, "sample-id");
            assert!(
                row.is_ok(),
                "transform for '{}' rejected its own sample",
                mapping.source_collection
            );
        }
    }
}
