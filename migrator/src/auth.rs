//! Auth user migration.
//!
//! Users migrate one at a time into the destination identity store. A
//! destination account that already exists counts as an idempotent skip,
//! not a failure; any other per-user failure is recorded and the batch
//! continues with the next user.

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use firestore::{DocumentSource, FirestoreError, SourceDocument};
use supabase_repository::{
    AuthAdmin, JsonMap, MigrationOutcome, NewAuthUser, RepositoryError, SourceUser,
};

use crate::config::MigrationConfig;

/// Source collection the user records live in.
pub const SOURCE_USERS_COLLECTION: &str = "users";

/// Destination label recorded in auth outcomes.
const DESTINATION_AUTH: &str = "auth.users";

/// The single user migrated when the source cannot list real users.
pub fn synthetic_test_user() -> SourceUser {
    SourceUser {
        uid: "firebase-test-user".to_string(),
        email: "migration-test@example.com".to_string(),
        email_verified: true,
        display_name: Some("Migration Test User".to_string()),
        photo_url: None,
    }
}

fn source_user_from_document(document: &SourceDocument) -> SourceUser {
    let data = &document.data;
    SourceUser {
        uid: document.id.clone(),
        email: data
            .get("email")
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string(),
        email_verified: data
            .get("emailVerified")
            .and_then(|value| value.as_bool())
            .unwrap_or(false),
        display_name: data
            .get("displayName")
            .and_then(|value| value.as_str())
            .map(str::to_string),
        photo_url: data
            .get("photoURL")
            .and_then(|value| value.as_str())
            .map(str::to_string),
    }
}

/// Enumerate the users to migrate.
///
/// Reads the source `users` collection when the source is enabled. When
/// source reads are disabled, falls back to the synthesized test user if
/// the run allows it, so non-production auth migrations stay exercisable.
pub async fn load_source_users(
    source: &dyn DocumentSource,
    config: &MigrationConfig,
) -> Result<Vec<SourceUser>> {
    match source.list_documents(SOURCE_USERS_COLLECTION).await {
        Ok(documents) => Ok(documents.iter().map(source_user_from_document).collect()),
        Err(FirestoreError::Disabled) if config.allow_synthetic_user => {
            warn!("Source user listing is disabled; migrating a synthesized test user");
            Ok(vec![synthetic_test_user()])
        }
        Err(error) => Err(error).context("failed to enumerate source users"),
    }
}

/// Migrate one user into the destination identity store.
pub async fn migrate_user(auth: &dyn AuthAdmin, user: &SourceUser) -> MigrationOutcome {
    if user.email.trim().is_empty() {
        return MigrationOutcome::failed(
            user.uid.as_str(),
            SOURCE_USERS_COLLECTION,
            DESTINATION_AUTH,
            "source user has no email",
        );
    }

    let mut metadata = JsonMap::new();
    metadata.insert("firebase_uid".to_string(), json!(user.uid));
    if let Some(display_name) = &user.display_name {
        metadata.insert("displayName".to_string(), json!(display_name));
    }
    if let Some(photo_url) = &user.photo_url {
        metadata.insert("photoURL".to_string(), json!(photo_url));
    }

    // Fresh throwaway credential per account; migrated users sign in
    // again through a password reset.
    let request = NewAuthUser {
        email: user.email.clone(),
        password: Uuid::new_v4().to_string(),
        email_confirm: user.email_verified,
        user_metadata: metadata,
    };

    match auth.create_user(&request).await {
        Ok(created) => MigrationOutcome::ok(
            user.uid.as_str(),
            SOURCE_USERS_COLLECTION,
            DESTINATION_AUTH,
            Some(created.id),
        ),
        Err(RepositoryError::AlreadyRegistered(_)) => MigrationOutcome::skipped(
            user.uid.as_str(),
            SOURCE_USERS_COLLECTION,
            DESTINATION_AUTH,
            format!("User {} already exists in the destination, skipping", user.email),
        ),
        Err(error) => MigrationOutcome::failed(
            user.uid.as_str(),
            SOURCE_USERS_COLLECTION,
            DESTINATION_AUTH,
            error.to_string(),
        ),
    }
}

/// Migrate a batch of users, sequentially.
pub async fn migrate_users(auth: &dyn AuthAdmin, users: &[SourceUser]) -> Vec<MigrationOutcome> {
    let mut outcomes = Vec::with_capacity(users.len());
    for user in users {
        info!(uid = %user.uid, "Migrating user");
        let outcome = migrate_user(auth, user).await;
        if let Some(user_error) = &outcome.error {
            warn!(uid = %user.uid, error = %user_error, "User migration failed");
        }
        outcomes.push(outcome);
    }
    outcomes
}

/// Manual follow-ups after an auth migration. No destination side effect.
pub fn cleanup_after_migration() -> Vec<String> {
    vec![
        "Ask migrated users to reset their passwords; the generated credentials are throwaway"
            .to_string(),
        "Set NEXT_PUBLIC_USE_SUPABASE=true in .env.local (complete-migration does this for you)"
            .to_string(),
        "Remove the Firebase configuration from the deployment once traffic is verified"
            .to_string(),
    ]
}

/// Result of one auth migration run.
#[derive(Debug)]
pub struct AuthMigrationReport {
    pub outcomes: Vec<MigrationOutcome>,
    pub manual_steps: Vec<String>,
}

impl AuthMigrationReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.success).count()
    }

    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.success)
    }
}

/// Run the auth migration: enumerate source users, migrate each, and
/// report the manual follow-ups.
///
/// Fails fast, before any user is enumerated, when the destination
/// connection configuration is absent.
pub async fn run_auth_migration(
    config: &MigrationConfig,
    auth: &dyn AuthAdmin,
    source: &dyn DocumentSource,
) -> Result<AuthMigrationReport> {
    if config.supabase_url.trim().is_empty() || config.supabase_service_role_key.trim().is_empty() {
        bail!("destination connection configuration is absent");
    }

    let users = load_source_users(source, config).await?;
    info!("Migrating {} auth users", users.len());

    let outcomes = migrate_users(auth, &users).await;
    let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
    info!("✓ Auth migration finished: {}/{} users", succeeded, outcomes.len());

    Ok(AuthMigrationReport {
        outcomes,
        manual_steps: cleanup_after_migration(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_source_documents_to_users() {
        let mut data = JsonMap::new();
        data.insert("email".to_string(), json!("a@x.com"));
        data.insert("emailVerified".to_string(), json!(true));
        data.insert("displayName".to_string(), json!("A"));
        let document = SourceDocument::new("fb-1", data);

        let user = source_user_from_document(&document);
        assert_eq!(user.uid, "fb-1");
        assert_eq!(user.email, "a@x.com");
        assert!(user.email_verified);
        assert_eq!(user.display_name.as_deref(), Some("A"));
        assert_eq!(user.photo_url, None);
    }

    #[test]
    fn documents_without_email_map_to_empty_email() {
        let document = SourceDocument::new("fb-2", JsonMap::new());
        let user = source_user_from_document(&document);
        assert!(user.email.is_empty());
        assert!(!user.email_verified);
    }
}
