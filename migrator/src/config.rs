//! Migration run configuration.
//!
//! Everything the pipeline needs from the environment is read once, here,
//! into an explicit [`MigrationConfig`] that is passed by parameter into
//! every unit. No other module reads the process environment.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use firestore::{FirestoreConfig, FirestoreSource};

/// File the feature-flag flip rewrites unless overridden.
pub const DEFAULT_ENV_FILE: &str = ".env.local";

/// Whether the pipeline may read from the source store.
///
/// Source reads default to disabled: the deployment this tool ships with
/// has deactivated its source project, and document migration against it
/// must fail per collection rather than hang on dead credentials. Set
/// `MIGRATE_SOURCE_READS=true` to run a real data migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAvailability {
    Enabled,
    Disabled,
}

impl SourceAvailability {
    pub fn is_enabled(&self) -> bool {
        matches!(self, SourceAvailability::Enabled)
    }

    pub fn parse(raw: &str) -> Self {
        if truthy(raw) {
            SourceAvailability::Enabled
        } else {
            SourceAvailability::Disabled
        }
    }
}

/// Configuration for one migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    /// Project anon key, sent as the `apikey` header when present.
    pub supabase_anon_key: Option<String>,
    /// Direct Postgres connection string for row inserts and DDL.
    pub database_url: String,
    pub firebase_project_id: String,
    pub firebase_api_key: String,
    pub source_availability: SourceAvailability,
    /// Auth migration may fall back to a single synthesized test user
    /// when the source cannot list real users (non-production runs).
    pub allow_synthetic_user: bool,
    /// File the feature-flag flip rewrites.
    pub env_file: PathBuf,
}

impl MigrationConfig {
    /// Build the configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `NEXT_PUBLIC_SUPABASE_URL`: destination project URL (required)
    /// - `SUPABASE_SERVICE_ROLE_KEY`: auth-admin key (required)
    /// - `NEXT_PUBLIC_SUPABASE_ANON_KEY`: project anon key (optional)
    /// - `SUPABASE_DB_URL`: destination Postgres connection string (required)
    /// - `NEXT_PUBLIC_FIREBASE_PROJECT_ID` / `NEXT_PUBLIC_FIREBASE_API_KEY`:
    ///   source project (required only when source reads are enabled)
    /// - `MIGRATE_SOURCE_READS`: enable source reads (default: disabled)
    /// - `MIGRATE_SYNTHETIC_USER`: allow the synthesized test user
    ///   (default: allowed)
    /// - `MIGRATION_ENV_FILE`: feature-flag file (default: .env.local)
    pub fn from_env() -> Result<Self> {
        let supabase_url = require("NEXT_PUBLIC_SUPABASE_URL")?;
        let supabase_service_role_key = require("SUPABASE_SERVICE_ROLE_KEY")?;
        let supabase_anon_key = env::var("NEXT_PUBLIC_SUPABASE_ANON_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let database_url = require("SUPABASE_DB_URL")?;

        let source_availability = env::var("MIGRATE_SOURCE_READS")
            .map(|raw| SourceAvailability::parse(&raw))
            .unwrap_or(SourceAvailability::Disabled);

        let (firebase_project_id, firebase_api_key) = if source_availability.is_enabled() {
            (
                require("NEXT_PUBLIC_FIREBASE_PROJECT_ID")?,
                require("NEXT_PUBLIC_FIREBASE_API_KEY")?,
            )
        } else {
            (
                env::var("NEXT_PUBLIC_FIREBASE_PROJECT_ID").unwrap_or_default(),
                env::var("NEXT_PUBLIC_FIREBASE_API_KEY").unwrap_or_default(),
            )
        };

        let allow_synthetic_user = env::var("MIGRATE_SYNTHETIC_USER")
            .map(|raw| truthy(&raw))
            .unwrap_or(true);

        let env_file = env::var("MIGRATION_ENV_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENV_FILE));

        Ok(Self {
            supabase_url,
            supabase_service_role_key,
            supabase_anon_key,
            database_url,
            firebase_project_id,
            firebase_api_key,
            source_availability,
            allow_synthetic_user,
            env_file,
        })
    }

    /// The source-store selection for this run.
    pub fn firestore_source(&self) -> FirestoreSource {
        match self.source_availability {
            SourceAvailability::Enabled => FirestoreSource::live(FirestoreConfig {
                project_id: self.firebase_project_id.clone(),
                api_key: self.firebase_api_key.clone(),
            }),
            SourceAvailability::Disabled => FirestoreSource::disabled(),
        }
    }
}

fn require(key: &str) -> Result<String> {
    let value = env::var(key).with_context(|| format!("{} must be set", key))?;
    if value.trim().is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(value)
}

fn truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
