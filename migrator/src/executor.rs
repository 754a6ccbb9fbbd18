//! Complete-migration orchestration.
//!
//! Sequences the whole run: auth migration, schema reconciliation,
//! collection migration, and the feature-flag flip, then reports totals.
//! Collection and flag failures are recorded in the report rather than
//! aborting the sequence.

use std::time::Instant;

use anyhow::Result;
use tracing::{error, info};

use firestore::DocumentSource;
use supabase_repository::{AuthAdmin, TableStore};

use crate::auth::{run_auth_migration, AuthMigrationReport};
use crate::config::MigrationConfig;
use crate::data::{migrate_collections, MigrationReport};
use crate::env_file::enable_supabase_flag;
use crate::schema::{validate_and_correct_schemas, TableSchemaReport};
use crate::transform::CollectionMapping;

/// Everything one complete run produced.
#[derive(Debug)]
pub struct CompleteMigrationReport {
    pub auth: AuthMigrationReport,
    pub schema: Vec<TableSchemaReport>,
    pub data: MigrationReport,
    pub flag_flipped: bool,
}

impl CompleteMigrationReport {
    pub fn success(&self) -> bool {
        self.auth.success()
            && self.schema.iter().all(|report| report.success())
            && self.data.success
            && self.flag_flipped
    }
}

/// Migration executor that coordinates the migration process.
pub struct MigrationExecutor {
    config: MigrationConfig,
    auth: Box<dyn AuthAdmin>,
    store: Box<dyn TableStore>,
    source: Box<dyn DocumentSource>,
}

impl MigrationExecutor {
    /// Create a new migration executor.
    pub fn new(
        config: MigrationConfig,
        auth: Box<dyn AuthAdmin>,
        store: Box<dyn TableStore>,
        source: Box<dyn DocumentSource>,
    ) -> Self {
        Self {
            config,
            auth,
            store,
            source,
        }
    }

    /// Execute the full migration process.
    pub async fn execute(
        &self,
        mappings: &[CollectionMapping],
    ) -> Result<CompleteMigrationReport> {
        let start_time = Instant::now();

        info!("\n=== Migrating auth users ===");
        let auth_report =
            run_auth_migration(&self.config, self.auth.as_ref(), self.source.as_ref()).await?;
        info!(
            "✓ Migrated {}/{} users",
            auth_report.succeeded(),
            auth_report.total()
        );

        info!("\n=== Reconciling destination schemas ===");
        let schema_reports = validate_and_correct_schemas(self.store.as_ref(), mappings).await;
        info!("✓ Checked {} tables", schema_reports.len());

        info!("\n=== Migrating collections ===");
        let data_report =
            migrate_collections(self.store.as_ref(), self.source.as_ref(), mappings).await;

        info!("\n=== Enabling the Supabase feature flag ===");
        let flag_flipped = match enable_supabase_flag(&self.config.env_file) {
            Ok(()) => true,
            Err(flip_error) => {
                error!(error = %flip_error, "Feature flag flip failed");
                false
            }
        };

        let elapsed = start_time.elapsed();
        info!("\n=== Migration Complete ===");
        info!("Total time: {:.2}s", elapsed.as_secs_f64());
        info!(
            "Users: {}/{}",
            auth_report.succeeded(),
            auth_report.total()
        );
        info!("Documents: {}", data_report.total_migrated());
        if !data_report.failed_collections.is_empty() {
            info!(
                "Failed collections: {}",
                data_report.failed_collections.join(", ")
            );
        }

        Ok(CompleteMigrationReport {
            auth: auth_report,
            schema: schema_reports,
            data: data_report,
            flag_flipped,
        })
    }
}
