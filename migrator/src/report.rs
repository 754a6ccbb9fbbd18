//! Human-readable run summaries printed by the CLI entry points.

use crate::auth::AuthMigrationReport;
use crate::data::MigrationReport;
use crate::executor::CompleteMigrationReport;
use crate::schema::TableSchemaReport;

/// Print the auth migration summary and the manual follow-ups.
pub fn print_auth_summary(report: &AuthMigrationReport) {
    println!(
        "\nAuth migration: {}/{} users migrated",
        report.succeeded(),
        report.total()
    );

    for outcome in &report.outcomes {
        if let Some(outcome_error) = &outcome.error {
            println!("  ✗ {}: {}", outcome.id, outcome_error);
        } else if let Some(message) = &outcome.message {
            println!("  - {}: {}", outcome.id, message);
        }
    }

    println!("\nManual follow-ups:");
    for step in &report.manual_steps {
        println!("  • {}", step);
    }
}

/// Print the per-table schema reconciliation summary.
pub fn print_schema_summary(reports: &[TableSchemaReport]) {
    println!("\nSchema reconciliation:");
    for report in reports {
        if let Some(table_error) = &report.error {
            println!("  ✗ \"{}\": {}", report.table, table_error);
        } else if report.missing_columns.is_empty() {
            println!("  ✓ \"{}\": schema up to date", report.table);
        } else if report.success() {
            println!(
                "  ✓ \"{}\": added {}",
                report.table,
                report.missing_columns.join(", ")
            );
        } else {
            let failed: Vec<&str> = report
                .corrections
                .iter()
                .filter(|change| !change.success)
                .map(|change| change.column.as_str())
                .collect();
            println!(
                "  ✗ \"{}\": could not add {}",
                report.table,
                failed.join(", ")
            );
        }
    }
}

/// Print the per-collection data migration summary.
pub fn print_data_summary(report: &MigrationReport) {
    println!("\nData migration:");
    for (collection, summary) in &report.collection_summaries {
        println!(
            "  {} '{}' → \"{}\": {}/{} documents",
            if summary.success() { "✓" } else { "✗" },
            collection,
            summary.table,
            summary.succeeded,
            summary.total
        );
    }
    for collection in &report.failed_collections {
        println!("  ✗ '{}': collection failed wholesale", collection);
    }
    if let Some(batch_error) = &report.error {
        println!("\n{}", batch_error);
    }
}

/// Print the full complete-migration summary.
pub fn print_complete_summary(report: &CompleteMigrationReport) {
    print_auth_summary(&report.auth);
    print_schema_summary(&report.schema);
    print_data_summary(&report.data);

    println!(
        "\nFeature flag: {}",
        if report.flag_flipped {
            "NEXT_PUBLIC_USE_SUPABASE=true written"
        } else {
            "flip FAILED, set NEXT_PUBLIC_USE_SUPABASE=true manually"
        }
    );
    println!(
        "\nOverall: {}",
        if report.success() { "SUCCESS" } else { "FAILED" }
    );
}
