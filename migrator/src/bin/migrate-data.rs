//! Migrate source collections into destination tables.

use std::env;
use std::process;
use std::sync::Arc;

use dotenv::dotenv;

use migrator::config::MigrationConfig;
use migrator::data::migrate_collections;
use migrator::report;
use migrator::schema::validate_and_correct_schemas;
use migrator::transform::{standard_mappings, CollectionMapping, DefaultTransform};
use supabase_repository::PostgresStore;

const USAGE: &str = "Usage: migrate-data [collection] [table] | --all | --help

Migrate source collections into destination tables.

  migrate-data <collection> <table>   migrate one collection with the default field mapping
  migrate-data --all                  migrate the standard collection mappings
  migrate-data --help                 print this message";

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mappings: Vec<CollectionMapping> = match args.as_slice() {
        [flag] if flag == "--help" || flag == "-h" => {
            println!("{}", USAGE);
            return;
        }
        [flag] if flag == "--all" => standard_mappings(),
        [collection, table] => vec![CollectionMapping::new(
            collection.as_str(),
            table.as_str(),
            Arc::new(DefaultTransform),
        )],
        _ => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    let config = match MigrationConfig::from_env() {
        Ok(config) => config,
        Err(config_error) => {
            eprintln!("Configuration error: {:#}", config_error);
            process::exit(1);
        }
    };

    let store = match PostgresStore::connect(&config.database_url).await {
        Ok(store) => store,
        Err(connect_error) => {
            eprintln!("Failed to connect to the destination: {}", connect_error);
            process::exit(1);
        }
    };

    let source = config.firestore_source().into_source();

    let schema_reports = validate_and_correct_schemas(&store, &mappings).await;
    report::print_schema_summary(&schema_reports);

    let data_report = migrate_collections(&store, source.as_ref(), &mappings).await;
    report::print_data_summary(&data_report);

    let schema_ok = schema_reports.iter().all(|table_report| table_report.success());
    if !data_report.success || !schema_ok {
        process::exit(1);
    }
}
