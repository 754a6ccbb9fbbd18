//! Run the complete migration: auth users, destination schemas, data
//! collections, and the feature-flag flip.

use std::process;

use dotenv::dotenv;

use migrator::config::MigrationConfig;
use migrator::executor::MigrationExecutor;
use migrator::report;
use migrator::transform::standard_mappings;
use supabase_repository::{GoTrueAdmin, PostgresStore};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .init();

    let config = match MigrationConfig::from_env() {
        Ok(config) => config,
        Err(config_error) => {
            eprintln!("Configuration error: {:#}", config_error);
            process::exit(1);
        }
    };

    let mut auth = match GoTrueAdmin::new(&config.supabase_url, &config.supabase_service_role_key)
    {
        Ok(auth) => auth,
        Err(auth_error) => {
            eprintln!("Configuration error: {}", auth_error);
            process::exit(1);
        }
    };
    if let Some(anon_key) = &config.supabase_anon_key {
        auth = auth.with_apikey(anon_key);
    }

    let store = match PostgresStore::connect(&config.database_url).await {
        Ok(store) => store,
        Err(connect_error) => {
            eprintln!("Failed to connect to the destination: {}", connect_error);
            process::exit(1);
        }
    };

    let source = config.firestore_source().into_source();

    let executor = MigrationExecutor::new(config, Box::new(auth), Box::new(store), source);

    match executor.execute(&standard_mappings()).await {
        Ok(run_report) => {
            report::print_complete_summary(&run_report);
            if !run_report.success() {
                process::exit(1);
            }
        }
        Err(run_error) => {
            eprintln!("Migration failed: {:#}", run_error);
            process::exit(1);
        }
    }
}
