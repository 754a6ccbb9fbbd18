//! Migrate source auth users into the destination identity store.

use std::process;

use dotenv::dotenv;
use tracing::error;

use migrator::auth::run_auth_migration;
use migrator::config::MigrationConfig;
use migrator::report;
use supabase_repository::GoTrueAdmin;

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

    let source = config.firestore_source().into_source();

    match run_auth_migration(&config, &auth, source.as_ref()).await {
        Ok(auth_report) => {
            report::print_auth_summary(&auth_report);
            if !auth_report.success() {
                process::exit(1);
            }
        }
        Err(run_error) => {
            error!("Auth migration failed: {:#}", run_error);
            process::exit(1);
        }
    }
}
