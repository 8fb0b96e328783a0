//! Migration runner binary
//!
//! Opens (or creates) the configured database file, applies pending
//! migrations, and prints a per-table row count. There is no server here;
//! consumers of the schema talk to the database file directly.

use insipirahub_store::{config, data};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("INSIPIRAHUB__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "insipirahub_store=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "insipirahub_store=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    // 2. Load configuration
    let config = config::AppConfig::load()?;
    tracing::info!(
        path = %config.database.path.display(),
        "Configuration loaded"
    );

    // 3. Connect and migrate
    let db = data::Database::connect_with_pool_size(
        &config.database.path,
        config.database.max_connections,
    )
    .await?;

    // 4. Report table sizes
    for (table, count) in db.table_counts().await? {
        tracing::info!(table, rows = count, "Table ready");
    }

    Ok(())
}
