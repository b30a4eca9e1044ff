use campus_api::config::ApiConfig;
use campus_db::{create_pool, schema::initialize_database};
use color_eyre::eyre::Result;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url).await?;

    // Bring the schema up to date before serving
    let report = initialize_database(&db_pool, config.time_zone).await?;
    if !report.applied.is_empty() {
        info!("Applied migrations: {}", report.applied.join(", "));
    }

    // Start API server
    campus_api::start_server(config, db_pool).await?;

    Ok(())
}
