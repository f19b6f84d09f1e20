//! Feedline binary entry point
//!
//! Prepares the store for the request layer: opens the database, applies
//! pending migrations and reports what it found.

use feedline::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging from the logging section
/// 3. Initialize metrics
/// 4. Initialize AppState (connects and migrates the database)
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging; RUST_LOG wins over logging.level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter_directive().into());

    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting Feedline...");
    if !matches!(config.logging.format.to_ascii_lowercase().as_str(), "pretty" | "json") {
        tracing::warn!(
            format = %config.logging.format,
            "Unknown logging.format; falling back to pretty output"
        );
    }
    tracing::info!(
        database = %config.database.path.display(),
        log_level = %config.logging.level,
        "Configuration loaded"
    );

    // 3. Initialize metrics
    feedline::metrics::init_metrics();

    // 4. Initialize application state
    let state = AppState::new(config).await?;

    let posts = state.db.count_posts().await?;
    tracing::info!(posts, "Store ready");

    Ok(())
}
