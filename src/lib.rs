//! Feedline - feed assembly and keyset pagination for a small social-posting
//! service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - create post / record like                                │
//! │  - home, public, introductions and tag feeds                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Feed Engine                             │
//! │  - page cursor codec                                        │
//! │  - tag extraction                                           │
//! │  - feed query composition and keyset pagination             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - unit of work for atomic writes                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `service`: Operations exposed to the request layer
//! - `feed`: Cursor codec, tag extraction, query composition, pagination
//! - `data`: Database and transactional writes
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod config;
pub mod data;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod service;

use std::sync::Arc;

use crate::error::Result;

/// Application state shared by request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Feed reads and post/like writes
    pub feed: Arc<service::FeedService>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Build the feed service
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!("Database connected");

        let feed = Arc::new(service::FeedService::new(db.clone(), config.feed.clone())?);
        tracing::info!(
            default_page_size = config.feed.default_page_size,
            max_page_size = config.feed.max_page_size,
            introduction_tag = %config.feed.introduction_tag,
            "Feed service initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            db,
            feed,
        })
    }
}
