//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use feedline::data::{FeedItem, NewUser};
use feedline::service::FeedService;
use feedline::{AppState, config};
use tempfile::TempDir;

/// Test context backed by a throwaway database and a hand-driven clock
pub struct TestContext {
    pub state: AppState,
    /// Feed service whose clock only moves when the test advances it
    pub feed: FeedService,
    pub clock: Arc<AtomicI64>,
    pub _temp_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with the default feed settings
    pub async fn new() -> Self {
        Self::with_feed_config(config::FeedConfig::default()).await
    }

    pub async fn with_feed_config(feed: config::FeedConfig) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = test_config(db_path, feed.clone());

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        let clock = Arc::new(AtomicI64::new(1_700_000_000));
        let ticks = clock.clone();
        let feed = FeedService::new(state.db.clone(), feed)
            .unwrap()
            .with_clock(move || ticks.load(Ordering::SeqCst));

        Self {
            state,
            feed,
            clock,
            _temp_dir: temp_dir,
        }
    }

    /// Move the clock forward by `seconds`
    pub fn advance(&self, seconds: i64) {
        self.clock.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Create a test account in the database
    pub async fn create_user(&self, user_name: &str) -> i64 {
        self.state
            .db
            .insert_user(&NewUser::named(user_name))
            .await
            .unwrap()
    }

    pub async fn follow(&self, follower_id: i64, followed_id: i64) {
        self.state
            .db
            .insert_follow(follower_id, followed_id)
            .await
            .unwrap();
    }

    /// Create a post one second after the previous one
    pub async fn post(&self, author_id: i64, body: &str) -> i64 {
        self.advance(1);
        self.feed.create_post(author_id, body).await.unwrap()
    }
}

/// Build a test configuration around a database path
pub fn test_config(db_path: PathBuf, feed: config::FeedConfig) -> config::AppConfig {
    config::AppConfig {
        database: config::DatabaseConfig { path: db_path },
        feed,
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

pub fn ids(items: &[FeedItem]) -> Vec<i64> {
    items.iter().map(|item| item.id).collect()
}
