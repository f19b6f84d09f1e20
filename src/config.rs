//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{AppError, Result};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Feed paging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Page size used when neither the caller nor the cursor names one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Upper bound applied to every effective page size
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// System tag that marks posts for the introductions section of the
    /// public feed
    #[serde(default = "default_introduction_tag")]
    pub introduction_tag: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            introduction_tag: default_introduction_tag(),
        }
    }
}

fn default_page_size() -> u32 {
    25
}

fn default_max_page_size() -> u32 {
    100
}

fn default_introduction_tag() -> String {
    "#introduction".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (FEEDLINE__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("database.path", "data/feedline.db")?
            .set_default("feed.default_page_size", i64::from(default_page_size()))?
            .set_default("feed.max_page_size", i64::from(default_max_page_size()))?
            .set_default("feed.introduction_tag", default_introduction_tag())?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("FEEDLINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        self.feed.validate()
    }
}

impl FeedConfig {
    /// Check that the page-size range and the introduction tag are usable.
    ///
    /// # Errors
    /// Returns `AppError::Config` when the default page size is zero, the
    /// maximum is below the default, or the introduction tag would not be
    /// extracted from a post body as-is.
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(AppError::Config(
                "feed.default_page_size must be greater than 0".to_string(),
            ));
        }

        if self.max_page_size < self.default_page_size {
            return Err(AppError::Config(format!(
                "feed.max_page_size ({}) must not be smaller than feed.default_page_size ({})",
                self.max_page_size, self.default_page_size
            )));
        }

        if crate::feed::tags::extract(&self.introduction_tag) != [self.introduction_tag.as_str()] {
            return Err(AppError::Config(format!(
                "feed.introduction_tag is not a valid tag: {}",
                self.introduction_tag
            )));
        }

        Ok(())
    }
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        format!("feedline={}", self.level.trim().to_ascii_lowercase())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}
