//! SQLite database operations
//!
//! All database access goes through this module.
//! Post, tag and like rows are only written through a `UnitOfWork`.

use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use std::time::Instant;

use futures::FutureExt;

use super::models::*;
use super::unit_of_work::{PostWrites, write_post_with_tags};
use crate::error::{AppError, Result};
use crate::feed::pagination::{self, Page};
use crate::feed::{Cursor, FeedQuery};

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    pub(super) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Register a user and return its id
    pub async fn insert_user(&self, user: &NewUser) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO users (user_name, first_name, last_name, avatar) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.user_name)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by user name
    pub async fn get_user_by_user_name(&self, user_name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_name = ?")
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // =========================================================================
    // Follows
    // =========================================================================

    /// Record that `follower_id` follows `followed_id`.
    ///
    /// Returns `true` when a new relationship was stored, `false` when it
    /// already existed.
    pub async fn insert_follow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, followed_id) VALUES (?, ?) ON CONFLICT(follower_id, followed_id) DO NOTHING",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Check whether a follow relationship exists
    pub async fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followed_id = ?",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists > 0)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Get post by ID
    pub async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Tags attached to a post, in insertion order
    pub async fn get_post_tags(&self, post_id: i64) -> Result<Vec<String>> {
        let tags = sqlx::query_scalar::<_, String>(
            "SELECT body FROM tags WHERE post_id = ? ORDER BY id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Count all posts
    pub async fn count_posts(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Insert a post and its tags atomically.
    ///
    /// If any tag row is rejected the post insert is rolled back too.
    pub async fn insert_post_with_tags(
        &self,
        post: &NewPost,
        tags: &[String],
    ) -> Result<i64> {
        let started = Instant::now();
        let post = post.clone();
        let tags = tags.to_vec();

        let post_id = self
            .with_transaction(move |uow| {
                async move { write_post_with_tags(uow, &post, &tags).await }.boxed()
            })
            .await?;

        crate::metrics::observe_db_query("insert", "posts", started.elapsed());
        Ok(post_id)
    }

    #[cfg(test)]
    pub(crate) async fn set_post_updated_at_for_test(
        &self,
        post_id: i64,
        updated_at: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE posts SET updated_at = ? WHERE id = ?")
            .bind(updated_at)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Record a like event and return its id
    pub async fn record_like(
        &self,
        post_id: i64,
        actor_id: i64,
        liked_at: i64,
    ) -> Result<i64> {
        let started = Instant::now();

        let like_id = self
            .with_transaction(move |uow| {
                async move { uow.insert_like(post_id, actor_id, liked_at).await }.boxed()
            })
            .await?;

        crate::metrics::observe_db_query("insert", "likes", started.elapsed());
        Ok(like_id)
    }

    /// Count like rows on a post
    pub async fn count_likes(&self, post_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Feeds
    // =========================================================================

    /// Fetch one page of a feed.
    ///
    /// `page_size` must already be resolved (see
    /// [`crate::feed::resolve_page_size`]). One extra row is fetched to decide
    /// whether a next cursor is issued.
    pub async fn paginate(
        &self,
        query: &FeedQuery,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> Result<Page<FeedItem>> {
        let started = Instant::now();

        let mut builder = pagination::page_query(query, cursor, page_size);
        let rows = builder
            .build_query_as::<FeedItem>()
            .fetch_all(&self.pool)
            .await?;

        crate::metrics::observe_db_query("select_feed", "posts", started.elapsed());
        tracing::debug!(
            feed = query.name(),
            actor_id = query.actor_id,
            fetched = rows.len(),
            page_size,
            "Fetched feed rows"
        );

        Ok(pagination::finish_page(rows, page_size))
    }
}
