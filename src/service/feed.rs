//! Feed service
//!
//! Public entry points for writing posts and likes and for reading the home,
//! public and tag feeds one page at a time.

use std::sync::Arc;

use crate::config::FeedConfig;
use crate::data::{Database, FeedItem, NewPost};
use crate::error::Result;
use crate::feed::{Cursor, FeedQuery, Page, resolve_page_size, tags};
use crate::metrics::{self, FEED_PAGES_SERVED_TOTAL, LIKES_RECORDED_TOTAL, POSTS_CREATED_TOTAL};

/// Source of "now" in unix seconds
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
    feed: FeedConfig,
    clock: Clock,
}

impl FeedService {
    /// Create new feed service using the system clock
    ///
    /// # Errors
    /// Returns `AppError::Config` if `feed` fails [`FeedConfig::validate`].
    pub fn new(db: Arc<Database>, feed: FeedConfig) -> Result<Self> {
        feed.validate()?;

        Ok(Self {
            db,
            feed,
            clock: Arc::new(|| chrono::Utc::now().timestamp()),
        })
    }

    /// Replace the clock used to timestamp new posts and likes
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a post and attach the tags found in its body.
    ///
    /// The body is expected to be size-checked by the caller. Post and tags
    /// are written in one transaction.
    ///
    /// # Returns
    /// Id of the new post
    pub async fn create_post(&self, author_id: i64, body: &str) -> Result<i64> {
        let post_tags = tags::extract(body);
        let post = NewPost {
            author_id,
            body: body.to_string(),
            expire_at: None,
            created_at: (self.clock)(),
        };

        let post_id = self
            .db
            .insert_post_with_tags(&post, &post_tags)
            .await
            .inspect_err(|error| metrics::record_error(error, "create_post"))?;

        POSTS_CREATED_TOTAL.inc();
        metrics::TAGS_ATTACHED_TOTAL.inc_by(post_tags.len() as u64);
        tracing::info!(post_id, author_id, tags = post_tags.len(), "Post created");

        Ok(post_id)
    }

    /// Record that `actor_id` liked `post_id`.
    ///
    /// Repeated likes by the same actor are stored as separate events.
    ///
    /// # Returns
    /// Id of the like event
    pub async fn like(&self, post_id: i64, actor_id: i64) -> Result<i64> {
        let like_id = self
            .db
            .record_like(post_id, actor_id, (self.clock)())
            .await
            .inspect_err(|error| metrics::record_error(error, "like"))?;

        LIKES_RECORDED_TOTAL.inc();
        tracing::info!(post_id, actor_id, like_id, "Like recorded");

        Ok(like_id)
    }

    // =========================================================================
    // Feeds
    // =========================================================================

    /// Home feed: own posts, posts by followed accounts, and posts liked by
    /// followed accounts.
    ///
    /// # Arguments
    /// * `page_token` - Token from a previous page, or `""` for the first page
    /// * `page_size` - Overrides the size carried by the token
    pub async fn home_feed(
        &self,
        actor_id: i64,
        page_token: &str,
        page_size: Option<u32>,
    ) -> Result<Page<FeedItem>> {
        self.list(FeedQuery::home(actor_id), page_token, page_size).await
    }

    /// Public feed: posts by everyone except the actor.
    pub async fn public_feed(
        &self,
        actor_id: i64,
        page_token: &str,
        page_size: Option<u32>,
    ) -> Result<Page<FeedItem>> {
        self.list(FeedQuery::public(actor_id), page_token, page_size).await
    }

    /// Introductions section of the public feed: posts by others that carry
    /// the configured introduction tag.
    pub async fn introductions_feed(
        &self,
        actor_id: i64,
        page_token: &str,
        page_size: Option<u32>,
    ) -> Result<Page<FeedItem>> {
        let query = FeedQuery::public_section(actor_id, self.feed.introduction_tag.clone());
        self.list(query, page_token, page_size).await
    }

    /// Tag feed: posts carrying `tag`.
    ///
    /// # Arguments
    /// * `include_own` - Whether the actor's own posts are included
    pub async fn tag_feed(
        &self,
        actor_id: i64,
        tag: &str,
        page_token: &str,
        include_own: bool,
        page_size: Option<u32>,
    ) -> Result<Page<FeedItem>> {
        self.list(
            FeedQuery::tagged(actor_id, tag, include_own),
            page_token,
            page_size,
        )
        .await
    }

    async fn list(
        &self,
        query: FeedQuery,
        page_token: &str,
        page_size: Option<u32>,
    ) -> Result<Page<FeedItem>> {
        let cursor = Cursor::decode(page_token);
        if cursor.is_none() && !page_token.is_empty() {
            tracing::info!(
                feed = query.name(),
                actor_id = query.actor_id,
                "Unreadable page token; starting from the first page"
            );
        }

        let page_size = resolve_page_size(page_size, cursor.as_ref(), &self.feed);
        let page = self
            .db
            .paginate(&query, cursor.as_ref(), page_size)
            .await
            .inspect_err(|error| metrics::record_error(error, query.name()))?;

        FEED_PAGES_SERVED_TOTAL
            .with_label_values(&[query.name()])
            .inc();
        tracing::debug!(
            feed = query.name(),
            actor_id = query.actor_id,
            items = page.items.len(),
            last_page = page.is_last(),
            "Feed page served"
        );

        Ok(page)
    }
}
