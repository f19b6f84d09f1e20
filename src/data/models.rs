//! Data models
//!
//! Rust structs representing database rows.
//! IDs are SQLite integer keys; timestamps are unix seconds.

use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// An account that can author, follow and like posts
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    /// Short avatar string (usually a single emoji)
    pub avatar: String,
    pub created_at: i64,
}

/// Fields needed to register a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

impl NewUser {
    pub fn named(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Post
// =============================================================================

/// A stored post row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub body: String,
    /// When the post stops being shown, if ever
    pub expire_at: Option<i64>,
    pub created_at: i64,
    /// Bumped whenever the content changes; never earlier than `created_at`
    pub updated_at: i64,
}

/// Fields needed to insert a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub body: String,
    pub expire_at: Option<i64>,
    /// Creation time; also used as the initial `updated_at`
    pub created_at: i64,
}

/// A post as it appears in a feed, enriched with author and reaction data
///
/// Every feed variant projects this same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FeedItem {
    pub id: i64,
    pub author_id: i64,
    pub author_user_name: String,
    pub author_avatar: String,
    pub body: String,
    /// Live count of like rows
    pub like_count: i64,
    pub expire_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Whether the requesting actor follows the author
    pub following_author: bool,
    /// Whether any account the requesting actor follows liked this post
    pub liked_by_followed: bool,
}

impl FeedItem {
    /// Sort key of the feed ordering: `(updated_at, id)`, both descending.
    pub fn sort_key(&self) -> (i64, i64) {
        (self.updated_at, self.id)
    }
}
