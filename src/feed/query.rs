//! Feed query composition
//!
//! Each feed variant is a membership predicate over `posts`. All variants
//! share one projection (see [`crate::data::FeedItem`]) and one ordering,
//! so the pagination layer can bound and limit any of them the same way.

use sqlx::{QueryBuilder, Sqlite};

/// Ordering shared by every feed: newest change first, id breaks ties.
pub const FEED_ORDER: &str = " ORDER BY p.updated_at DESC, p.id DESC";

/// Which posts a feed contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
    /// Posts by followed accounts, by the actor, or liked by followed accounts
    Home,
    /// Posts by everyone but the actor, optionally only those carrying a
    /// section tag
    Public { section_tag: Option<String> },
    /// Posts carrying `tag`; the actor's own posts only when `include_own`
    Tag { tag: String, include_own: bool },
}

/// A feed variant bound to the actor it is assembled for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub actor_id: i64,
    pub kind: FeedKind,
}

impl FeedQuery {
    pub fn home(actor_id: i64) -> Self {
        Self {
            actor_id,
            kind: FeedKind::Home,
        }
    }

    pub fn public(actor_id: i64) -> Self {
        Self {
            actor_id,
            kind: FeedKind::Public { section_tag: None },
        }
    }

    /// Public feed restricted to posts carrying a system tag.
    pub fn public_section(actor_id: i64, section_tag: impl Into<String>) -> Self {
        Self {
            actor_id,
            kind: FeedKind::Public {
                section_tag: Some(section_tag.into()),
            },
        }
    }

    pub fn tagged(actor_id: i64, tag: impl Into<String>, include_own: bool) -> Self {
        Self {
            actor_id,
            kind: FeedKind::Tag {
                tag: tag.into(),
                include_own,
            },
        }
    }

    /// Label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match &self.kind {
            FeedKind::Home => "home",
            FeedKind::Public { section_tag: None } => "public",
            FeedKind::Public { section_tag: Some(_) } => "public_section",
            FeedKind::Tag { .. } => "tag",
        }
    }

    /// Start a query selecting this feed's candidate rows.
    ///
    /// The returned builder ends inside the `WHERE` clause so callers can
    /// append further `AND` conditions before the ordering.
    pub fn candidates<'args>(&self) -> QueryBuilder<'args, Sqlite> {
        let mut builder = QueryBuilder::new(
            r#"
            SELECT
                p.id,
                p.author_id,
                u.user_name AS author_user_name,
                u.avatar AS author_avatar,
                p.body,
                (SELECT COUNT(*) FROM likes lc WHERE lc.post_id = p.id) AS like_count,
                p.expire_at,
                p.created_at,
                p.updated_at,
                COALESCE(
                    (SELECT 1 FROM follows ff
                     WHERE ff.follower_id = "#,
        );
        builder.push_bind(self.actor_id);
        builder.push(
            r#" AND ff.followed_id = p.author_id
                     LIMIT 1),
                    0
                ) AS following_author,
                EXISTS (
                    SELECT 1 FROM likes lf
                    JOIN follows fl ON fl.followed_id = lf.actor_id
                    WHERE lf.post_id = p.id AND fl.follower_id = "#,
        );
        builder.push_bind(self.actor_id);
        builder.push(
            r#"
                ) AS liked_by_followed
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE "#,
        );

        self.push_membership(&mut builder);
        builder
    }

    fn push_membership<'args>(&self, builder: &mut QueryBuilder<'args, Sqlite>) {
        match &self.kind {
            FeedKind::Home => {
                builder.push("(p.author_id = ");
                builder.push_bind(self.actor_id);
                builder.push(
                    " OR p.author_id IN (SELECT followed_id FROM follows WHERE follower_id = ",
                );
                builder.push_bind(self.actor_id);
                builder.push(
                    ") OR p.id IN (SELECT lh.post_id FROM likes lh \
                     JOIN follows fh ON fh.followed_id = lh.actor_id \
                     WHERE fh.follower_id = ",
                );
                builder.push_bind(self.actor_id);
                builder.push("))");
            }
            FeedKind::Public { section_tag } => {
                builder.push("p.author_id <> ");
                builder.push_bind(self.actor_id);
                if let Some(tag) = section_tag {
                    push_tag_filter(builder, tag);
                }
            }
            FeedKind::Tag { tag, include_own } => {
                builder.push("1 = 1");
                push_tag_filter(builder, tag);
                if !include_own {
                    builder.push(" AND p.author_id <> ");
                    builder.push_bind(self.actor_id);
                }
            }
        }
    }
}

fn push_tag_filter<'args>(builder: &mut QueryBuilder<'args, Sqlite>, tag: &str) {
    builder.push(" AND p.id IN (SELECT post_id FROM tags WHERE body = ");
    builder.push_bind(tag.to_string());
    builder.push(")");
}
