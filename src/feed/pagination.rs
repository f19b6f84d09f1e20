//! Keyset pagination
//!
//! A page is fetched by bounding the composed feed query with the cursor's
//! `(updated_at, id)` position, asking for one row more than the page size,
//! and using that extra row only as the "more pages remain" signal.

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};

use super::cursor::Cursor;
use super::query::{FEED_ORDER, FeedQuery};
use crate::config::FeedConfig;
use crate::data::FeedItem;

/// One page of a feed
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Where the next page starts; `None` once the feed is exhausted
    #[serde(skip)]
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Opaque token for the next page, or `""` at the end of the feed.
    pub fn next_token(&self) -> String {
        self.next_cursor
            .map(|cursor| cursor.encode())
            .unwrap_or_default()
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Pick the page size for a request.
///
/// An explicit non-zero size wins, then the size carried by the cursor, then
/// the configured default. The result never exceeds the configured maximum.
pub fn resolve_page_size(
    explicit: Option<u32>,
    cursor: Option<&Cursor>,
    feed: &FeedConfig,
) -> u32 {
    explicit
        .filter(|size| *size > 0)
        .or_else(|| cursor.map(|cursor| cursor.page_size).filter(|size| *size > 0))
        .unwrap_or(feed.default_page_size)
        .min(feed.max_page_size)
}

/// Build the bounded, ordered and limited query for one page.
///
/// The cursor bound is the conjunction `updated_at <= t AND id < i`. Under
/// `ORDER BY updated_at DESC, id DESC` this skips any row that is older than
/// the cursor but has a larger id (a post edited after newer posts were
/// created); callers relying on strict lexicographic continuation must keep
/// `updated_at` and `id` monotonic together.
pub fn page_query<'args>(
    query: &FeedQuery,
    cursor: Option<&Cursor>,
    page_size: u32,
) -> QueryBuilder<'args, Sqlite> {
    let mut builder = query.candidates();

    if let Some(cursor) = cursor {
        builder.push(" AND p.updated_at <= ");
        builder.push_bind(cursor.last_seen_time);
        builder.push(" AND p.id < ");
        builder.push_bind(i64::try_from(cursor.last_seen_id).unwrap_or(i64::MAX));
    }

    builder.push(FEED_ORDER);
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(page_size) + 1);
    builder
}

/// Trim an overfetched row set to `page_size` and derive the next cursor
/// from the last row kept.
pub fn finish_page(mut rows: Vec<FeedItem>, page_size: u32) -> Page<FeedItem> {
    let page_len = usize::try_from(page_size).unwrap_or(usize::MAX);

    if rows.len() <= page_len {
        return Page {
            items: rows,
            next_cursor: None,
        };
    }

    rows.truncate(page_len);
    let next_cursor = rows.last().map(|last| {
        Cursor::new(
            last.updated_at,
            u64::try_from(last.id).unwrap_or_default(),
            page_size,
        )
    });

    Page {
        items: rows,
        next_cursor,
    }
}
