//! Transactional writes
//!
//! A [`UnitOfWork`] wraps an open sqlx transaction and exposes the same
//! [`PostWrites`] interface as [`Database`], so write paths can be written
//! once and run either inside or outside a transaction.

use std::future::Future;

use futures::future::BoxFuture;
use sqlx::{Executor, QueryBuilder, Sqlite, Transaction};

use super::database::Database;
use super::models::NewPost;
use crate::error::Result;
use crate::metrics::TRANSACTIONS_TOTAL;

/// Writes for the post, tag and like tables
pub trait PostWrites {
    /// Insert a post row and return its id
    fn insert_post(
        &mut self,
        post: &NewPost,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Attach tags to a post in a single statement
    fn insert_tags(
        &mut self,
        post_id: i64,
        tags: &[String],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Insert a like row and return its id
    fn insert_like(
        &mut self,
        post_id: i64,
        actor_id: i64,
        liked_at: i64,
    ) -> impl Future<Output = Result<i64>> + Send;
}

/// Insert a post followed by its tags.
pub async fn write_post_with_tags<W: PostWrites + Send>(
    writer: &mut W,
    post: &NewPost,
    tags: &[String],
) -> Result<i64> {
    let post_id = writer.insert_post(post).await?;

    if !tags.is_empty() {
        writer.insert_tags(post_id, tags).await?;
    }

    Ok(post_id)
}

async fn insert_post_row<'c, E>(executor: E, post: &NewPost) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO posts (author_id, body, expire_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.author_id)
    .bind(&post.body)
    .bind(post.expire_at)
    .bind(post.created_at)
    .bind(post.created_at)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn insert_tag_rows<'c, E>(executor: E, post_id: i64, tags: &[String]) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO tags (post_id, body) ");
    builder.push_values(tags, |mut row, tag| {
        row.push_bind(post_id).push_bind(tag.clone());
    });
    builder.build().execute(executor).await?;

    Ok(())
}

async fn insert_like_row<'c, E>(
    executor: E,
    post_id: i64,
    actor_id: i64,
    liked_at: i64,
) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO likes (post_id, actor_id, created_at) VALUES (?, ?, ?)")
        .bind(post_id)
        .bind(actor_id)
        .bind(liked_at)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Autocommit writes straight against the pool.
impl PostWrites for Database {
    async fn insert_post(&mut self, post: &NewPost) -> Result<i64> {
        insert_post_row(self.pool(), post).await
    }

    async fn insert_tags(&mut self, post_id: i64, tags: &[String]) -> Result<()> {
        insert_tag_rows(self.pool(), post_id, tags).await
    }

    async fn insert_like(
        &mut self,
        post_id: i64,
        actor_id: i64,
        liked_at: i64,
    ) -> Result<i64> {
        insert_like_row(self.pool(), post_id, actor_id, liked_at).await
    }
}

/// Writes bound to one open transaction.
///
/// Dropping a `UnitOfWork` without committing rolls the transaction back,
/// which covers panics and cancelled futures.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        TRANSACTIONS_TOTAL.with_label_values(&["committed"]).inc();
        Ok(())
    }

    async fn rollback(self) {
        if let Err(error) = self.tx.rollback().await {
            tracing::warn!(%error, "Transaction rollback failed; connection will discard it");
        }
        TRANSACTIONS_TOTAL.with_label_values(&["rolled_back"]).inc();
    }
}

impl PostWrites for UnitOfWork {
    async fn insert_post(&mut self, post: &NewPost) -> Result<i64> {
        insert_post_row(&mut *self.tx, post).await
    }

    async fn insert_tags(&mut self, post_id: i64, tags: &[String]) -> Result<()> {
        insert_tag_rows(&mut *self.tx, post_id, tags).await
    }

    async fn insert_like(
        &mut self,
        post_id: i64,
        actor_id: i64,
        liked_at: i64,
    ) -> Result<i64> {
        insert_like_row(&mut *self.tx, post_id, actor_id, liked_at).await
    }
}

impl Database {
    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`. If `f`
    /// panics or its future is dropped the transaction is rolled back when
    /// the `UnitOfWork` is dropped.
    pub async fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'u> FnOnce(&'u mut UnitOfWork) -> BoxFuture<'u, Result<T>>,
    {
        let mut uow = UnitOfWork {
            tx: self.pool().begin().await?,
        };

        let result = f(&mut uow).await;

        match result {
            Ok(value) => {
                uow.commit().await?;
                Ok(value)
            }
            Err(error) => {
                tracing::debug!(%error, "Rolling back unit of work");
                uow.rollback().await;
                Err(error)
            }
        }
    }
}
