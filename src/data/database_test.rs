//! Database tests

use super::*;
use crate::error::AppError;
use crate::feed::{Cursor, FeedQuery};
use futures::FutureExt;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

async fn create_user(db: &Database, user_name: &str) -> i64 {
    db.insert_user(&NewUser::named(user_name)).await.unwrap()
}

fn new_post(author_id: i64, body: &str, at: i64) -> NewPost {
    NewPost {
        author_id,
        body: body.to_string(),
        expire_at: None,
        created_at: at,
    }
}

async fn create_post(db: &Database, author_id: i64, body: &str, at: i64) -> i64 {
    db.insert_post_with_tags(&new_post(author_id, body, at), &[])
        .await
        .unwrap()
}

fn ids(items: &[FeedItem]) -> Vec<i64> {
    items.iter().map(|item| item.id).collect()
}

#[tokio::test]
async fn test_database_connection() {
    let (db, _temp_dir) = create_test_db().await;
    assert_eq!(db.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_user_insert_and_get() {
    let (db, _temp_dir) = create_test_db().await;

    let id = db
        .insert_user(&NewUser {
            user_name: "ada".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            avatar: "🦊".to_string(),
        })
        .await
        .unwrap();

    let user = db.get_user(id).await.unwrap().unwrap();
    assert_eq!(user.user_name, "ada");
    assert_eq!(user.avatar, "🦊");

    let by_name = db.get_user_by_user_name("ada").await.unwrap().unwrap();
    assert_eq!(by_name.id, id);
    assert!(db.get_user_by_user_name("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_follow_is_stored_once() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    assert!(db.insert_follow(alice, bob).await.unwrap());
    assert!(!db.insert_follow(alice, bob).await.unwrap());
    assert!(db.is_following(alice, bob).await.unwrap());
    assert!(!db.is_following(bob, alice).await.unwrap());
}

#[tokio::test]
async fn test_post_with_tags_is_stored() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;

    let tags = vec!["#world".to_string(), "#rust".to_string()];
    let post_id = db
        .insert_post_with_tags(&new_post(alice, "Hello #world #rust", 100), &tags)
        .await
        .unwrap();

    let post = db.get_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.author_id, alice);
    assert_eq!(post.created_at, 100);
    assert_eq!(post.updated_at, post.created_at);
    assert_eq!(db.get_post_tags(post_id).await.unwrap(), tags);
}

#[tokio::test]
async fn test_failed_tag_insert_rolls_back_post() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;

    // The schema rejects a double underscore in a tag.
    let tags = vec!["#fine".to_string(), "#bad__tag".to_string()];
    let result = db
        .insert_post_with_tags(&new_post(alice, "doomed", 100), &tags)
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));
    assert_eq!(db.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_overlong_tag_rolls_back_post() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;

    let tags = vec![format!("#{}", "x".repeat(40))];
    let result = db
        .insert_post_with_tags(&new_post(alice, "doomed", 100), &tags)
        .await;

    assert!(result.is_err());
    assert_eq!(db.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_transaction_error_rolls_back() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;

    let result: Result<i64, AppError> = db
        .with_transaction(move |uow| {
            async move {
                uow.insert_post(&new_post(alice, "never visible", 100))
                    .await?;
                Err(AppError::Internal(anyhow::anyhow!("abort")))
            }
            .boxed()
        })
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_eq!(db.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_transaction_commits_on_success() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;

    let post_id = db
        .with_transaction(move |uow| {
            async move {
                let post_id = uow.insert_post(&new_post(alice, "kept", 100)).await?;
                uow.insert_like(post_id, alice, 101).await?;
                Ok(post_id)
            }
            .boxed()
        })
        .await
        .unwrap();

    assert!(db.get_post(post_id).await.unwrap().is_some());
    assert_eq!(db.count_likes(post_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_transaction_panic_rolls_back() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;
    let db = std::sync::Arc::new(db);

    let task_db = db.clone();
    let outcome = tokio::spawn(async move {
        let _: Result<(), AppError> = task_db
            .with_transaction(move |uow| {
                async move {
                    uow.insert_post(&new_post(alice, "abandoned", 100))
                        .await?;
                    panic!("writer crashed mid-transaction");
                }
                .boxed()
            })
            .await;
    })
    .await;

    assert!(outcome.unwrap_err().is_panic());
    assert_eq!(db.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_autocommit_writes_share_the_write_interface() {
    let (mut db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;

    let tags = vec!["#direct".to_string()];
    let post_id = write_post_with_tags(&mut db, &new_post(alice, "#direct", 100), &tags)
        .await
        .unwrap();

    assert_eq!(db.get_post_tags(post_id).await.unwrap(), tags);
}

#[tokio::test]
async fn test_repeated_likes_are_distinct_events() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    let post_id = create_post(&db, alice, "like me", 100).await;

    let first = db.record_like(post_id, bob, 101).await.unwrap();
    let second = db.record_like(post_id, bob, 102).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(db.count_likes(post_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_like_on_missing_post_fails() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;

    let result = db.record_like(9_999, alice, 100).await;
    assert!(matches!(result, Err(AppError::Database(_))));
}

#[tokio::test]
async fn test_equal_timestamps_are_ordered_by_id() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;
    let reader = create_user(&db, "reader").await;

    let first = create_post(&db, alice, "one", 500).await;
    let second = create_post(&db, alice, "two", 500).await;
    let third = create_post(&db, alice, "three", 500).await;

    let query = FeedQuery::public(reader);
    let page = db.paginate(&query, None, 2).await.unwrap();
    assert_eq!(ids(&page.items), vec![third, second]);

    let page = db
        .paginate(&query, page.next_cursor.as_ref(), 2)
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![first]);
    assert!(page.is_last());
}

#[tokio::test]
async fn test_conjunctive_bound_skips_older_post_with_larger_id() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "alice").await;
    let reader = create_user(&db, "reader").await;

    let edited = create_post(&db, alice, "first, later edited", 100).await;
    let skipped = create_post(&db, alice, "second", 200).await;
    let newest = create_post(&db, alice, "third", 300).await;
    db.set_post_updated_at_for_test(edited, 250).await.unwrap();

    let query = FeedQuery::public(reader);

    // Unbounded ordering is (300, newest), (250, edited), (200, skipped).
    let all = db.paginate(&query, None, 10).await.unwrap();
    assert_eq!(ids(&all.items), vec![newest, edited, skipped]);

    // Walking one row at a time never reaches `skipped`: after the cursor
    // lands on (250, edited) the bound `id < edited` excludes it even though
    // its timestamp is older.
    let page = db.paginate(&query, None, 1).await.unwrap();
    assert_eq!(ids(&page.items), vec![newest]);

    let page = db
        .paginate(&query, page.next_cursor.as_ref(), 1)
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![edited]);
    assert_eq!(page.next_cursor, Some(Cursor::new(250, edited as u64, 1)));

    let page = db
        .paginate(&query, page.next_cursor.as_ref(), 1)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(page.is_last());
}

#[tokio::test]
async fn test_feed_items_carry_author_and_reaction_data() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = db
        .insert_user(&NewUser {
            user_name: "alice".to_string(),
            avatar: "🐱".to_string(),
            ..NewUser::default()
        })
        .await
        .unwrap();
    let bob = create_user(&db, "bob").await;
    let carol = create_user(&db, "carol").await;

    let post_id = create_post(&db, alice, "hello", 100).await;
    db.insert_follow(bob, alice).await.unwrap();
    db.insert_follow(bob, carol).await.unwrap();
    db.record_like(post_id, carol, 101).await.unwrap();
    db.record_like(post_id, carol, 102).await.unwrap();

    let page = db.paginate(&FeedQuery::public(bob), None, 10).await.unwrap();
    let item = &page.items[0];

    assert_eq!(item.id, post_id);
    assert_eq!(item.author_user_name, "alice");
    assert_eq!(item.author_avatar, "🐱");
    assert_eq!(item.like_count, 2);
    assert!(item.following_author);
    assert!(item.liked_by_followed);

    let page = db.paginate(&FeedQuery::public(carol), None, 10).await.unwrap();
    let item = &page.items[0];
    assert!(!item.following_author);
    assert!(!item.liked_by_followed);
}
