// Store contract tests. The in-memory stores run everywhere; the Postgres variants
// need a live database and are ignored by default.

use std::time::Duration;

use chrono::Utc;

use todo_app::models::NewTodo;
use todo_app::services::file_store::sha256_hex;
use todo_app::services::{
    seed_data, FileStore, InMemoryFileStore, InMemoryTodoStore, PgFileStore, PgTodoStore,
    TodoStore,
};
use todo_app::utils::date::stored_now;
use todo_app::StoreError;
use uuid::Uuid;

mod test_helpers;
use test_helpers::*;

const PG_TIMEOUT: Duration = Duration::from_secs(5);

async fn create_then_remove_one(store: &dyn TodoStore) {
    let before = Utc::now();
    let first = store
        .create(NewTodo::new("Running", "Get Going", "Admin"))
        .await
        .expect("create first");
    store
        .create(NewTodo::new("Learning", "Learn something new", "Admin"))
        .await
        .expect("create second");

    assert!(first.created_at >= before);
    assert_eq!(first.created_at.timestamp_subsec_nanos() % 1_000, 0);
    assert!(!first.id.is_nil());

    let all = store.find_all().await.expect("find_all");
    assert_eq!(all.len(), 2);

    store.delete(&first).await.expect("delete");

    let remaining = store.find_all().await.expect("find_all");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Learning");
    assert_eq!(remaining[0].body, "Learn something new");
    assert_eq!(remaining[0].author, "Admin");
}

async fn delete_all_is_repeatable(store: &dyn TodoStore) {
    for i in 0..3 {
        store
            .create(NewTodo::new(format!("Todo {}", i), "", "Admin"))
            .await
            .unwrap();
    }

    tokio_test::assert_ok!(store.delete_all().await);
    assert!(store.find_all().await.unwrap().is_empty());

    tokio_test::assert_ok!(store.delete_all().await);
    assert!(store.find_all().await.unwrap().is_empty());
}

async fn lookups_by_owner_and_id(store: &dyn TodoStore) {
    let mine = store.create(NewTodo::new("Walking", "", "alice")).await.unwrap();
    store.create(NewTodo::new("Eating", "", "bob")).await.unwrap();
    store.create(NewTodo::new("Diving", "", "alice")).await.unwrap();

    let alice = store.find_by_owner("alice").await.unwrap();
    assert_eq!(alice.len(), 2);
    assert!(alice.iter().all(|t| t.author == "alice"));
    assert!(store.find_by_owner("carol").await.unwrap().is_empty());

    let found = store.find_by_id(mine.id).await.unwrap();
    assert_eq!(found, Some(mine.clone()));
    assert_eq!(store.find_by_id(Uuid::new_v4()).await.unwrap(), None);

    // Unknown ids are not an error
    store.delete_by_id(Uuid::new_v4()).await.unwrap();
    store.delete_by_id(mine.id).await.unwrap();
    assert_eq!(store.find_by_id(mine.id).await.unwrap(), None);
}

async fn file_round_trip(store: &dyn FileStore) {
    let content = b"\x89PNG\r\n\x1a\nnot really an image".to_vec();
    let before = Utc::now();
    let descriptor = store
        .store(content.clone(), "diagram.png", "image/png")
        .await
        .expect("store");

    assert_eq!(descriptor.filename, "diagram.png");
    assert_eq!(descriptor.mime_type, "image/png");
    assert_eq!(descriptor.length, content.len() as i64);
    assert_eq!(descriptor.sha256, sha256_hex(&content));
    assert!(descriptor.uploaded_at >= before);
    assert_eq!(descriptor.uploaded_at.timestamp_subsec_nanos() % 1_000, 0);

    let listed = store.list_all().await.unwrap();
    assert_eq!(listed, vec![descriptor.clone()]);
    assert_eq!(store.find(descriptor.id).await.unwrap(), Some(descriptor.clone()));

    let fetched = store.fetch_content(&descriptor).await.unwrap();
    assert_eq!(fetched, content);

    store.delete_all().await.unwrap();
    store.delete_all().await.unwrap();
    assert!(store.list_all().await.unwrap().is_empty());

    // The descriptor outlived its blob
    let missing = store.fetch_content(&descriptor).await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_memory_create_then_remove_one() {
    create_then_remove_one(&InMemoryTodoStore::new()).await;
}

#[tokio::test]
async fn test_memory_delete_all_is_repeatable() {
    delete_all_is_repeatable(&InMemoryTodoStore::new()).await;
}

#[tokio::test]
async fn test_memory_lookups_by_owner_and_id() {
    lookups_by_owner_and_id(&InMemoryTodoStore::new()).await;
}

#[tokio::test]
async fn test_memory_create_assigns_id_and_trims_title() {
    let store = InMemoryTodoStore::new();
    let a = store.create(NewTodo::new("  Running  ", "body", "Admin")).await.unwrap();
    let b = store.create(NewTodo::new("Running", "body", "Admin")).await.unwrap();

    assert_eq!(a.title, "Running");
    assert_ne!(a.id, b.id);
    assert!(a.created_at <= b.created_at);
}

#[tokio::test]
async fn test_memory_file_round_trip() {
    file_round_trip(&InMemoryFileStore::new()).await;
}

#[test]
fn test_stored_now_is_whole_microseconds_and_not_early() {
    for _ in 0..100 {
        let before = Utc::now();
        let stored = stored_now();
        assert!(stored >= before);
        assert_eq!(stored.timestamp_subsec_nanos() % 1_000, 0);
    }
}

#[test]
fn test_sha256_hex_matches_known_digest() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_new_todo_requires_title() {
    assert_eq!(NewTodo::new("", "body", "a").validate(), Err("Please enter a title"));
    assert_eq!(NewTodo::new("   ", "body", "a").validate(), Err("Please enter a title"));
    assert_eq!(NewTodo::new("x", "", "a").validate(), Ok(()));
}

#[tokio::test]
async fn test_seed_only_fills_an_empty_store() {
    let store = InMemoryTodoStore::new();

    seed_data::seed_demo_todos(&store).await.unwrap();
    let seeded = store.find_all().await.unwrap();
    assert_eq!(seeded.len(), 6);
    assert!(seeded.iter().all(|t| t.author == "Admin"));
    assert_eq!(seeded[0].title, "Running");
    assert_eq!(seeded[0].body, "Get Going");

    seed_data::seed_demo_todos(&store).await.unwrap();
    assert_eq!(store.find_all().await.unwrap().len(), 6);
}

#[tokio::test]
#[ignore] // Requires database
async fn test_pg_create_then_remove_one() {
    let pool = setup_test_db().await;
    create_then_remove_one(&PgTodoStore::new(pool, PG_TIMEOUT)).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_pg_delete_all_is_repeatable() {
    let pool = setup_test_db().await;
    delete_all_is_repeatable(&PgTodoStore::new(pool, PG_TIMEOUT)).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_pg_lookups_by_owner_and_id() {
    let pool = setup_test_db().await;
    lookups_by_owner_and_id(&PgTodoStore::new(pool, PG_TIMEOUT)).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_pg_file_round_trip() {
    let pool = setup_test_db().await;
    file_round_trip(&PgFileStore::new(pool, PG_TIMEOUT)).await;
}
