//! Repositories and the ledger over the `SQLite` store.

use std::sync::Arc;

use besto::clock::Clock;
use besto::config::{GlobalConfig, QuotaConfig};
use besto::models::event::{EventDraft, EventType};
use besto::models::task::{Priority, Task, TaskStatus};
use besto::persistence::db;
use besto::persistence::event_repo::EventRepo;
use besto::persistence::kv_store::{KeyValueStore, SqliteKvStore};
use besto::persistence::note_repo::{NoteDraft, NoteRepo};
use besto::persistence::task_repo::TaskRepo;
use besto::quota::{QuotaLedger, QUOTA_KEY};
use serde_json::json;

use crate::common::{clock_at, date, monday_morning, time};

async fn memory_store() -> (Arc<sqlx::SqlitePool>, Arc<dyn KeyValueStore>) {
    let pool = Arc::new(db::connect_memory().await.expect("memory db"));
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new(Arc::clone(&pool)));
    (pool, store)
}

#[tokio::test]
async fn values_upsert_by_key() {
    let (_pool, store) = memory_store().await;

    assert!(store.get("missing").await.expect("get").is_none());
    store.set("k", json!({ "n": 1 })).await.expect("set");
    store.set("k", json!({ "n": 2 })).await.expect("overwrite");
    assert_eq!(store.get("k").await.expect("get"), Some(json!({ "n": 2 })));
}

#[tokio::test]
async fn corrupt_value_reads_as_absent() {
    let (pool, store) = memory_store().await;
    sqlx::query("INSERT INTO kv_entry (key, value, updated_at) VALUES ('tasks', '{not json', '')")
        .execute(pool.as_ref())
        .await
        .expect("raw insert");

    assert!(store.get("tasks").await.expect("get").is_none());
    let tasks = TaskRepo::new(Arc::clone(&store));
    assert!(tasks.list().await.expect("list").is_empty());
}

#[tokio::test]
async fn task_repo_persists_through_sql() {
    let (_pool, store) = memory_store().await;
    let repo = TaskRepo::new(Arc::clone(&store));

    let first = repo
        .create(Task::new("first".into(), Priority::None, None, None))
        .await
        .expect("first");
    repo.create(Task::new("second".into(), Priority::Low, None, None))
        .await
        .expect("second");
    repo.set_status(&first.id, TaskStatus::Completed)
        .await
        .expect("status");

    let reopened = TaskRepo::new(store);
    let tasks = reopened.list().await.expect("list");
    let contents: Vec<&str> = tasks.iter().map(|task| task.content.as_str()).collect();
    assert_eq!(contents, vec!["second", "first"]);
    assert_eq!(tasks[1].status, TaskStatus::Completed);
    assert_eq!(reopened.open_tasks().await.expect("open").len(), 1);
}

#[tokio::test]
async fn fully_populated_records_reload_unchanged() {
    let (_pool, store) = memory_store().await;

    let task = TaskRepo::new(Arc::clone(&store))
        .create(Task::new(
            "submit report".into(),
            Priority::Medium,
            Some(date(2025, 3, 14)),
            Some(time(17, 30)),
        ))
        .await
        .expect("task");
    let note = NoteRepo::new(Arc::clone(&store))
        .create(NoteDraft {
            title: "Trip".into(),
            content: "pack boots".into(),
            tags: vec!["travel".into()],
            image: Some("data:image/png;base64,iVBORw0KGgo=".into()),
        })
        .await
        .expect("note");
    let mut draft = EventDraft::new(
        "Offsite".into(),
        EventType::Birthday,
        date(2025, 3, 18),
        Some(time(9, 15)),
    );
    draft.end_date = Some(date(2025, 3, 19));
    draft.end_time = Some(time(15, 45));
    draft.location = Some("Harbour room".into());
    draft.description = Some("bring cake".into());
    let events = EventRepo::new(Arc::clone(&store));
    let created = events.append(draft).await.expect("event");
    let event = events.mark_triggered(&created.id).await.expect("trigger");

    assert_eq!(TaskRepo::new(Arc::clone(&store)).list().await.expect("tasks"), vec![task]);
    assert_eq!(NoteRepo::new(Arc::clone(&store)).list().await.expect("notes"), vec![note]);
    assert_eq!(EventRepo::new(store).list().await.expect("events"), vec![event]);
}

#[tokio::test]
async fn ledger_balance_survives_new_instances_and_refills_next_day() {
    let (_pool, store) = memory_store().await;
    let clock = clock_at(monday_morning());
    let dyn_clock: Arc<dyn Clock> = Arc::clone(&clock) as Arc<dyn Clock>;

    let ledger = QuotaLedger::new(
        Arc::clone(&store),
        Arc::clone(&dyn_clock),
        QuotaConfig::default(),
    );
    assert!(ledger.try_consume(100).await.expect("debit"));

    let again = QuotaLedger::new(Arc::clone(&store), dyn_clock, QuotaConfig::default());
    assert_eq!(again.remaining().await.expect("remaining"), 900);
    assert!(store.get(QUOTA_KEY).await.expect("get").is_some());

    clock.advance(chrono::Duration::days(1));
    assert_eq!(again.remaining().await.expect("remaining"), 1000);
}

#[tokio::test]
async fn file_store_keeps_data_across_reconnects() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = GlobalConfig::from_toml_str(&format!(
        "data_dir = '{}'\n",
        dir.path().display()
    ))
    .expect("config");

    {
        let pool = Arc::new(db::connect(&config).await.expect("connect"));
        let store = SqliteKvStore::new(Arc::clone(&pool));
        store.set("notes", json!([])).await.expect("set");
        pool.close().await;
    }
    assert!(config.db_path().exists());

    let pool = Arc::new(db::connect(&config).await.expect("reconnect"));
    let store = SqliteKvStore::new(pool);
    assert_eq!(store.get("notes").await.expect("get"), Some(json!([])));
}
