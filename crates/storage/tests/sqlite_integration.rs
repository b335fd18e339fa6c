use std::sync::Arc;

use quest_core::model::{ScoreRecord, Scoreboard};
use quest_core::time::fixed_now;
use storage::repository::{
    KeyValueStore, KvScoreboardRepository, SCOREBOARD_KEY, ScoreboardRepository, Storage,
};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_kv_set_get_remove() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.get("missing").await.unwrap().is_none());

    repo.set("greeting", "hello").await.unwrap();
    assert_eq!(repo.get("greeting").await.unwrap().as_deref(), Some("hello"));

    repo.set("greeting", "bonjour").await.unwrap();
    assert_eq!(
        repo.get("greeting").await.unwrap().as_deref(),
        Some("bonjour")
    );

    repo.remove("greeting").await.unwrap();
    assert!(repo.get("greeting").await.unwrap().is_none());

    // removing an absent key is not an error
    repo.remove("greeting").await.unwrap();
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.set("k", "v").await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn sqlite_scoreboard_survives_reopen() {
    let url = "sqlite:file:memdb_scoreboard?mode=memory&cache=shared";
    let first = SqliteRepository::connect(url).await.expect("connect");
    first.migrate().await.expect("migrate");
    let scoreboard = KvScoreboardRepository::new(Arc::new(first.clone()));

    let mut board = Scoreboard::empty();
    board.push(ScoreRecord::new(3, fixed_now(), "a"));
    board.push(ScoreRecord::new(5, fixed_now(), "b"));
    scoreboard.save(&board).await.unwrap();

    // A second pool on the same shared-cache database sees the document
    // while the first pool keeps it alive.
    let storage = Storage::sqlite(url).await.expect("reopen");
    let loaded = storage.scoreboard.load().await.unwrap();
    assert_eq!(loaded.num_scores(), 2);
    assert!((loaded.average() - 4.0).abs() < f64::EPSILON);
    assert!(storage.kv.get(SCOREBOARD_KEY).await.unwrap().is_some());

    storage.scoreboard.clear().await.unwrap();
    assert!(scoreboard.load().await.unwrap().is_empty());
    drop(first);
}
