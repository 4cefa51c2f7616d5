use storage::repository::KeyValueStore;
use storage::sqlite::SqliteStore;

#[tokio::test]
async fn sqlite_round_trips_values() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    assert_eq!(store.get("games_count").await.unwrap(), None);

    store.set("games_count", b"3").await.unwrap();
    assert_eq!(
        store.get("games_count").await.unwrap().as_deref(),
        Some(b"3".as_ref())
    );
}

#[tokio::test]
async fn sqlite_overwrites_on_conflict() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    store
        .set("best_game", br#"{"correct":3,"total":10}"#)
        .await
        .unwrap();
    store
        .set("best_game", br#"{"correct":9,"total":10}"#)
        .await
        .unwrap();

    let value = store.get("best_game").await.unwrap().unwrap();
    assert_eq!(value, br#"{"correct":9,"total":10}"#);
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("first migrate");
    store.migrate().await.expect("second migrate");

    store.set("total_answers", b"10").await.unwrap();
    assert!(store.get("total_answers").await.unwrap().is_some());
}
