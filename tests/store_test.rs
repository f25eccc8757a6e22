mod helpers;

use helpers::{saved_palace, temp_store};
use memory_palace::store::PalaceStore;

#[tokio::test]
async fn get_all_sorts_newest_first_for_any_insert_order() {
    let (_dir, store) = temp_store();
    let stamps = [
        (3, "2024-03-01T08:00:00.000Z"),
        (1, "2024-01-01T08:00:00.000Z"),
        (4, "2024-04-01T08:00:00.000Z"),
        (2, "2024-02-01T08:00:00.000Z"),
    ];
    for (id, saved_at) in stamps {
        store.put(&saved_palace(id, saved_at)).await.unwrap();
    }

    let ids: Vec<i64> = store.get_all().await.unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
}

#[tokio::test]
async fn sort_uses_time_not_text() {
    let (_dir, store) = temp_store();
    // Same instant expressed with different offsets; +02:00 is earlier in UTC.
    store.put(&saved_palace(1, "2024-01-01T10:00:00+02:00")).await.unwrap();
    store.put(&saved_palace(2, "2024-01-01T09:00:00Z")).await.unwrap();

    let ids: Vec<i64> = store.get_all().await.unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn saved_record_round_trips_unchanged() {
    let (_dir, store) = temp_store();
    let palace = saved_palace(1_717_000_000_000, "2024-05-29T16:26:40.000Z");

    store.put(&palace).await.unwrap();

    assert_eq!(store.get(palace.id).await.unwrap(), Some(palace.clone()));
    assert_eq!(store.get_all().await.unwrap(), vec![palace]);
}

#[tokio::test]
async fn delete_removes_from_get_all() {
    let (_dir, store) = temp_store();
    store.put(&saved_palace(1, "2024-01-01T00:00:00.000Z")).await.unwrap();
    store.put(&saved_palace(2, "2024-01-02T00:00:00.000Z")).await.unwrap();

    store.delete(1).await.unwrap();
    // deleting a missing id is fine
    store.delete(99).await.unwrap();

    let ids: Vec<i64> = store.get_all().await.unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn records_survive_reopening_the_store() {
    let (dir, store) = temp_store();
    store.put(&saved_palace(5, "2024-01-01T00:00:00.000Z")).await.unwrap();
    drop(store);

    let reopened = memory_palace::store::SqliteStore::new(dir.path().join("palaces.db"));
    assert_eq!(reopened.get_all().await.unwrap().len(), 1);
}
