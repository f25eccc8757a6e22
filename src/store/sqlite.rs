//! SQLite-backed [`PalaceStore`].
//!
//! The database is opened on first use and the connection cached for the
//! lifetime of the store. A failed open is not cached, so the next call tries
//! again. Blocking SQLite work runs on `spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::OnceCell;

use super::{sort_newest_first, PalaceStore};
use crate::error::{PalaceError, Result};
use crate::palace::types::SavedMemoryPalace;

const OPEN_FAILED: &str = "Error opening database. Please ensure the palace database path is \
     writable and not locked by another process.";
const SAVE_FAILED: &str = "Could not save the palace to the database.";
const LOAD_FAILED: &str = "Could not retrieve saved palaces from the database.";
const DELETE_FAILED: &str = "Could not delete the palace from the database.";

pub struct SqliteStore {
    path: PathBuf,
    conn: OnceCell<Arc<Mutex<Connection>>>,
}

impl SqliteStore {
    /// Create a store for the database at `path`. Nothing is opened until the
    /// first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connection(&self) -> Result<Arc<Mutex<Connection>>> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let conn = tokio::task::spawn_blocking(move || crate::db::open_database(&path))
                    .await
                    .map_err(|e| anyhow::anyhow!("db task failed: {e}"))
                    .and_then(|opened| opened)
                    .map_err(|e| {
                        tracing::error!(path = %self.path.display(), error = %format!("{e:#}"), "database open failed");
                        PalaceError::StoreUnavailable(OPEN_FAILED.into())
                    })?;
                Ok::<_, PalaceError>(Arc::new(Mutex::new(conn)))
            })
            .await?;
        Ok(Arc::clone(conn))
    }

    /// Run `op` against the connection on the blocking pool. Any failure is
    /// logged and reported as `StoreUnavailable(failure)`.
    async fn run<T, F>(&self, failure: &'static str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
    {
        let db = self.connection().await?;
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| anyhow::anyhow!("db task failed: {e}"))
        .and_then(|result| result)
        .map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "{failure}");
            PalaceError::StoreUnavailable(failure.into())
        })
    }
}

#[async_trait]
impl PalaceStore for SqliteStore {
    async fn put(&self, palace: &SavedMemoryPalace) -> Result<()> {
        let record = serde_json::to_string(palace).map_err(|e| {
            tracing::error!(id = palace.id, error = %e, "palace serialization failed");
            PalaceError::StoreUnavailable(SAVE_FAILED.into())
        })?;
        let id = palace.id;
        let saved_at = palace.saved_at.clone();

        self.run(SAVE_FAILED, move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO palaces (id, saved_at, record) VALUES (?1, ?2, ?3)",
                params![id, saved_at, record],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(id, "palace stored");
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<SavedMemoryPalace>> {
        let rows = self
            .run(LOAD_FAILED, |conn| {
                let mut stmt = conn.prepare("SELECT id, record FROM palaces")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        let mut palaces = Vec::with_capacity(rows.len());
        for (id, record) in rows {
            match serde_json::from_str::<SavedMemoryPalace>(&record) {
                Ok(palace) => palaces.push(palace),
                Err(e) => tracing::warn!(id, error = %e, "skipping unreadable palace record"),
            }
        }

        sort_newest_first(&mut palaces);
        Ok(palaces)
    }

    async fn get(&self, id: i64) -> Result<Option<SavedMemoryPalace>> {
        let record = self
            .run(LOAD_FAILED, move |conn| {
                let mut stmt = conn.prepare("SELECT record FROM palaces WHERE id = ?1")?;
                let mut rows = stmt.query(params![id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get::<_, String>(0)?)),
                    None => Ok(None),
                }
            })
            .await?;

        record
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    tracing::error!(id, error = %e, "unreadable palace record");
                    PalaceError::StoreUnavailable(LOAD_FAILED.into())
                })
            })
            .transpose()
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let removed = self
            .run(DELETE_FAILED, move |conn| {
                Ok(conn.execute("DELETE FROM palaces WHERE id = ?1", params![id])?)
            })
            .await?;

        tracing::debug!(id, removed, "palace deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palace::types::{AnchorType, MemoryPalace, QuickRecapItem, Scene};

    fn palace(id: i64, saved_at: &str) -> SavedMemoryPalace {
        SavedMemoryPalace {
            palace: MemoryPalace {
                title: format!("Palace {id}"),
                image_prompt: "prompt".into(),
                scenes: vec![Scene {
                    locus: "Door".into(),
                    description: "A **Red** door.".into(),
                }],
                quick_recap: vec![QuickRecapItem {
                    item: "**Red**".into(),
                    locus_hint: "Door".into(),
                }],
                image_generations: vec![std::array::from_fn(|i| format!("data:image/png;base64,AA{i}="))],
            },
            id,
            saved_at: saved_at.into(),
            anchor_type: AnchorType::Default,
            original_anchor: "A cozy desk".into(),
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_same_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("palaces.db"));
        let saved = palace(1, "2024-05-01T10:00:00.000Z");

        store.put(&saved).await.unwrap();

        assert_eq!(store.get(1).await.unwrap(), Some(saved));
        assert_eq!(store.get(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_replaces_existing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("palaces.db"));
        let mut saved = palace(7, "2024-05-01T10:00:00.000Z");
        store.put(&saved).await.unwrap();

        saved.palace.title = "Renamed".into();
        store.put(&saved).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].palace.title, "Renamed");
        assert_eq!(all[0].id, 7);
    }

    #[tokio::test]
    async fn corrupt_rows_are_skipped_on_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palaces.db");
        let store = SqliteStore::new(&path);
        store.put(&palace(1, "2024-05-01T10:00:00.000Z")).await.unwrap();

        let conn = crate::db::open_database(&path).unwrap();
        conn.execute(
            "INSERT INTO palaces (id, saved_at, record) VALUES (2, '2024-05-02T00:00:00Z', 'not json')",
            [],
        )
        .unwrap();
        drop(conn);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn unopenable_path_reports_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let store = SqliteStore::new(blocker.join("palaces.db"));

        let err = store.get_all().await.unwrap_err();
        match err {
            PalaceError::StoreUnavailable(message) => assert!(message.starts_with("Error opening database")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
