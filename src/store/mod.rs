//! Persistence for saved palaces.
//!
//! Provides the [`PalaceStore`] trait and a SQLite implementation that holds
//! whole-record snapshots. Every failure is reported as
//! [`PalaceError::StoreUnavailable`](crate::error::PalaceError::StoreUnavailable)
//! carrying a message fit for the user.

pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::palace::types::SavedMemoryPalace;

pub use sqlite::SqliteStore;

/// Key-value store of saved palaces, keyed by palace id.
#[async_trait]
pub trait PalaceStore: Send + Sync {
    /// Insert or replace the full snapshot of a palace.
    async fn put(&self, palace: &SavedMemoryPalace) -> Result<()>;

    /// All saved palaces, newest `saved_at` first.
    async fn get_all(&self) -> Result<Vec<SavedMemoryPalace>>;

    /// A single palace by id. The default scans [`PalaceStore::get_all`].
    async fn get(&self, id: i64) -> Result<Option<SavedMemoryPalace>> {
        Ok(self.get_all().await?.into_iter().find(|p| p.id == id))
    }

    /// Remove a palace. Deleting a missing id is not an error.
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
impl<T: PalaceStore + ?Sized> PalaceStore for Arc<T> {
    async fn put(&self, palace: &SavedMemoryPalace) -> Result<()> {
        (**self).put(palace).await
    }

    async fn get_all(&self) -> Result<Vec<SavedMemoryPalace>> {
        (**self).get_all().await
    }

    async fn get(&self, id: i64) -> Result<Option<SavedMemoryPalace>> {
        (**self).get(id).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        (**self).delete(id).await
    }
}

/// Sort by `saved_at` descending. Records with an unparseable timestamp sort last.
pub fn sort_newest_first(palaces: &mut [SavedMemoryPalace]) {
    palaces.sort_by(|a, b| b.saved_at_time().cmp(&a.saved_at_time()));
}
