#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use memory_palace::config::PalaceConfig;
use memory_palace::controller::PalaceController;
use memory_palace::error::{PalaceError, Result};
use memory_palace::generation::{GenerationBackend, GenerationClient, ImageReply, Part};
use memory_palace::palace::image::ImagePayload;
use memory_palace::palace::types::{
    AnchorType, MemoryPalace, QuickRecapItem, SavedMemoryPalace, Scene,
};
use memory_palace::store::{PalaceStore, SqliteStore};
use tempfile::TempDir;

/// Fake model: answers text calls with one scene per `- item` line of the
/// prompt, and image calls with small numbered PNG payloads. With `hang` set,
/// text calls never complete.
#[derive(Default)]
pub struct EchoBackend {
    pub hang: AtomicBool,
    pub garbage_text: AtomicBool,
    pub refuse_images: AtomicBool,
    pub text_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

#[async_trait]
impl GenerationBackend for EchoBackend {
    async fn generate_text(&self, _system_instruction: &str, parts: &[Part]) -> Result<String> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.garbage_text.load(Ordering::SeqCst) {
            return Ok("I'd love to help! Here's a palace: ...".into());
        }

        let prompt = parts
            .iter()
            .find_map(|p| match p {
                Part::Text(text) => Some(text.as_str()),
                Part::Image(_) => None,
            })
            .unwrap_or_default();
        let edited = prompt.contains("updated image");
        let items: Vec<&str> = prompt
            .lines()
            .filter_map(|line| line.trim().strip_prefix("- "))
            .collect();

        let scenes: Vec<_> = items
            .iter()
            .enumerate()
            .map(|(n, item)| {
                serde_json::json!({
                    "locus": format!("{} {}", if edited { "Edited spot" } else { "Spot" }, n + 1),
                    "description": format!("A giant **{item}** sits here."),
                })
            })
            .collect();
        let recap: Vec<_> = items
            .iter()
            .enumerate()
            .map(|(n, item)| serde_json::json!({ "item": format!("**{item}**"), "locusHint": format!("Spot {}", n + 1) }))
            .collect();

        let title = if edited { "Memory Palace: Revisited" } else { "Memory Palace: Echo" };
        Ok(serde_json::json!({
            "title": title,
            "imagePrompt": format!("A route past {}", items.join(", ")),
            "scenes": scenes,
            "quickRecap": recap,
        })
        .to_string())
    }

    async fn generate_image(&self, _parts: &[Part]) -> Result<ImageReply> {
        let n = self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.refuse_images.load(Ordering::SeqCst) {
            return Ok(ImageReply::TextOnly(Some("No image for you.".into())));
        }
        Ok(ImageReply::Image(ImagePayload::new(
            "image/png",
            format!("png-{n}").into_bytes(),
        )))
    }
}

/// SQLite store whose writes can be switched to fail.
pub struct FlakyStore {
    pub inner: SqliteStore,
    pub fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PalaceError::StoreUnavailable(
                "Could not save the palace to the database.".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PalaceStore for FlakyStore {
    async fn put(&self, palace: &SavedMemoryPalace) -> Result<()> {
        self.check()?;
        self.inner.put(palace).await
    }

    async fn get_all(&self) -> Result<Vec<SavedMemoryPalace>> {
        self.inner.get_all().await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.check()?;
        self.inner.delete(id).await
    }
}

pub type TestController = PalaceController<Arc<EchoBackend>, Arc<FlakyStore>>;

pub struct Harness {
    pub _dir: TempDir,
    pub backend: Arc<EchoBackend>,
    pub store: Arc<FlakyStore>,
    pub controller: TestController,
}

/// A controller over an [`EchoBackend`] and a fresh on-disk store.
pub fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(EchoBackend::default());
    let store = Arc::new(FlakyStore::new(SqliteStore::new(dir.path().join("palaces.db"))));
    let controller = PalaceController::new(
        GenerationClient::new(Arc::clone(&backend)),
        Arc::clone(&store),
        &PalaceConfig::default(),
    );
    Harness {
        _dir: dir,
        backend,
        store,
        controller,
    }
}

/// Open a fresh store in a temporary directory.
pub fn temp_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::new(dir.path().join("palaces.db"));
    (dir, store)
}

/// A saved palace with a single one-scene generation.
pub fn saved_palace(id: i64, saved_at: &str) -> SavedMemoryPalace {
    SavedMemoryPalace {
        palace: MemoryPalace {
            title: format!("Palace {id}"),
            image_prompt: "A cozy desk".into(),
            scenes: vec![Scene {
                locus: "Lamp".into(),
                description: "A **Red** lamp.".into(),
            }],
            quick_recap: vec![QuickRecapItem {
                item: "**Red**".into(),
                locus_hint: "Lamp".into(),
            }],
            image_generations: vec![std::array::from_fn(|i| {
                ImagePayload::new("image/png", vec![i as u8]).to_data_url()
            })],
        },
        id,
        saved_at: saved_at.into(),
        anchor_type: AnchorType::Default,
        original_anchor: "A cozy desk".into(),
    }
}
