//! Core palace type definitions.
//!
//! Defines [`MemoryPalace`] (a generated palace), [`SavedMemoryPalace`] (the
//! persisted snapshot), [`AnchorType`] / [`AnchorValue`] (what the palace is
//! built on), and [`PalaceUpdate`] (the partial result of an image edit).
//! JSON field names are camelCase so stored records keep the original wire shape.

use serde::{Deserialize, Serialize};

use super::emphasis::strip_emphasis;
use super::image::ImagePayload;

/// Number of images produced by every generation or regeneration step.
pub const IMAGES_PER_BATCH: usize = 4;

/// One generation step's worth of images, as data URIs.
pub type ImageBatch = [String; IMAGES_PER_BATCH];

/// What kind of anchor the palace is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorType {
    /// A photo supplied by the user.
    Upload,
    /// A real-world place, e.g. "Eiffel Tower, Paris".
    Place,
    /// An everyday object or setting, e.g. "A cozy desk".
    Default,
}

impl AnchorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Place => "place",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for AnchorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnchorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(Self::Upload),
            "place" => Ok(Self::Place),
            "default" => Ok(Self::Default),
            _ => Err(format!("unknown anchor type: {s}")),
        }
    }
}

/// The anchor's value: free text for objects and places, an image for uploads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnchorValue {
    #[default]
    Empty,
    Text(String),
    Image(ImagePayload),
}

impl AnchorValue {
    /// `true` when there is nothing usable to build a palace on.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Image(image) => image.data.is_empty(),
        }
    }

    /// The value recorded as `originalAnchor` when the palace is saved.
    pub fn to_original_anchor(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Image(image) => image.to_data_url(),
        }
    }
}

/// A single mnemonic scene at one locus along the palace route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub locus: String,
    /// 1-2 sentences; memorized terms are wrapped in `**`.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickRecapItem {
    pub item: String,
    pub locus_hint: String,
}

/// A generated memory palace. Lives in memory until the user saves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPalace {
    pub title: String,
    pub image_prompt: String,
    pub scenes: Vec<Scene>,
    pub quick_recap: Vec<QuickRecapItem>,
    /// Append-only. The first batch comes from the initial generation, one more
    /// per regeneration.
    pub image_generations: Vec<ImageBatch>,
}

impl MemoryPalace {
    /// Merge a regeneration result: append its batch and take each text field
    /// only when the update carries one.
    pub fn apply_update(&mut self, update: PalaceUpdate) {
        self.image_generations.push(update.image_batch);
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(image_prompt) = update.image_prompt {
            self.image_prompt = image_prompt;
        }
        if let Some(scenes) = update.scenes {
            self.scenes = scenes;
        }
        if let Some(quick_recap) = update.quick_recap {
            self.quick_recap = quick_recap;
        }
    }

    /// The most recent image batch.
    pub fn latest_batch(&self) -> Option<&ImageBatch> {
        self.image_generations.last()
    }

    /// Look up one image by generation and position.
    pub fn image(&self, generation: usize, index: usize) -> Option<&str> {
        self.image_generations
            .get(generation)
            .and_then(|batch| batch.get(index))
            .map(String::as_str)
    }

    /// The memorized items as listed in the quick recap, without emphasis markers.
    pub fn recap_items(&self) -> Vec<String> {
        self.quick_recap
            .iter()
            .map(|entry| strip_emphasis(&entry.item).trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// A palace written to the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMemoryPalace {
    #[serde(flatten)]
    pub palace: MemoryPalace,
    /// Creation timestamp in milliseconds; the primary key.
    pub id: i64,
    /// ISO 8601 save timestamp.
    pub saved_at: String,
    pub anchor_type: AnchorType,
    /// The place or object name, or a data URI for uploaded photos.
    pub original_anchor: String,
}

impl SavedMemoryPalace {
    /// `saved_at` as a timestamp, if it parses.
    pub fn saved_at_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.saved_at)
            .ok()
            .map(|t| t.with_timezone(&chrono::Utc))
    }
}

/// The palace currently on display: either a fresh draft or a saved record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivePalace {
    Draft(MemoryPalace),
    Saved(SavedMemoryPalace),
}

impl ActivePalace {
    pub fn palace(&self) -> &MemoryPalace {
        match self {
            Self::Draft(palace) => palace,
            Self::Saved(saved) => &saved.palace,
        }
    }

    pub fn palace_mut(&mut self) -> &mut MemoryPalace {
        match self {
            Self::Draft(palace) => palace,
            Self::Saved(saved) => &mut saved.palace,
        }
    }

    /// Store id, for saved palaces only.
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Draft(_) => None,
            Self::Saved(saved) => Some(saved.id),
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Partial result of a regeneration. The image batch is always present; text
/// fields are `None` when the model did not supply them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalaceUpdate {
    pub image_batch: ImageBatch,
    pub title: Option<String>,
    pub image_prompt: Option<String>,
    pub scenes: Option<Vec<Scene>>,
    pub quick_recap: Option<Vec<QuickRecapItem>>,
}
