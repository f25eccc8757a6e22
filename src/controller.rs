//! Application state controller.
//!
//! [`PalaceController`] owns everything the user sees: the anchor selection,
//! the item list, the active palace, the saved-palace list and the busy/error
//! state. Each user action is one method; failures are logged, rendered into
//! [`PalaceController::error`] and returned, and never retried.

use chrono::{SecondsFormat, Utc};

use crate::config::{InputConfig, PalaceConfig};
use crate::error::{PalaceError, Result};
use crate::generation::{GenerationBackend, GenerationClient};
use crate::palace::anchors::{self, DEFAULT_OPTIONS, FAMOUS_PLACES};
use crate::palace::image::ImagePayload;
use crate::palace::types::{ActivePalace, AnchorType, AnchorValue, SavedMemoryPalace};
use crate::store::PalaceStore;

/// Which network operation is in flight. Only one may run at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Generating,
    Regenerating,
}

/// The anchor the user has picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorSelection {
    pub anchor_type: AnchorType,
    pub value: AnchorValue,
}

impl Default for AnchorSelection {
    fn default() -> Self {
        Self {
            anchor_type: AnchorType::Default,
            value: AnchorValue::Text(DEFAULT_OPTIONS[0].into()),
        }
    }
}

/// Puts the controller back to [`Activity::Idle`] when dropped, including when
/// the action's future is dropped before the model call finishes.
struct IdleOnDrop<'a>(&'a mut Activity);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        *self.0 = Activity::Idle;
    }
}

pub struct PalaceController<B, S> {
    client: GenerationClient<B>,
    store: S,
    limits: InputConfig,
    maps_enabled: bool,
    anchor: AnchorSelection,
    items_text: String,
    active: Option<ActivePalace>,
    /// Anchor the active draft was generated from; recorded on save.
    draft_anchor: Option<AnchorSelection>,
    saved: Vec<SavedMemoryPalace>,
    activity: Activity,
    error: Option<String>,
    just_saved: bool,
}

impl<B: GenerationBackend, S: PalaceStore> PalaceController<B, S> {
    pub fn new(client: GenerationClient<B>, store: S, config: &PalaceConfig) -> Self {
        Self {
            client,
            store,
            limits: config.input.clone(),
            maps_enabled: config.maps_enabled(),
            anchor: AnchorSelection::default(),
            items_text: "Red\nGreen\nBlue".into(),
            active: None,
            draft_anchor: None,
            saved: Vec::new(),
            activity: Activity::Idle,
            error: None,
            just_saved: false,
        }
    }

    // ---- state accessors ----

    pub fn anchor(&self) -> &AnchorSelection {
        &self.anchor
    }

    pub fn items_text(&self) -> &str {
        &self.items_text
    }

    /// Non-blank lines of the item list, trimmed.
    pub fn items(&self) -> Vec<String> {
        self.items_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn active(&self) -> Option<&ActivePalace> {
        self.active.as_ref()
    }

    pub fn saved(&self) -> &[SavedMemoryPalace] {
        &self.saved
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn is_loading(&self) -> bool {
        self.activity == Activity::Generating
    }

    pub fn is_regenerating(&self) -> bool {
        self.activity == Activity::Regenerating
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn just_saved(&self) -> bool {
        self.just_saved
    }

    /// A freshly generated palace that has not been saved yet.
    pub fn is_saveable(&self) -> bool {
        matches!(self.active, Some(ActivePalace::Draft(_)))
    }

    // ---- anchor and item input ----

    /// Switch anchor type and reset the value to that type's starting point.
    pub fn set_anchor_type(&mut self, anchor_type: AnchorType) {
        let value = match anchor_type {
            AnchorType::Default => AnchorValue::Text(DEFAULT_OPTIONS[0].into()),
            // An external autocomplete widget fills this in when maps are enabled.
            AnchorType::Place if self.maps_enabled => AnchorValue::Empty,
            AnchorType::Place => AnchorValue::Text(FAMOUS_PLACES[0].into()),
            AnchorType::Upload => AnchorValue::Empty,
        };
        self.anchor = AnchorSelection { anchor_type, value };
    }

    /// Set a text anchor (object or place name). Upload anchors only take a photo.
    pub fn set_anchor_value(&mut self, value: &str) -> Result<()> {
        if self.anchor.anchor_type == AnchorType::Upload {
            return Err(self.fail(PalaceError::Validation(
                "An uploaded anchor must be a photo.".into(),
            )));
        }
        let max = self.limits.max_anchor_chars;
        if value.chars().count() > max {
            return Err(self.fail(PalaceError::Validation(format!(
                "The anchor must be at most {max} characters."
            ))));
        }
        self.anchor.value = AnchorValue::Text(value.to_string());
        Ok(())
    }

    /// Use an uploaded photo as the anchor.
    pub fn set_anchor_image(&mut self, image: ImagePayload) {
        self.anchor = AnchorSelection {
            anchor_type: AnchorType::Upload,
            value: AnchorValue::Image(image),
        };
    }

    /// Replace the whole item list (one item per line).
    pub fn set_items(&mut self, text: &str) -> Result<()> {
        self.check_list_length(text)?;
        self.items_text = text.to_string();
        Ok(())
    }

    /// Append one item, rejecting blanks and case-insensitive duplicates.
    pub fn add_item(&mut self, item: &str) -> Result<()> {
        let item = item.trim();
        if item.is_empty() {
            return Ok(());
        }

        let mut items = self.items();
        let lowered = item.to_lowercase();
        if items.iter().any(|existing| existing.to_lowercase() == lowered) {
            return Err(self.fail(PalaceError::Validation(
                "This item is already in the list.".into(),
            )));
        }

        items.push(item.to_string());
        let text = items.join("\n");
        self.check_list_length(&text)?;
        self.items_text = text;
        Ok(())
    }

    /// Remove the item at `index` of [`PalaceController::items`].
    pub fn remove_item(&mut self, index: usize) -> Result<()> {
        let mut items = self.items();
        if index >= items.len() {
            return Err(self.fail(PalaceError::Validation(format!(
                "There is no item at position {}.",
                index + 1
            ))));
        }
        items.remove(index);
        self.items_text = items.join("\n");
        Ok(())
    }

    /// Fallback place names matching `query`, when no autocomplete is configured.
    pub fn place_suggestions(&self, query: &str) -> Vec<&'static str> {
        if self.maps_enabled {
            return Vec::new();
        }
        anchors::place_suggestions(query)
    }

    fn check_list_length(&mut self, text: &str) -> Result<()> {
        let max = self.limits.max_list_chars;
        if text.chars().count() > max {
            return Err(self.fail(PalaceError::Validation(format!(
                "The list has exceeded the maximum length of {max} characters."
            ))));
        }
        Ok(())
    }

    // ---- store-backed actions ----

    /// Load the saved-palace list from the store.
    pub async fn load_saved(&mut self) -> Result<()> {
        match self.store.get_all().await {
            Ok(palaces) => {
                tracing::debug!(count = palaces.len(), "saved palaces loaded");
                self.saved = palaces;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load saved palaces");
                self.error = Some(
                    "Could not load saved palaces. The local palace database may be unavailable."
                        .into(),
                );
                Err(e)
            }
        }
    }

    /// Generate a new palace from the current anchor and items. Clears the
    /// active palace first; on failure nothing is shown.
    pub async fn generate(&mut self) -> Result<()> {
        let items = self.items();
        if self.anchor.value.is_empty() || items.is_empty() {
            return Err(self.fail(PalaceError::Validation(
                "Please provide an anchor and a list of items to memorize.".into(),
            )));
        }
        self.begin(Activity::Generating)?;
        self.active = None;
        self.draft_anchor = None;
        self.just_saved = false;

        let result = {
            let _idle = IdleOnDrop(&mut self.activity);
            self.client
                .generate(self.anchor.anchor_type, &self.anchor.value, &items)
                .await
        };

        match result {
            Ok(palace) => {
                tracing::info!(title = %palace.title, "palace ready");
                self.active = Some(ActivePalace::Draft(palace));
                self.draft_anchor = Some(self.anchor.clone());
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Persist the active draft. Returns the new id.
    pub async fn save(&mut self) -> Result<i64> {
        let draft = match &self.active {
            Some(ActivePalace::Draft(draft)) => draft.clone(),
            _ => {
                return Err(self.fail(PalaceError::Validation(
                    "Only a newly generated palace can be saved.".into(),
                )))
            }
        };

        let anchor = self.draft_anchor.as_ref().unwrap_or(&self.anchor);
        let saved = SavedMemoryPalace {
            palace: draft,
            id: self.next_id(),
            saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            anchor_type: anchor.anchor_type,
            original_anchor: anchor.value.to_original_anchor(),
        };

        if let Err(e) = self.store.put(&saved).await {
            return Err(self.fail(e));
        }

        tracing::info!(id = saved.id, title = %saved.palace.title, "palace saved");
        let id = saved.id;
        self.saved.insert(0, saved.clone());
        self.active = Some(ActivePalace::Saved(saved));
        self.just_saved = true;
        Ok(id)
    }

    /// Edit image `image_index` of generation `generation_index` and merge the
    /// result into the active palace. A saved palace is re-persisted; if that
    /// fails the palace is left as it was.
    pub async fn regenerate(
        &mut self,
        edit_prompt: &str,
        generation_index: usize,
        image_index: usize,
    ) -> Result<()> {
        let items = self.items();
        let base = match &self.active {
            Some(active) if !edit_prompt.trim().is_empty() && !items.is_empty() => active
                .palace()
                .image(generation_index, image_index)
                .map(str::to_string),
            _ => {
                return Err(self.fail(PalaceError::Validation(
                    "Cannot regenerate without a palace, an image, an edit prompt, and a list of items."
                        .into(),
                )))
            }
        };
        let Some(base) = base else {
            return Err(self.fail(PalaceError::Validation(format!(
                "There is no image {} in generation {}.",
                image_index + 1,
                generation_index + 1
            ))));
        };

        self.begin(Activity::Regenerating)?;
        self.just_saved = false;

        let result = {
            let _idle = IdleOnDrop(&mut self.activity);
            self.client.regenerate(&base, edit_prompt, &items).await
        };

        let update = match result {
            Ok(update) => update,
            Err(e) => return Err(self.fail(e)),
        };
        let Some(mut next) = self.active.clone() else {
            return Ok(());
        };
        next.palace_mut().apply_update(update);

        if let ActivePalace::Saved(saved) = &next {
            if let Err(e) = self.store.put(saved).await {
                return Err(self.fail(e));
            }
            self.replace_saved(saved);
        }

        tracing::info!(
            generations = next.palace().image_generations.len(),
            "palace regenerated"
        );
        self.active = Some(next);
        Ok(())
    }

    /// Show a saved palace.
    pub fn load_palace(&mut self, id: i64) -> Result<()> {
        let Some(saved) = self.saved.iter().find(|p| p.id == id).cloned() else {
            return Err(self.fail(PalaceError::NotFound(id)));
        };
        self.active = Some(ActivePalace::Saved(saved));
        self.draft_anchor = None;
        self.just_saved = false;
        Ok(())
    }

    /// Delete a saved palace; clears the active palace if it was this one.
    pub async fn delete_palace(&mut self, id: i64) -> Result<()> {
        if let Err(e) = self.store.delete(id).await {
            return Err(self.fail(e));
        }

        self.saved.retain(|p| p.id != id);
        if self.active.as_ref().and_then(ActivePalace::id) == Some(id) {
            self.active = None;
        }
        tracing::info!(id, "palace deleted");
        Ok(())
    }

    /// Rename the active palace. Applied immediately; a saved palace is
    /// persisted and the old title restored if that fails. Blank titles are ignored.
    pub async fn update_title(&mut self, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Ok(());
        }
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        let previous = std::mem::replace(&mut active.palace_mut().title, title.to_string());
        let ActivePalace::Saved(saved) = active else {
            return Ok(());
        };
        let snapshot = saved.clone();

        match self.store.put(&snapshot).await {
            Ok(()) => {
                self.replace_saved(&snapshot);
                tracing::info!(id = snapshot.id, "palace renamed");
                Ok(())
            }
            Err(e) => {
                if let Some(active) = self.active.as_mut() {
                    active.palace_mut().title = previous;
                }
                Err(self.fail(e))
            }
        }
    }

    // ---- helpers ----

    fn begin(&mut self, activity: Activity) -> Result<()> {
        if self.activity != Activity::Idle {
            return Err(self.fail(PalaceError::Busy));
        }
        self.activity = activity;
        self.error = None;
        Ok(())
    }

    /// Log `e`, record its user message and hand it back.
    fn fail(&mut self, e: PalaceError) -> PalaceError {
        tracing::error!(error = %e, "palace action failed");
        self.error = Some(e.user_message());
        e
    }

    fn replace_saved(&mut self, palace: &SavedMemoryPalace) {
        if let Some(entry) = self.saved.iter_mut().find(|p| p.id == palace.id) {
            *entry = palace.clone();
        }
    }

    /// Millisecond timestamp, bumped past any id already in the list.
    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let highest = self.saved.iter().map(|p| p.id).max().unwrap_or(i64::MIN);
        now.max(highest.saturating_add(1))
    }
}
