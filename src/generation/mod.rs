//! Palace generation on top of a multimodal model service.
//!
//! [`GenerationBackend`] is the raw seam: one structured-JSON text call and one
//! image call. [`GenerationClient`] shapes the prompts, validates the JSON
//! against the palace schema, and fans image requests out four at a time with
//! an all-or-nothing join.

pub mod gemini;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{PalaceError, Result};
use crate::palace::image::ImagePayload;
use crate::palace::types::{
    AnchorType, AnchorValue, ImageBatch, MemoryPalace, PalaceUpdate, QuickRecapItem, Scene,
};

pub use gemini::GeminiBackend;

/// One piece of multimodal model input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Image(ImagePayload),
}

/// What an image call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReply {
    Image(ImagePayload),
    /// The model answered without image data, optionally with text.
    TextOnly(Option<String>),
}

/// Raw calls to the model service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Structured text generation constrained to the palace JSON schema.
    /// Returns the raw response text.
    async fn generate_text(&self, system_instruction: &str, parts: &[Part]) -> Result<String>;

    /// Image generation, or editing when `parts` include an image.
    async fn generate_image(&self, parts: &[Part]) -> Result<ImageReply>;
}

#[async_trait]
impl<T: GenerationBackend + ?Sized> GenerationBackend for Arc<T> {
    async fn generate_text(&self, system_instruction: &str, parts: &[Part]) -> Result<String> {
        (**self).generate_text(system_instruction, parts).await
    }

    async fn generate_image(&self, parts: &[Part]) -> Result<ImageReply> {
        (**self).generate_image(parts).await
    }
}

/// The text half of a palace, exactly as the schema requires it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PalaceText {
    title: String,
    image_prompt: String,
    scenes: Vec<Scene>,
    quick_recap: Vec<QuickRecapItem>,
}

/// Lenient variant used after an image edit, where missing fields fall back to
/// the palace's previous values.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PartialPalaceText {
    title: Option<String>,
    image_prompt: Option<String>,
    scenes: Option<Vec<Scene>>,
    quick_recap: Option<Vec<QuickRecapItem>>,
}

pub struct GenerationClient<B> {
    backend: B,
}

impl<B: GenerationBackend> GenerationClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Build a palace from an anchor and a list of items: one text call for
    /// the scenes, then four concurrent image calls seeded with its image prompt.
    pub async fn generate(
        &self,
        anchor_type: AnchorType,
        anchor_value: &AnchorValue,
        items: &[String],
    ) -> Result<MemoryPalace> {
        let items = non_blank(items);
        if items.is_empty() || anchor_value.is_empty() {
            return Err(PalaceError::Validation(
                "Please provide an anchor and a list of items to memorize.".into(),
            ));
        }

        let photo = match anchor_value {
            AnchorValue::Image(image) => Some(image),
            _ => None,
        };
        let anchor_details = match anchor_value {
            AnchorValue::Text(text) => text.trim(),
            _ => prompts::PHOTO_ANCHOR_DETAILS,
        };

        tracing::info!(
            anchor_type = %anchor_type,
            items = items.len(),
            photo = photo.is_some(),
            "generating palace text"
        );

        let mut text_parts = Vec::with_capacity(2);
        if let Some(image) = photo {
            text_parts.push(Part::Image(image.clone()));
        }
        text_parts.push(Part::Text(prompts::palace_prompt(anchor_type, anchor_details, &items)));

        let raw = self
            .backend
            .generate_text(prompts::SYSTEM_INSTRUCTION, &text_parts)
            .await?;
        let text = parse_palace_text(&raw)?;

        let image_parts = match photo {
            Some(image) => vec![
                Part::Image(image.clone()),
                Part::Text(text.image_prompt.clone()),
            ],
            None => vec![Part::Text(prompts::styled_image_prompt(&text.image_prompt))],
        };
        let batch = self.image_batch(&image_parts).await?;

        tracing::info!(title = %text.title, scenes = text.scenes.len(), "palace generated");

        Ok(MemoryPalace {
            title: text.title,
            image_prompt: text.image_prompt,
            scenes: text.scenes,
            quick_recap: text.quick_recap,
            image_generations: vec![batch],
        })
    }

    /// Edit one image with a free-text instruction into four new variants, then
    /// re-derive the scenes from the first variant alone.
    pub async fn regenerate(
        &self,
        base_image_url: &str,
        edit_prompt: &str,
        items: &[String],
    ) -> Result<PalaceUpdate> {
        let items = non_blank(items);
        if edit_prompt.trim().is_empty() || items.is_empty() {
            return Err(PalaceError::Validation(
                "Cannot regenerate without an edit prompt and a list of items.".into(),
            ));
        }
        let base = ImagePayload::from_data_url(base_image_url)?;

        tracing::info!(items = items.len(), "editing palace image");

        let edit_parts = vec![Part::Image(base), Part::Text(edit_prompt.to_string())];
        let batch = self.image_batch(&edit_parts).await?;

        let reference = ImagePayload::from_data_url(&batch[0])?;
        let text_parts = vec![
            Part::Image(reference),
            Part::Text(prompts::regeneration_prompt(&items)),
        ];
        let raw = self
            .backend
            .generate_text(prompts::SYSTEM_INSTRUCTION, &text_parts)
            .await?;
        let text = parse_partial_palace_text(&raw)?;

        Ok(PalaceUpdate {
            image_batch: batch,
            title: text.title,
            image_prompt: text.image_prompt,
            scenes: text.scenes,
            quick_recap: text.quick_recap,
        })
    }

    /// Four concurrent image calls. Any failure fails the whole batch.
    async fn image_batch(&self, parts: &[Part]) -> Result<ImageBatch> {
        let (a, b, c, d) = tokio::try_join!(
            self.one_image(parts, 0),
            self.one_image(parts, 1),
            self.one_image(parts, 2),
            self.one_image(parts, 3),
        )?;
        Ok([a, b, c, d])
    }

    async fn one_image(&self, parts: &[Part], slot: usize) -> Result<String> {
        match self.backend.generate_image(parts).await? {
            ImageReply::Image(image) => {
                tracing::debug!(slot, mime = %image.mime_type, bytes = image.data.len(), "image received");
                Ok(image.to_data_url())
            }
            ImageReply::TextOnly(text) => {
                tracing::error!(slot, response = ?text, "image generation returned no image");
                Err(PalaceError::ImageGenerationFailed(
                    text.unwrap_or_else(|| "model returned no image data".into()),
                ))
            }
        }
    }
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drop a surrounding markdown code fence, if the model added one anyway.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn parse_palace_text(raw: &str) -> Result<PalaceText> {
    let text: PalaceText = serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        tracing::error!(response = %raw, error = %e, "failed to parse palace JSON");
        PalaceError::InvalidResponse(e.to_string())
    })?;

    if text.scenes.is_empty() || text.quick_recap.is_empty() {
        tracing::error!(response = %raw, "palace JSON has no scenes or recap");
        return Err(PalaceError::InvalidResponse(
            "response contained no scenes or quick recap".into(),
        ));
    }
    Ok(text)
}

fn parse_partial_palace_text(raw: &str) -> Result<PartialPalaceText> {
    let mut text: PartialPalaceText = serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        tracing::error!(response = %raw, error = %e, "failed to parse regenerated palace JSON");
        PalaceError::InvalidResponse(e.to_string())
    })?;

    text.title = text.title.filter(|s| !s.trim().is_empty());
    text.image_prompt = text.image_prompt.filter(|s| !s.trim().is_empty());
    text.scenes = text.scenes.filter(|s| !s.is_empty());
    text.quick_recap = text.quick_recap.filter(|s| !s.is_empty());
    Ok(text)
}
