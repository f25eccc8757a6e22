//! Gemini `generateContent` REST backend.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{GenerationBackend, ImageReply, Part};
use crate::config::GenerationConfig;
use crate::error::{PalaceError, Result};
use crate::palace::image::ImagePayload;

#[derive(Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GeminiBackend {
    pub fn from_config(config: &GenerationConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    async fn post(&self, model: &str, payload: &Value) -> Result<GenerateContentResponse> {
        if self.api_key.is_empty() {
            return Err(PalaceError::Config(
                "No Gemini API key configured. Set GEMINI_API_KEY or [generation] api_key.".into(),
            ));
        }

        let endpoint = self.endpoint_for_model(model);
        tracing::debug!(model, "posting generateContent");

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| PalaceError::Service {
                status: None,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(model, status, body = %body, "generateContent failed");
            return Err(PalaceError::Service {
                status: Some(status),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            PalaceError::InvalidResponse(format!("unreadable generateContent body: {e}"))
        })
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate_text(&self, system_instruction: &str, parts: &[Part]) -> Result<String> {
        let payload = json!({
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{ "role": "user", "parts": wire_parts(parts) }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": palace_response_schema(),
            },
        });

        let response = self.post(&self.text_model, &payload).await?;
        response
            .text()
            .ok_or_else(|| PalaceError::InvalidResponse("response contained no text".into()))
    }

    async fn generate_image(&self, parts: &[Part]) -> Result<ImageReply> {
        let payload = json!({
            "contents": [{ "role": "user", "parts": wire_parts(parts) }],
            "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] },
        });

        let response = self.post(&self.image_model, &payload).await?;
        response.image_reply()
    }
}

fn wire_parts(parts: &[Part]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::Image(image) => json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": image.base64(),
                }
            }),
        })
        .collect()
}

/// Response schema for the palace text, in the service's OpenAPI subset.
pub fn palace_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "The title of the memory palace, in the format 'Memory Palace: <ANCHOR NAME>'."
            },
            "imagePrompt": {
                "type": "STRING",
                "description": "A single, detailed prompt for an image generation model to create a composite image of the entire memory palace. It must describe the anchor, the logical route, core style features, and the visual mnemonic for each item, referencing the exact bolded words. If the user provided an image, the prompt should describe how to edit that image to include the mnemonics."
            },
            "scenes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "locus": {
                            "type": "STRING",
                            "description": "The specific location (locus) within the anchor."
                        },
                        "description": {
                            "type": "STRING",
                            "description": "A 1-2 sentence explanation of the mnemonic scene, with the target words/phrases wrapped in double asterisks for bolding (e.g., **Item 1**)."
                        }
                    },
                    "required": ["locus", "description"]
                }
            },
            "quickRecap": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "item": {
                            "type": "STRING",
                            "description": "The exact word/phrase to remember, wrapped in double asterisks."
                        },
                        "locusHint": {
                            "type": "STRING",
                            "description": "A brief hint about the location of the item."
                        }
                    },
                    "required": ["item", "locusHint"]
                }
            }
        },
        "required": ["title", "imagePrompt", "scenes", "quickRecap"]
    })
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// The first inline image of the first candidate, or whatever text came instead.
    fn image_reply(&self) -> Result<ImageReply> {
        let inline = self
            .first_parts()
            .iter()
            .find_map(|p| p.inline_data.as_ref().filter(|d| !d.data.is_empty()));

        match inline {
            Some(inline) => {
                let data = BASE64.decode(inline.data.as_bytes()).map_err(|e| {
                    PalaceError::InvalidResponse(format!("image base64 decode failed: {e}"))
                })?;
                Ok(ImageReply::Image(ImagePayload::new(inline.mime_type.clone(), data)))
            }
            None => Ok(ImageReply::TextOnly(self.text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(api_key: &str) -> GeminiBackend {
        let config = GenerationConfig {
            api_key: api_key.into(),
            api_base: "https://example.test/v1beta/".into(),
            ..GenerationConfig::default()
        };
        GeminiBackend::from_config(&config).unwrap()
    }

    #[test]
    fn endpoint_accepts_bare_and_prefixed_models() {
        let b = backend("k");
        assert_eq!(
            b.endpoint_for_model("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            b.endpoint_for_model("models/gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let err = backend("  ")
            .generate_text("sys", &[Part::Text("hi".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, PalaceError::Config(_)));
    }

    #[test]
    fn wire_parts_use_inline_data() {
        let parts = wire_parts(&[
            Part::Image(ImagePayload::new("image/png", vec![0, 1])),
            Part::Text("edit".into()),
        ]);
        assert_eq!(parts[0]["inlineData"]["mimeType"], json!("image/png"));
        assert_eq!(parts[0]["inlineData"]["data"], json!("AAE="));
        assert_eq!(parts[1]["text"], json!("edit"));
    }

    #[test]
    fn text_response_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn image_response_decodes_inline_data() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here you go" },
                { "inline_data": { "mime_type": "image/png", "data": "AAE=" } }
            ] } }]
        }))
        .unwrap();
        assert_eq!(
            response.image_reply().unwrap(),
            ImageReply::Image(ImagePayload::new("image/png", vec![0, 1]))
        );
    }

    #[test]
    fn text_only_image_response_is_reported() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't make that image." }] } }]
        }))
        .unwrap();
        assert_eq!(
            response.image_reply().unwrap(),
            ImageReply::TextOnly(Some("I can't make that image.".into()))
        );

        let empty = GenerateContentResponse::default();
        assert_eq!(empty.image_reply().unwrap(), ImageReply::TextOnly(None));
    }

    #[test]
    fn schema_requires_all_palace_fields() {
        let schema = palace_response_schema();
        assert_eq!(
            schema["required"],
            json!(["title", "imagePrompt", "scenes", "quickRecap"])
        );
    }
}
