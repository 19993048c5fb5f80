//! Gemini `generateContent` backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::conversation::Turn;
use crate::io::config::ModelConfig;
use crate::io::model::{ModelBackend, ModelError, ModelRequest};

/// Stateless HTTP wrapper around one Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    model_id: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiBackend {
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("build gemini http client")?;
        Ok(Self {
            model_id: config.model_id.clone(),
            api_key: config.resolve_api_key()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_id)
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    #[instrument(skip_all, fields(model_id = %self.model_id, turns = request.conversation.len()))]
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let body = GeminiRequest::from_request(request);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "gemini request failed");
                ModelError::Generation(format!("request failed: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "gemini returned error status");
            return Err(ModelError::Generation(format!(
                "api error ({status}): {error_text}"
            )));
        }

        let parsed: GeminiResponse = response.json().await.map_err(|err| {
            warn!(error = %err, "gemini response envelope unreadable");
            ModelError::Generation(format!("unreadable response: {err}"))
        })?;

        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(ModelError::Validation("empty response text".to_string()));
        }
        debug!(text_len = text.len(), "gemini response received");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

impl GeminiRequest {
    fn from_request(request: &ModelRequest) -> Self {
        Self {
            contents: request
                .conversation
                .turns()
                .iter()
                .map(GeminiContent::from_turn)
                .collect(),
            system_instruction: request
                .system_instruction
                .as_ref()
                .map(|text| GeminiSystemInstruction {
                    parts: vec![GeminiPart {
                        text: Some(text.clone()),
                    }],
                }),
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: request.response_schema.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn from_turn(turn: &Turn) -> Self {
        Self {
            role: turn.role.as_str().to_string(),
            parts: turn
                .parts
                .iter()
                .map(|text| GeminiPart {
                    text: Some(text.clone()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}
