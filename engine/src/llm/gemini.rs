//! Google Gemini provider
//!
//! Calls `models/{model}:generateContent`. The instruction preamble travels
//! as `systemInstruction`, the remaining turns as `contents` with the
//! assistant role mapped to `model`.

use super::{LLMError, LLMProvider, Message, MessageRole, Result, Sampling};
use crate::config::GeminiConfig;
use crate::secrets::{SecretCache, SecretManager, GEMINI_API_KEY};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub struct GeminiProvider {
    config: GeminiConfig,
    secret_cache: Arc<SecretCache>,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        config: GeminiConfig,
        secret_cache: Arc<SecretCache>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::ProviderUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            secret_cache,
            client,
        })
    }

    fn build_payload(messages: &[Message], sampling: &Sampling) -> serde_json::Value {
        let mut contents = Vec::new();
        let mut system_parts = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => system_parts.push(json!({ "text": msg.content })),
                MessageRole::User | MessageRole::Assistant => contents.push(json!({
                    "role": if msg.role == MessageRole::Assistant { "model" } else { "user" },
                    "parts": [{ "text": msg.content }]
                })),
            }
        }

        let mut payload = serde_json::Map::new();
        payload.insert("contents".to_string(), json!(contents));
        if !system_parts.is_empty() {
            payload.insert(
                "systemInstruction".to_string(),
                json!({ "parts": system_parts }),
            );
        }
        payload.insert(
            "generationConfig".to_string(),
            json!({
                "temperature": sampling.temperature,
                "maxOutputTokens": sampling.max_output_tokens,
            }),
        );

        serde_json::Value::Object(payload)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn check_health(&self) -> bool {
        self.secret_cache.get_secret(GEMINI_API_KEY).is_ok()
    }

    async fn generate(&self, messages: &[Message], sampling: &Sampling) -> Result<String> {
        let api_key = self
            .secret_cache
            .get_secret(GEMINI_API_KEY)
            .map_err(|e| LLMError::AuthenticationFailed(e.to_string()))?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let payload = Self::build_payload(messages, sampling);

        tracing::debug!(
            "Gemini request: model={}, turns={}, temperature={}",
            self.config.model,
            messages.len(),
            sampling.temperature
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.unsecure())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = SecretManager::scrub(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                400 | 404 => LLMError::InvalidRequest(text),
                429 => LLMError::RateLimitExceeded,
                401 | 403 => LLMError::AuthenticationFailed(text),
                _ => LLMError::ProviderUnavailable(format!(
                    "Gemini API error ({}): {}",
                    status, text
                )),
            });
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        if let Some(reason) = data.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LLMError::Blocked(reason));
        }

        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::ParseError("No candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(match candidate.finish_reason {
                Some(reason) if reason != "STOP" => LLMError::Blocked(reason),
                _ => LLMError::ParseError("No text in candidate content".to_string()),
            });
        }

        Ok(text)
    }
}
