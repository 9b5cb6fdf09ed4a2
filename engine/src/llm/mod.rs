//! LLM Provider Abstraction Layer
//!
//! Both pipeline stages (query classification and response generation) talk
//! to a text-generation backend through the [`LLMProvider`] trait. Two
//! backends ship with the engine: Google Gemini and a local Ollama server.

use async_trait::async_trait;
use forkcast_sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub mod gemini;
pub mod ollama;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Response was blocked: {0}")]
    Blocked(String),
}

impl From<reqwest::Error> for LLMError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LLMError::Timeout
        } else {
            LLMError::NetworkError(crate::secrets::SecretManager::scrub(&e.to_string()))
        }
    }
}

impl From<LLMError> for EngineError {
    fn from(e: LLMError) -> Self {
        EngineError::LLMProvider(e.to_string())
    }
}

/// Message in a conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    /// Instruction preamble; providers send it out of band where supported
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Sampling parameters for a single call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "gemini", "ollama")
    fn name(&self) -> &str;

    /// Returns true if this is a local provider (e.g., Ollama)
    fn is_local(&self) -> bool;

    /// Generate the next assistant turn for `messages`
    ///
    /// # Arguments
    /// * `messages` - Transcript so far: preamble, earlier turns, and the new user turn
    /// * `sampling` - Temperature and output length for this call
    ///
    /// # Returns
    /// * `Ok(String)` - Text of the reply
    /// * `Err(LLMError)` - If the request fails or the reply has no text
    async fn generate(&self, messages: &[Message], sampling: &Sampling) -> Result<String>;

    /// Check if the provider is currently reachable
    async fn check_health(&self) -> bool {
        true
    }
}

/// Build the provider named by `config.provider`.
///
/// Gemini reads its API key lazily through `secrets`, so constructing it
/// never prompts.
pub fn provider_from_config(
    config: &crate::config::LLMConfig,
    secrets: Arc<crate::secrets::SecretCache>,
) -> std::result::Result<Arc<dyn LLMProvider>, EngineError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let provider: Arc<dyn LLMProvider> = match config.provider.as_str() {
        "gemini" => Arc::new(gemini::GeminiProvider::new(
            config.gemini.clone(),
            secrets,
            timeout,
        )?),
        "ollama" => Arc::new(ollama::OllamaProvider::new(
            config.ollama.base_url.clone(),
            config.ollama.model.clone(),
            timeout,
        )?),
        other => {
            return Err(EngineError::Config(format!(
                "Unknown LLM provider '{}'",
                other
            )))
        }
    };

    tracing::debug!("Using LLM provider {}", provider.name());
    Ok(provider)
}

/// Return the trimmed text between `<tag>` and the next `</tag>`.
///
/// The first opening tag wins. An opening tag without a closing tag yields
/// `None`.
pub fn extract_tagged<'a>(content: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = content.find(&open)? + open.len();
    let end = content[start..].find(&close)? + start;
    Some(content[start..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, MessageRole::User);
        assert_eq!(user_msg.content, "Hello");

        let system_msg = Message::system("You are a food assistant");
        assert_eq!(system_msg.role, MessageRole::System);
        assert_eq!(Message::assistant("Hi").role.to_string(), "assistant");
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("test");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"test"}"#);
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_extract_tagged() {
        let reply = "Sure.\n<catalog_query>\n  category == \"Dessert\"\n</catalog_query>\nDone";
        assert_eq!(
            extract_tagged(reply, "catalog_query"),
            Some("category == \"Dessert\"")
        );
        assert_eq!(extract_tagged(reply, "no_catalog_query"), None);
        assert_eq!(extract_tagged("<catalog_query>ALL", "catalog_query"), None);
    }

    #[test]
    fn test_extract_tagged_takes_first_block() {
        let reply = "<catalog_query>price < 100</catalog_query><catalog_query>ALL</catalog_query>";
        assert_eq!(extract_tagged(reply, "catalog_query"), Some("price < 100"));
    }

    #[test]
    fn test_llm_error_converts_to_engine_error() {
        let err: EngineError = LLMError::RateLimitExceeded.into();
        assert_eq!(err.to_string(), "LLM provider error: Rate limit exceeded");
    }
}
