//! Configuration management
//!
//! This module handles loading, validation, and management of the Forkcast
//! configuration. Configuration is stored in TOML format at
//! ~/.forkcast/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level and format, data directory, active user
//! - **catalog**: Optional override for the catalog file location
//! - **llm**: Provider selection, provider endpoints, per-stage sampling
//! - **session**: Transcript budget for a conversation
//!
//! # Path Expansion
//!
//! `~` at the start of `data_dir` and `catalog.path` is expanded to the
//! user's home directory, and the data directory is created if missing.
//!
//! # Examples
//!
//! ```no_run
//! use forkcast_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Data dir: {:?}", config.core.data_dir);
//! println!("Provider: {}", config.llm.provider);
//! # Ok(())
//! # }
//! ```

use crate::llm::Sampling;
use crate::telemetry::LogFormat;
use forkcast_sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Catalog location
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// LLM provider configuration
    pub llm: LLMConfig,

    /// Conversation settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// User whose memory is loaded when `--user` is not given
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

/// Catalog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog file; defaults to `<data_dir>/catalog.toml`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider used for both stages (gemini, ollama)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Gemini provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Sampling for the classification stage
    #[serde(default = "default_classifier_stage")]
    pub classifier: StageConfig,

    /// Sampling for the generation stage
    #[serde(default = "default_generator_stage")]
    pub generator: StageConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,
    // Note: API key comes from the environment or the OS keychain, not config
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// Sampling parameters for one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl From<StageConfig> for Sampling {
    fn from(stage: StageConfig) -> Self {
        Sampling {
            temperature: stage.temperature,
            max_output_tokens: stage.max_output_tokens,
        }
    }
}

/// Conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Token budget for each stage transcript, preamble included
    #[serde(default = "default_max_transcript_tokens")]
    pub max_transcript_tokens: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_transcript_tokens: default_max_transcript_tokens(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.forkcast")
}

fn default_user_id() -> String {
    "user_demo_001".to_string()
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_classifier_stage() -> StageConfig {
    StageConfig {
        temperature: 0.3,
        max_output_tokens: 1024,
    }
}

fn default_generator_stage() -> StageConfig {
    StageConfig {
        temperature: 0.7,
        max_output_tokens: 2048,
    }
}

fn default_max_transcript_tokens() -> usize {
    16_384
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.forkcast/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    pub fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable `~` form
        let config = Self::default_config();
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = config;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.forkcast/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".forkcast").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                log_format: LogFormat::default(),
                data_dir: default_data_dir(),
                user_id: default_user_id(),
            },
            catalog: CatalogConfig::default(),
            llm: LLMConfig {
                provider: default_provider(),
                request_timeout_secs: default_request_timeout(),
                gemini: GeminiConfig::default(),
                ollama: OllamaConfig::default(),
                classifier: default_classifier_stage(),
                generator: default_generator_stage(),
            },
            session: SessionConfig::default(),
        }
    }

    /// Resolved catalog file location
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .path
            .clone()
            .unwrap_or_else(|| self.core.data_dir.join("catalog.toml"))
    }

    /// Validate and process configuration
    ///
    /// Rejects unknown log levels and providers, out-of-range sampling and
    /// zero limits, expands `~` in paths and creates the data directory.
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_providers = ["gemini", "ollama"];
        if !valid_providers.contains(&self.llm.provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid provider '{}'. Must be one of: {}",
                self.llm.provider,
                valid_providers.join(", ")
            )));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        for (name, stage) in [
            ("classifier", &self.llm.classifier),
            ("generator", &self.llm.generator),
        ] {
            if !(0.0..=2.0).contains(&stage.temperature) {
                return Err(EngineError::Config(format!(
                    "llm.{}.temperature must be between 0.0 and 2.0",
                    name
                )));
            }
            if stage.max_output_tokens == 0 {
                return Err(EngineError::Config(format!(
                    "llm.{}.max_output_tokens must be greater than 0",
                    name
                )));
            }
        }

        if self.session.max_transcript_tokens == 0 {
            return Err(EngineError::Config(
                "session.max_transcript_tokens must be greater than 0".to_string(),
            ));
        }

        crate::memory::validate_user_id(&self.core.user_id)
            .map_err(|e| EngineError::Config(format!("core.user_id: {}", e)))?;

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if let Some(path) = &self.catalog.path {
            self.catalog.path = Some(expand_path(path)?);
        }

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
