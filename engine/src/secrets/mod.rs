pub mod cache;
pub mod string;

pub use cache::SecretCache;
pub use string::SecretString;

use forkcast_sdk::errors::EngineError;
use keyring::Entry;
use regex::Regex;
use std::sync::OnceLock;

/// Keychain entry holding the Gemini API key
pub const GEMINI_API_KEY: &str = "gemini_api_key";

/// SecretManager resolves API keys for the LLM providers.
///
/// Lookup order for a key such as `gemini_api_key`:
/// 1. `FORKCAST_GEMINI_API_KEY`, then `GEMINI_API_KEY` in the environment
/// 2. The OS keychain (macOS Keychain, Windows Credential Manager,
///    Secret Service on Linux)
/// 3. An interactive prompt on stderr with echo disabled; the answer is
///    stored in the keychain for next time
///
/// The SecretManager also scrubs key-shaped strings out of provider error
/// text before it reaches logs.
pub struct SecretManager {
    service_name: String,
    interactive: bool,
}

static SECRET_PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

/// Patterns for Google API keys, bearer tokens and `key=` query parameters
fn get_secret_patterns() -> &'static Vec<(Regex, &'static str)> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            (r"AIza[0-9A-Za-z\-_]{35}", "[REDACTED]"),
            (r"Bearer\s+[^\s]{20,}", "[REDACTED]"),
            (r"([?&]key=)[^&\s]+", "${1}[REDACTED]"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
            Ok(re) => Some((re, replacement)),
            Err(e) => {
                tracing::error!("Invalid secret pattern {}: {}", pattern, e);
                None
            }
        })
        .collect()
    })
}

impl SecretManager {
    /// Creates a new SecretManager with the given keychain service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            interactive: true,
        }
    }

    /// Never prompt; a missing key becomes an error instead.
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// Environment variables checked for `key`, in order
    pub fn env_vars_for(key: &str) -> [String; 2] {
        let upper = key.to_ascii_uppercase();
        [format!("FORKCAST_{}", upper), upper]
    }

    /// Resolve a secret from the environment, the keychain or the user.
    ///
    /// # Errors
    /// Returns `EngineError::KeyringError` if the keychain cannot be read,
    /// the prompt fails, or the key is missing in non-interactive mode.
    pub fn get_secret(&self, key: &str) -> Result<String, EngineError> {
        for var in Self::env_vars_for(key) {
            if let Ok(value) = std::env::var(&var) {
                let value = value.trim().to_string();
                if !value.is_empty() {
                    tracing::debug!("Using secret '{}' from ${}", key, var);
                    return Ok(value);
                }
            }
        }

        let entry = self.entry(key)?;
        match entry.get_password() {
            Ok(secret) => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(secret)
            }
            Err(keyring::Error::NoEntry) if self.interactive => {
                tracing::info!("Secret '{}' not found in keychain, prompting user", key);
                let secret = self.prompt_for_secret(key)?;
                self.set_secret(key, &secret)?;
                Ok(secret)
            }
            Err(keyring::Error::NoEntry) => Err(EngineError::KeyringError(format!(
                "Secret '{}' is not set; export {} or store it in the keychain",
                key,
                Self::env_vars_for(key)[0]
            ))),
            Err(e) => Err(EngineError::KeyringError(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    /// Stores a secret in the OS keychain.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), EngineError> {
        self.entry(key)?.set_password(value).map_err(|e| {
            EngineError::KeyringError(format!("Failed to store secret '{}': {}", key, e))
        })?;

        tracing::info!("Stored secret '{}' in keychain", key);
        Ok(())
    }

    /// Deletes a secret from the OS keychain.
    pub fn delete_secret(&self, key: &str) -> Result<(), EngineError> {
        self.entry(key)?.delete_password().map_err(|e| {
            EngineError::KeyringError(format!("Failed to delete secret '{}': {}", key, e))
        })?;

        tracing::info!("Deleted secret '{}' from keychain", key);
        Ok(())
    }

    fn entry(&self, key: &str) -> Result<Entry, EngineError> {
        Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })
    }

    /// Prompts on stderr without echoing the typed value.
    fn prompt_for_secret(&self, key: &str) -> Result<String, EngineError> {
        let input = rpassword::prompt_password_stderr(&format!("Enter value for '{}': ", key))
            .map_err(|e| EngineError::KeyringError(format!("Failed to read input: {}", e)))?;

        let secret = input.trim().to_string();
        if secret.is_empty() {
            return Err(EngineError::KeyringError(
                "Secret cannot be empty".to_string(),
            ));
        }

        Ok(secret)
    }

    /// Replace API keys and bearer tokens in `text` with `[REDACTED]`.
    ///
    /// # Examples
    /// ```
    /// use forkcast_engine::secrets::SecretManager;
    ///
    /// let scrubbed = SecretManager::scrub("GET /v1/models?key=abc123&alt=json");
    /// assert_eq!(scrubbed, "GET /v1/models?key=[REDACTED]&alt=json");
    /// ```
    pub fn scrub(text: &str) -> String {
        get_secret_patterns()
            .iter()
            .fold(text.to_string(), |acc, (pattern, replacement)| {
                pattern.replace_all(&acc, *replacement).into_owned()
            })
    }
}
