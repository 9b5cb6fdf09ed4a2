//! Error types and handling
//!
//! This module provides the error types used throughout the Forkcast engine.
//! All errors implement the `ForkcastErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages shown to end users go through `user_hint`, which never
//! includes API keys, file paths or raw provider responses.

use thiserror::Error;

/// Trait for Forkcast error extensions
///
/// Provides additional context for errors: a user-friendly hint and
/// whether the failed operation can be retried or worked around.
pub trait ForkcastErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets, file paths or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Catalog**: Catalog file cannot be read or written
/// - **Memory**: User memory record cannot be read or written
/// - **Validation**: Bad user ids, ratings or preference keys
/// - **LLM Provider**: API failures, authentication errors
///
/// # Examples
///
/// ```
/// use forkcast_sdk::errors::{EngineError, ForkcastErrorExt};
///
/// let error = EngineError::InvalidRating(7.5);
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Catalog errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Dish not found: {0}")]
    DishNotFound(String),

    // Memory errors
    #[error("Memory store error: {0}")]
    Memory(String),

    #[error("Invalid user id '{0}'")]
    InvalidUserId(String),

    // Validation errors
    #[error("Rating {0} is outside 0-5")]
    InvalidRating(f64),

    #[error("Invalid preference: {0}")]
    InvalidPreference(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl ForkcastErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::Catalog(_) => "The dish catalog could not be loaded. Delete catalog.toml to reseed it",
            Self::DishNotFound(_) => "That dish is not on the menu. Check the spelling with 'forkcast catalog'",

            Self::Memory(_) => "Your history could not be read or saved",
            Self::InvalidUserId(_) => "User ids may only contain letters, digits, '-' and '_'",

            Self::InvalidRating(_) => "Ratings must be between 0 and 5",
            Self::InvalidPreference(_) => "Preferences are written as key=value",

            Self::LLMProvider(_) => "LLM provider unavailable. Check your API key and network",
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",

            Self::Serialization(_) => "A stored file is corrupted",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Corrupted files need manual attention
            Self::Serialization(_) | Self::Catalog(_) => false,

            _ => true,
        }
    }
}
