//! Forkcast Engine Library
//!
//! This library provides the core of the Forkcast food recommendation
//! assistant: the dish catalog and its query language, per-user memory,
//! the two-stage LLM pipeline, and the CLI front end. It is used by both
//! the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Dish catalog and query language
pub mod catalog;

/// Per-user order and feedback memory
pub mod memory;

/// Recommendation pipeline and sessions
pub mod agent;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
