//! Conversation state for one user session
//!
//! Each pipeline stage keeps its own [`Transcript`]: the instruction preamble
//! followed by completed user/assistant exchanges. A [`Session`] owns both
//! transcripts and is passed into the orchestrator explicitly, so separate
//! sessions never share state.

use crate::llm::{Message, MessageRole};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Default transcript budget in tokens
pub const DEFAULT_TRANSCRIPT_TOKENS: usize = 16_384;

/// Average characters per token (rough estimate: 1 token ≈ 4 characters)
const CHARS_PER_TOKEN: usize = 4;

/// Fixed per-message overhead for role and structure
const MESSAGE_OVERHEAD_TOKENS: usize = 10;

/// A preamble plus completed exchanges, bounded by a token budget
#[derive(Debug, Clone)]
pub struct Transcript {
    preamble: Message,
    turns: Vec<Message>,
    token_limit: usize,
    token_count: usize,
}

impl Transcript {
    pub fn new(preamble: impl Into<String>, token_limit: usize) -> Self {
        let preamble = Message::system(preamble);
        let token_count = estimate_tokens(&preamble);
        Self {
            preamble,
            turns: Vec::new(),
            token_limit,
            token_count,
        }
    }

    /// Messages to send for a new user turn: the current transcript with
    /// `user` appended. The transcript itself is not modified.
    pub fn request(&self, user: &Message) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.turns.len() + 2);
        messages.push(self.preamble.clone());
        messages.extend(self.turns.iter().cloned());
        messages.push(user.clone());
        messages
    }

    /// Record a completed exchange, trimming the oldest exchanges while the
    /// transcript is over budget. The preamble and the newest exchange are
    /// always kept.
    pub fn commit(&mut self, user: Message, assistant: Message) {
        debug_assert_eq!(user.role, MessageRole::User);
        debug_assert_eq!(assistant.role, MessageRole::Assistant);

        self.token_count += estimate_tokens(&user) + estimate_tokens(&assistant);
        self.turns.push(user);
        self.turns.push(assistant);

        while self.token_count > self.token_limit && self.turns.len() > 2 {
            for removed in self.turns.drain(..2) {
                self.token_count = self.token_count.saturating_sub(estimate_tokens(&removed));
            }
        }
    }

    pub fn preamble(&self) -> &Message {
        &self.preamble
    }

    /// Completed user/assistant messages, oldest first
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    /// Number of completed exchanges currently held
    pub fn exchange_count(&self) -> usize {
        self.turns.len() / 2
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn token_limit(&self) -> usize {
        self.token_limit
    }
}

/// Rough token estimate for a message
fn estimate_tokens(message: &Message) -> usize {
    message.content.len().div_ceil(CHARS_PER_TOKEN) + MESSAGE_OVERHEAD_TOKENS
}

/// Per-session conversation state for both pipeline stages
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    pub(crate) classifier: Transcript,
    pub(crate) generator: Transcript,
}

impl Session {
    pub fn new(classifier: Transcript, generator: Transcript) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            classifier,
            generator,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn classifier(&self) -> &Transcript {
        &self.classifier
    }

    pub fn generator(&self) -> &Transcript {
        &self.generator
    }
}
