//! Per-user order and feedback memory
//!
//! A [`UserMemory`] keeps the complete order history, a window of the ten
//! most recent feedback entries, and a free-text summary of everything that
//! fell out of that window. [`store::MemoryStore`] persists one record per
//! user and rewrites it after every mutation.
//!
//! The consolidated summary is lossy: entries folded into it are never
//! parsed back into structured feedback.

pub mod store;

pub use store::{seed_demo_user, MemoryStore, StoredMemory};

use chrono::{DateTime, Utc};
use forkcast_sdk::errors::EngineError;
use forkcast_sdk::types::{Feedback, Order};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of feedback entries kept verbatim
pub const RECENT_FEEDBACK_CAPACITY: usize = 10;

/// Number of orders listed in the memory context
pub const CONTEXT_ORDER_COUNT: usize = 5;

/// Context text for a user with no recorded activity
pub const NO_HISTORY_PLACEHOLDER: &str = "No previous history.";

const CONSOLIDATED_HEADER: &str = "Older Feedback Summary:";

/// Check that a user id is non-empty and made of `[A-Za-z0-9_-]` only
pub fn validate_user_id(user_id: &str) -> Result<(), EngineError> {
    let valid = !user_id.is_empty()
        && user_id.len() <= 64
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidUserId(user_id.to_string()))
    }
}

/// Everything remembered about one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMemory {
    pub user_id: String,

    #[serde(default)]
    order_history: Vec<Order>,

    #[serde(default)]
    recent_feedbacks: Vec<Feedback>,

    #[serde(default)]
    consolidated_feedback: String,

    #[serde(default)]
    preferences: BTreeMap<String, String>,

    pub created_at: DateTime<Utc>,
}

impl UserMemory {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            order_history: Vec::new(),
            recent_feedbacks: Vec::new(),
            consolidated_feedback: String::new(),
            preferences: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn add_order(&mut self, order: Order) {
        self.order_history.push(order);
    }

    /// Append to the recent window, folding the oldest entry into the
    /// consolidated summary once the window is over capacity.
    pub fn add_feedback(&mut self, feedback: Feedback) -> Result<(), EngineError> {
        if !forkcast_sdk::types::is_valid_rating(feedback.rating) {
            return Err(EngineError::InvalidRating(feedback.rating));
        }

        self.recent_feedbacks.push(feedback);
        if self.recent_feedbacks.len() > RECENT_FEEDBACK_CAPACITY {
            self.consolidate_oldest();
        }
        Ok(())
    }

    fn consolidate_oldest(&mut self) {
        let oldest = self.recent_feedbacks.remove(0);
        let line = format!("• {}", oldest.summary_line());

        if self.consolidated_feedback.is_empty() {
            self.consolidated_feedback = format!("{}\n{}", CONSOLIDATED_HEADER, line);
        } else {
            self.consolidated_feedback.push('\n');
            self.consolidated_feedback.push_str(&line);
        }
    }

    /// Merge `preferences` into the stored map; existing keys are overwritten.
    pub fn update_preferences(
        &mut self,
        preferences: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), EngineError> {
        let incoming: Vec<(String, String)> = preferences
            .into_iter()
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        if let Some((key, _)) = incoming.iter().find(|(k, _)| k.is_empty()) {
            return Err(EngineError::InvalidPreference(format!(
                "empty key '{}'",
                key
            )));
        }

        self.preferences.extend(incoming);
        Ok(())
    }

    pub fn order_history(&self) -> &[Order] {
        &self.order_history
    }

    pub fn recent_feedback(&self) -> &[Feedback] {
        &self.recent_feedbacks
    }

    pub fn consolidated_feedback(&self) -> &str {
        &self.consolidated_feedback
    }

    pub fn preferences(&self) -> &BTreeMap<String, String> {
        &self.preferences
    }

    pub fn total_spent(&self) -> u64 {
        self.order_history.iter().map(|o| u64::from(o.price)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order_history.is_empty()
            && self.recent_feedbacks.is_empty()
            && self.consolidated_feedback.is_empty()
            && self.preferences.is_empty()
    }

    /// Render the memory as prompt context.
    ///
    /// Sections appear in a fixed order (preferences, the last five orders,
    /// recent feedback, consolidated summary) separated by a blank line.
    /// Empty sections are left out.
    pub fn context(&self) -> String {
        let mut sections = Vec::new();

        if !self.preferences.is_empty() {
            let mut lines = vec!["User Preferences:".to_string()];
            lines.extend(
                self.preferences
                    .iter()
                    .map(|(key, value)| format!("  - {}: {}", key, value)),
            );
            sections.push(lines.join("\n"));
        }

        if !self.order_history.is_empty() {
            let mut lines = vec![format!(
                "Order History (Total: {} orders):",
                self.order_history.len()
            )];
            let skip = self.order_history.len().saturating_sub(CONTEXT_ORDER_COUNT);
            lines.extend(self.order_history[skip..].iter().map(|order| {
                format!(
                    "  - {} from {} on {}",
                    order.dish_name,
                    order.restaurant,
                    order.timestamp.format("%Y-%m-%d")
                )
            }));
            sections.push(lines.join("\n"));
        }

        if !self.recent_feedbacks.is_empty() {
            let mut lines = vec![format!(
                "Recent Feedback (Last {} items):",
                self.recent_feedbacks.len()
            )];
            lines.extend(
                self.recent_feedbacks
                    .iter()
                    .map(|fb| format!("  - {}", fb.summary_line())),
            );
            sections.push(lines.join("\n"));
        }

        if !self.consolidated_feedback.is_empty() {
            sections.push(self.consolidated_feedback.clone());
        }

        if sections.is_empty() {
            NO_HISTORY_PLACEHOLDER.to_string()
        } else {
            sections.join("\n\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn feedback(n: u32) -> Feedback {
        Feedback {
            dish_id: format!("D{:03}", n),
            dish_name: format!("Dish {}", n),
            feedback: format!("note {}", n),
            rating: 4.0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, n, 12, 0, 0).unwrap(),
        }
    }

    fn order(n: u32) -> Order {
        Order {
            dish_id: format!("D{:03}", n),
            dish_name: format!("Dish {}", n),
            restaurant: "Kitchen".to_string(),
            price: 100 + n,
            timestamp: Utc.with_ymd_and_hms(2024, 2, n, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_new_user_context_is_placeholder() {
        let memory = UserMemory::new("fresh");
        assert!(memory.is_empty());
        assert_eq!(memory.context(), NO_HISTORY_PLACEHOLDER);
    }

    #[test]
    fn test_eleventh_feedback_consolidates_the_first() {
        let mut memory = UserMemory::new("u1");
        for n in 1..=10 {
            memory.add_feedback(feedback(n)).unwrap();
        }
        assert_eq!(memory.recent_feedback().len(), 10);
        assert!(memory.consolidated_feedback().is_empty());

        memory.add_feedback(feedback(11)).unwrap();

        assert_eq!(memory.recent_feedback().len(), 10);
        assert_eq!(memory.recent_feedback()[0].dish_id, "D002");
        assert_eq!(
            memory.consolidated_feedback(),
            "Older Feedback Summary:\n• Dish 1: note 1 (Rating: 4.0/5) - 2024-01-01"
        );

        memory.add_feedback(feedback(12)).unwrap();
        assert_eq!(memory.consolidated_feedback().lines().count(), 3);
        assert!(memory
            .consolidated_feedback()
            .ends_with("• Dish 2: note 2 (Rating: 4.0/5) - 2024-01-02"));
    }

    #[test]
    fn test_invalid_rating_is_rejected_without_mutation() {
        let mut memory = UserMemory::new("u1");
        let mut fb = feedback(1);
        fb.rating = 7.0;
        assert!(matches!(
            memory.add_feedback(fb),
            Err(EngineError::InvalidRating(_))
        ));
        assert!(memory.recent_feedback().is_empty());
    }

    #[test]
    fn test_context_sections_in_order() {
        let mut memory = UserMemory::new("u1");
        for n in 1..=7 {
            memory.add_order(order(n));
        }
        memory.add_feedback(feedback(3)).unwrap();
        memory
            .update_preferences([("dietary".to_string(), "Vegetarian".to_string())])
            .unwrap();

        let context = memory.context();
        let expected = "User Preferences:\n  - dietary: Vegetarian\n\n\
             Order History (Total: 7 orders):\n\
             \x20 - Dish 3 from Kitchen on 2024-02-03\n\
             \x20 - Dish 4 from Kitchen on 2024-02-04\n\
             \x20 - Dish 5 from Kitchen on 2024-02-05\n\
             \x20 - Dish 6 from Kitchen on 2024-02-06\n\
             \x20 - Dish 7 from Kitchen on 2024-02-07\n\n\
             Recent Feedback (Last 1 items):\n\
             \x20 - Dish 3: note 3 (Rating: 4.0/5) - 2024-01-03";
        assert_eq!(context, expected);
    }

    #[test]
    fn test_orders_only_context_has_no_leading_blank_line() {
        let mut memory = UserMemory::new("u1");
        memory.add_order(order(1));
        assert!(memory.context().starts_with("Order History (Total: 1 orders):"));
        assert_eq!(memory.total_spent(), 101);
    }

    #[test]
    fn test_update_preferences_overwrites_and_rejects_empty_keys() {
        let mut memory = UserMemory::new("u1");
        memory
            .update_preferences([("budget_range".to_string(), "cheap".to_string())])
            .unwrap();
        memory
            .update_preferences([("budget_range".to_string(), " ₹150-400 ".to_string())])
            .unwrap();
        assert_eq!(memory.preferences()["budget_range"], "₹150-400");

        let err = memory
            .update_preferences([("  ".to_string(), "x".to_string())])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPreference(_)));
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("user_demo_001").is_ok());
        assert!(validate_user_id("alice-2").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("../etc/passwd").is_err());
        assert!(validate_user_id("a b").is_err());
    }
}
