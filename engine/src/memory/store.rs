//! JSON persistence for user memory
//!
//! One pretty-printed file per user, `{user_id}_memory.json`, inside the
//! data directory. Every mutation rewrites the whole record through a
//! temporary file and a rename, so readers never see a half-written file.
//! There is no cross-process locking: the last writer wins.

use super::{validate_user_id, UserMemory};
use chrono::{DateTime, Utc};
use forkcast_sdk::errors::EngineError;
use forkcast_sdk::types::{Feedback, Order};
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Owns the directory holding the per-user memory files
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data_dir: PathBuf,
}

impl MemoryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File holding `user_id`'s memory
    pub fn path_for(&self, user_id: &str) -> Result<PathBuf, EngineError> {
        validate_user_id(user_id)?;
        Ok(self.data_dir.join(format!("{}_memory.json", user_id)))
    }

    /// Load a user's memory, or start an empty record if none exists yet.
    ///
    /// A new record is not written until its first mutation.
    pub fn open(&self, user_id: &str) -> Result<StoredMemory, EngineError> {
        let path = self.path_for(user_id)?;

        let memory = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                EngineError::Memory(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let memory: UserMemory = serde_json::from_str(&contents)?;
            if memory.user_id != user_id {
                return Err(EngineError::Memory(format!(
                    "{} belongs to user '{}'",
                    path.display(),
                    memory.user_id
                )));
            }
            tracing::debug!(
                "Loaded memory for {}: {} orders, {} recent feedback",
                user_id,
                memory.order_history().len(),
                memory.recent_feedback().len()
            );
            memory
        } else {
            tracing::debug!("No memory file for {}, starting fresh", user_id);
            UserMemory::new(user_id)
        };

        Ok(StoredMemory { path, memory })
    }

    /// Replace a user's record with an empty one.
    pub fn reset(&self, user_id: &str) -> Result<StoredMemory, EngineError> {
        let stored = StoredMemory {
            path: self.path_for(user_id)?,
            memory: UserMemory::new(user_id),
        };
        stored.save()?;
        Ok(stored)
    }
}

/// A user's memory bound to its file; each mutation is saved before it
/// returns.
#[derive(Debug, Clone)]
pub struct StoredMemory {
    path: PathBuf,
    memory: UserMemory,
}

impl StoredMemory {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_order(
        &mut self,
        dish_id: &str,
        dish_name: &str,
        restaurant: &str,
        price: u32,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), EngineError> {
        self.memory.add_order(Order {
            dish_id: dish_id.to_string(),
            dish_name: dish_name.to_string(),
            restaurant: restaurant.to_string(),
            price,
            timestamp: timestamp.unwrap_or_else(Utc::now),
        });
        self.save()
    }

    pub fn add_feedback(
        &mut self,
        dish_id: &str,
        dish_name: &str,
        feedback: &str,
        rating: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), EngineError> {
        self.memory.add_feedback(Feedback {
            dish_id: dish_id.to_string(),
            dish_name: dish_name.to_string(),
            feedback: feedback.to_string(),
            rating,
            timestamp: timestamp.unwrap_or_else(Utc::now),
        })?;
        self.save()
    }

    pub fn update_preferences(
        &mut self,
        preferences: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), EngineError> {
        self.memory.update_preferences(preferences)?;
        self.save()
    }

    /// Write the record to a sibling temp file, then rename it into place.
    fn save(&self) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Memory(format!("Failed to create data directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.memory)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json)
            .map_err(|e| EngineError::Memory(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            EngineError::Memory(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        tracing::debug!("Saved memory to {}", self.path.display());
        Ok(())
    }
}

impl Deref for StoredMemory {
    type Target = UserMemory;

    fn deref(&self) -> &UserMemory {
        &self.memory
    }
}

/// Sample history: dish id, name, restaurant, price, comment, rating
const DEMO_HISTORY: [(&str, &str, &str, u32, &str, f64); 5] = [
    (
        "D004",
        "Chicken Biryani",
        "Biryani Blues",
        350,
        "Absolutely loved it! The spices were perfect and chicken was tender.",
        5.0,
    ),
    (
        "D006",
        "Masala Dosa",
        "South Spice",
        120,
        "Crispy and delicious, but could use more potato filling.",
        4.0,
    ),
    (
        "D001",
        "Butter Chicken",
        "Punjab Grill",
        380,
        "Too creamy for my taste, felt heavy.",
        3.0,
    ),
    (
        "D005",
        "Veg Hakka Noodles",
        "Wok Express",
        180,
        "Quick and tasty, perfect for a light meal.",
        4.5,
    ),
    (
        "D008",
        "Chocolate Brownie",
        "Dessert Dreams",
        150,
        "Rich and decadent! Perfect dessert.",
        5.0,
    ),
];

/// Reset `user_id` to the demo profile: five orders with feedback and four
/// preferences.
pub fn seed_demo_user(store: &MemoryStore, user_id: &str) -> Result<StoredMemory, EngineError> {
    let mut memory = store.reset(user_id)?;

    for (dish_id, dish_name, restaurant, price, comment, rating) in DEMO_HISTORY {
        memory.add_order(dish_id, dish_name, restaurant, price, None)?;
        memory.add_feedback(dish_id, dish_name, comment, rating, None)?;
    }

    memory.update_preferences(
        [
            ("dietary", "Non-Vegetarian"),
            ("spice_preference", "Medium to High"),
            ("cuisine_favorites", "Biryani, South Indian, Chinese"),
            ("budget_range", "₹150-400 per dish"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string())),
    )?;

    tracing::info!("Seeded demo history for {}", user_id);
    Ok(memory)
}
