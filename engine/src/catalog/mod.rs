//! Dish catalog
//!
//! A read-only table of dishes, loaded once per process. The table is cached
//! in a flat TOML file (one `[[dishes]]` table per row) and seeded from the
//! built-in dish list when that file does not exist yet.
//!
//! Filtering goes through the [`query`] language; a bad expression yields an
//! empty row set plus the error, never a panic.

pub mod query;
pub mod seed;

pub use query::{FilterError, Query};

use forkcast_sdk::errors::EngineError;
use forkcast_sdk::types::{format_rating, is_valid_rating, Dish};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// On-disk layout of the catalog file
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    dishes: Vec<Dish>,
}

/// The in-memory dish table
#[derive(Debug, Clone)]
pub struct Catalog {
    dishes: Vec<Dish>,
}

/// Rows selected by a filter expression, or the reason none were
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub dishes: Vec<Dish>,
    pub error: Option<FilterError>,
}

impl FilterOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary figures for the catalog overview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub dish_count: usize,
    pub restaurant_count: usize,
    pub cuisine_count: usize,
    pub average_price: u32,
}

impl Catalog {
    pub fn new(dishes: Vec<Dish>) -> Self {
        Self { dishes }
    }

    /// The built-in twenty-dish catalog
    pub fn seeded() -> Self {
        Self::new(seed::seed_dishes())
    }

    /// Load the catalog from `path`, writing the seed catalog there first if
    /// the file does not exist
    pub fn load_or_seed(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            return Self::load_from_path(path);
        }

        let catalog = Self::seeded();
        catalog.save_to_path(path)?;
        tracing::info!(
            "Seeded catalog with {} dishes at {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Load and validate a catalog file
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Catalog(format!("Failed to read catalog file: {}", e)))?;

        let file: CatalogFile = toml::from_str(&contents)
            .map_err(|e| EngineError::Catalog(format!("Failed to parse catalog: {}", e)))?;

        let catalog = Self::new(file.dishes);
        catalog.validate()?;

        tracing::debug!("Loaded {} dishes from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Write the catalog as TOML
    pub fn save_to_path(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Catalog(format!("Failed to create catalog directory: {}", e))
            })?;
        }

        let file = CatalogFile {
            dishes: self.dishes.clone(),
        };
        let toml_string = toml::to_string_pretty(&file)
            .map_err(|e| EngineError::Catalog(format!("Failed to serialize catalog: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Catalog(format!("Failed to write catalog file: {}", e)))?;

        Ok(())
    }

    fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for dish in &self.dishes {
            if !seen.insert(dish.id.as_str()) {
                return Err(EngineError::Catalog(format!(
                    "Duplicate dish id '{}'",
                    dish.id
                )));
            }
            if !is_valid_rating(dish.rating) {
                return Err(EngineError::Catalog(format!(
                    "Dish '{}' has rating {} outside 0-5",
                    dish.id, dish.rating
                )));
            }
        }
        Ok(())
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Dish> {
        self.dishes.iter().find(|d| d.id.eq_ignore_ascii_case(id))
    }

    /// Look a dish up by name, optionally narrowed by restaurant. Case and
    /// surrounding whitespace are ignored.
    pub fn find(&self, name: &str, restaurant: Option<&str>) -> Option<&Dish> {
        let name = name.trim();
        self.dishes.iter().find(|d| {
            d.name.eq_ignore_ascii_case(name)
                && restaurant.map_or(true, |r| d.restaurant.eq_ignore_ascii_case(r.trim()))
        })
    }

    /// Apply a query expression. Parse and type errors produce an empty row
    /// set with the error attached.
    pub fn filter(&self, expression: &str) -> FilterOutcome {
        match Query::parse(expression) {
            Ok(query) => FilterOutcome {
                dishes: query.apply(&self.dishes).into_iter().cloned().collect(),
                error: None,
            },
            Err(e) => {
                tracing::warn!("Catalog filter failed: {} (expression: {})", e, expression);
                FilterOutcome {
                    dishes: Vec::new(),
                    error: Some(e),
                }
            }
        }
    }

    pub fn stats(&self) -> CatalogStats {
        let restaurants: HashSet<&str> = self.dishes.iter().map(|d| d.restaurant.as_str()).collect();
        let cuisines: HashSet<&str> = self.dishes.iter().map(|d| d.cuisine.as_str()).collect();
        let total: u64 = self.dishes.iter().map(|d| u64::from(d.price)).sum();
        let average_price = if self.dishes.is_empty() {
            0
        } else {
            (total / self.dishes.len() as u64) as u32
        };

        CatalogStats {
            dish_count: self.dishes.len(),
            restaurant_count: restaurants.len(),
            cuisine_count: cuisines.len(),
            average_price,
        }
    }
}

/// Placeholder sent to the generation stage when a filter matched nothing
pub const NO_MATCHES_TEXT: &str = "No matching dishes found in database.";

/// Render rows as the human-readable block passed to the generation stage
pub fn format_rows(dishes: &[Dish]) -> String {
    if dishes.is_empty() {
        return NO_MATCHES_TEXT.to_string();
    }

    let mut out = format!("Found {} matching dishes:\n\n", dishes.len());
    for dish in dishes {
        // Writing to a String cannot fail
        let _ = writeln!(out, "**{}** - {}", dish.name, dish.restaurant);
        let _ = writeln!(
            out,
            "  Cuisine: {} | Category: {}",
            dish.cuisine, dish.category
        );
        let _ = writeln!(
            out,
            "  Price: ₹{} | Rating: {}/5",
            dish.price,
            format_rating(dish.rating)
        );
        let _ = writeln!(
            out,
            "  Dietary: {} | Spice: {}",
            dish.dietary, dish.spice_level
        );
        let _ = writeln!(out, "  Description: {}", dish.description);
        let _ = writeln!(out, "  Tags: {}\n", dish.tags.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_or_seed_creates_file_then_reloads_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.toml");

        let first = Catalog::load_or_seed(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first.len(), 20);

        let second = Catalog::load_or_seed(&path).unwrap();
        assert_eq!(first.dishes(), second.dishes());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.toml");

        let mut dishes = seed::seed_dishes();
        dishes[1].id = dishes[0].id.clone();
        Catalog::new(dishes).save_to_path(&path).unwrap();

        let err = Catalog::load_from_path(&path).unwrap_err();
        assert!(matches!(err, EngineError::Catalog(_)));
    }

    #[test]
    fn test_filter_error_yields_empty_rows() {
        let catalog = Catalog::seeded();
        let outcome = catalog.filter("food_df[food_df['price'] < 200]");
        assert!(outcome.dishes.is_empty());
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_deeply_nested_filter_is_an_error() {
        let catalog = Catalog::seeded();
        for opener in ["(", "!"] {
            let expression = format!("{}price < 100", opener.repeat(10_000));
            let outcome = catalog.filter(&expression);
            assert!(outcome.dishes.is_empty());
            assert!(outcome.error.is_some());
        }
    }

    #[test]
    fn test_find_ignores_case() {
        let catalog = Catalog::seeded();
        let dish = catalog.find("gulab jamun", Some("sweet tooth")).unwrap();
        assert_eq!(dish.id, "D010");
        assert!(catalog.find("Gulab Jamun", Some("Punjab Grill")).is_none());
        assert_eq!(catalog.find_by_id("d004").unwrap().name, "Chicken Biryani");
    }

    #[test]
    fn test_stats() {
        let stats = Catalog::seeded().stats();
        assert_eq!(stats.dish_count, 20);
        assert_eq!(stats.restaurant_count, 17);
        assert_eq!(stats.cuisine_count, 13);
        assert_eq!(stats.average_price, 233);
    }

    #[test]
    fn test_format_rows() {
        let catalog = Catalog::seeded();
        let rows = catalog.filter("dish_id == 'D008'").dishes;
        let text = format_rows(&rows);

        assert!(text.starts_with("Found 1 matching dishes:"));
        assert!(text.contains("**Chocolate Brownie** - Dessert Dreams"));
        assert!(text.contains("Price: ₹150 | Rating: 4.5/5"));
        assert!(text.contains("Tags: Sweet, Chocolatey, Indulgent"));

        assert_eq!(format_rows(&[]), NO_MATCHES_TEXT);
    }
}
