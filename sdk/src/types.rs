//! Catalog and history record types
//!
//! These are the records shared between the catalog, the memory store and the
//! front end. Field names on the wire follow the flat column layout of the
//! catalog file (`dish_id`, `dish_name`, `prep_time_mins`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dietary classification of a dish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dietary {
    #[serde(rename = "Vegetarian")]
    Vegetarian,

    #[serde(rename = "Non-Vegetarian")]
    NonVegetarian,

    #[serde(rename = "Vegan")]
    Vegan,
}

impl Dietary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dietary::Vegetarian => "Vegetarian",
            Dietary::NonVegetarian => "Non-Vegetarian",
            Dietary::Vegan => "Vegan",
        }
    }
}

impl fmt::Display for Dietary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dietary {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "veg" | "vegetarian" => Ok(Dietary::Vegetarian),
            "nonveg" | "nonvegetarian" => Ok(Dietary::NonVegetarian),
            "vegan" => Ok(Dietary::Vegan),
            _ => Err(UnknownVariant {
                kind: "dietary",
                value: s.to_string(),
            }),
        }
    }
}

/// Spice level of a dish, ordered from mildest to hottest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpiceLevel {
    None,
    Low,
    Medium,
    High,
}

impl SpiceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpiceLevel::None => "None",
            SpiceLevel::Low => "Low",
            SpiceLevel::Medium => "Medium",
            SpiceLevel::High => "High",
        }
    }
}

impl fmt::Display for SpiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpiceLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no" | "not spicy" => Ok(SpiceLevel::None),
            "low" | "mild" => Ok(SpiceLevel::Low),
            "medium" | "moderate" => Ok(SpiceLevel::Medium),
            "high" | "hot" => Ok(SpiceLevel::High),
            _ => Err(UnknownVariant {
                kind: "spice level",
                value: s.to_string(),
            }),
        }
    }
}

/// Returned when a string does not name a known enum variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// A single orderable dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    #[serde(rename = "dish_id")]
    pub id: String,

    #[serde(rename = "dish_name")]
    pub name: String,

    pub restaurant: String,
    pub cuisine: String,
    pub category: String,

    /// Price in whole rupees
    pub price: u32,

    /// Average rating, 0.0 to 5.0
    pub rating: f64,

    pub dietary: Dietary,
    pub spice_level: SpiceLevel,
    pub prep_time_mins: u32,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub description: String,
}

impl Dish {
    /// True if any tag equals `tag`, ignoring ASCII case
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }
}

/// A confirmed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub dish_id: String,
    pub dish_name: String,
    pub restaurant: String,
    pub price: u32,
    pub timestamp: DateTime<Utc>,
}

/// Feedback left for an ordered dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub dish_id: String,
    pub dish_name: String,

    /// Free-text comment
    pub feedback: String,

    /// Rating, 0.0 to 5.0
    pub rating: f64,

    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    /// Render as a single summary line, e.g.
    /// `Masala Dosa: Crispy! (Rating: 4.5/5) - 2024-03-01`
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {} (Rating: {}/5) - {}",
            self.dish_name,
            self.feedback,
            format_rating(self.rating),
            self.timestamp.format("%Y-%m-%d")
        )
    }
}

/// Format a rating so whole numbers keep one decimal (`5.0`, `4.5`, `3.75`)
pub fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{:.1}", rating)
    } else {
        format!("{}", rating)
    }
}

/// Highest rating a dish or a feedback entry can carry
pub const MAX_RATING: f64 = 5.0;

/// Check that a rating lies within `0.0..=5.0`
pub fn is_valid_rating(rating: f64) -> bool {
    rating.is_finite() && (0.0..=MAX_RATING).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dietary_parsing_is_lenient() {
        assert_eq!("Vegetarian".parse::<Dietary>().unwrap(), Dietary::Vegetarian);
        assert_eq!("veg".parse::<Dietary>().unwrap(), Dietary::Vegetarian);
        assert_eq!(
            "Non-Vegetarian".parse::<Dietary>().unwrap(),
            Dietary::NonVegetarian
        );
        assert_eq!("non veg".parse::<Dietary>().unwrap(), Dietary::NonVegetarian);
        assert!("pescatarian".parse::<Dietary>().is_err());
    }

    #[test]
    fn test_spice_level_ordering() {
        assert!(SpiceLevel::None < SpiceLevel::Low);
        assert!(SpiceLevel::Low < SpiceLevel::Medium);
        assert!(SpiceLevel::Medium < SpiceLevel::High);
        assert_eq!("mild".parse::<SpiceLevel>().unwrap(), SpiceLevel::Low);
    }

    #[test]
    fn test_dish_serializes_with_column_names() {
        let dish = Dish {
            id: "D010".to_string(),
            name: "Gulab Jamun".to_string(),
            restaurant: "Sweet Tooth".to_string(),
            cuisine: "Indian".to_string(),
            category: "Dessert".to_string(),
            price: 80,
            rating: 4.4,
            dietary: Dietary::Vegetarian,
            spice_level: SpiceLevel::None,
            prep_time_mins: 5,
            tags: vec!["Sweet".to_string()],
            description: "Deep-fried milk balls in sugar syrup".to_string(),
        };

        let json = serde_json::to_value(&dish).unwrap();
        assert_eq!(json["dish_id"], "D010");
        assert_eq!(json["dish_name"], "Gulab Jamun");
        assert_eq!(json["dietary"], "Vegetarian");
        assert_eq!(json["spice_level"], "None");
        assert!(dish.has_tag("sweet"));
    }

    #[test]
    fn test_feedback_summary_line() {
        let feedback = Feedback {
            dish_id: "D006".to_string(),
            dish_name: "Masala Dosa".to_string(),
            feedback: "Crispy and delicious".to_string(),
            rating: 4.0,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        };

        assert_eq!(
            feedback.summary_line(),
            "Masala Dosa: Crispy and delicious (Rating: 4.0/5) - 2024-03-01"
        );
    }

    #[test]
    fn test_rating_bounds() {
        assert!(is_valid_rating(0.0));
        assert!(is_valid_rating(5.0));
        assert!(!is_valid_rating(5.5));
        assert!(!is_valid_rating(-1.0));
        assert!(!is_valid_rating(f64::NAN));
    }
}
