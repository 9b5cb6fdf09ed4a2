//! Parsing ranked picks back out of generated text
//!
//! The generation preamble asks for entries of the form
//!
//! ```text
//! 1. **Chocolate Brownie - Dessert Dreams (₹150)**
//!    Rich and fudgy, and you rated it 5/5 last time.
//! ```
//!
//! [`parse_recommendations`] recovers those entries so the front end can offer
//! them for ordering and feedback.

use crate::catalog::Catalog;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// One ranked entry from a generated recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPick {
    pub rank: u32,
    pub dish_name: String,
    pub restaurant: String,
    pub price: u32,
    pub rationale: String,

    /// Catalog id, filled by [`resolve_picks`] when the dish is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_id: Option<String>,
}

static PICK_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn pick_pattern() -> Option<&'static Regex> {
    PICK_PATTERN
        .get_or_init(|| {
            Regex::new(r"(?m)^\s*(\d+)\.\s+\*\*(.*?)\s+-\s+(.*?)\s+\(₹(\d+)\)\*\*")
                .map_err(|e| tracing::error!("Invalid recommendation pattern: {}", e))
                .ok()
        })
        .as_ref()
}

/// Extract every well-formed ranked entry, in order of appearance.
///
/// The rationale is the text between the entry's heading and the next
/// entry, joined into one line. Entries that do not match the pattern are
/// skipped; the number of picks is whatever the text contains.
pub fn parse_recommendations(text: &str) -> Vec<RankedPick> {
    let Some(pattern) = pick_pattern() else {
        return Vec::new();
    };

    let captures: Vec<_> = pattern.captures_iter(text).collect();
    let mut picks = Vec::with_capacity(captures.len());

    for (i, caps) in captures.iter().enumerate() {
        let (Some(whole), Some(rank), Some(name), Some(restaurant), Some(price)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3), caps.get(4))
        else {
            continue;
        };
        let (Ok(rank), Ok(price)) = (rank.as_str().parse::<u32>(), price.as_str().parse::<u32>())
        else {
            continue;
        };

        let body_end = captures
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let body = &text[whole.end()..body_end];

        picks.push(RankedPick {
            rank,
            dish_name: name.as_str().trim().to_string(),
            restaurant: restaurant.as_str().trim().to_string(),
            price,
            rationale: rationale_from(body),
            dish_id: None,
        });
    }

    picks
}

/// First paragraph after the heading, collapsed to a single line
fn rationale_from(body: &str) -> String {
    body.trim_start_matches(|c: char| c != '\n' && c.is_whitespace())
        .lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fill in `dish_id` for every pick that names a catalog dish.
///
/// A name match at the stated restaurant is preferred; otherwise the first
/// dish with that name is used.
pub fn resolve_picks(picks: &mut [RankedPick], catalog: &Catalog) {
    for pick in picks.iter_mut() {
        let dish = catalog
            .find(&pick.dish_name, Some(&pick.restaurant))
            .or_else(|| catalog.find(&pick.dish_name, None));

        match dish {
            Some(dish) => pick.dish_id = Some(dish.id.clone()),
            None => tracing::debug!("Recommended dish '{}' is not in the catalog", pick.dish_name),
        }
    }
}
