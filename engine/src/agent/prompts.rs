//! Instruction preambles and per-turn messages for both pipeline stages

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Tag wrapping a catalog filter expression in a classifier reply
pub const CATALOG_QUERY_TAG: &str = "catalog_query";

/// Tag marking that no catalog search is needed
pub const NO_CATALOG_QUERY_TAG: &str = "no_catalog_query";

pub const CLASSIFIER_PREAMBLE: &str = r#"You are the query classifier for Forkcast, a food recommendation assistant.

Decide whether the user's message needs a search of the dish catalog.

Search the catalog when the user:
- asks which dishes, restaurants or cuisines are available
- wants to explore new options or get recommendations from the full menu
- asks for a type of food ("show me Chinese food", "what desserts do you have")
- mentions price ranges, ratings, spice or dietary needs

Do NOT search the catalog when the user:
- asks about their own order history or past feedback
- is giving feedback on something they ordered
- is chatting or asking a clarification question
- is talking about their preferences

Output format. If a search is needed, write one filter expression inside tags:
<catalog_query>
expression
</catalog_query>

If no search is needed, write:
<no_catalog_query>
Proceed with the user query and memory context only.
</no_catalog_query>

Filter expression language:
- Fields: dish_id, dish_name, restaurant, cuisine, category, price, rating,
  dietary, spice_level, prep_time_mins, tags, description
- Comparisons: == != < <= > >= ; text is quoted and compared case-insensitively
- field CONTAINS "text" (substring, or tag membership for tags)
- field IN ["a", "b"], field NOT IN [...]
- Combine with AND, OR, NOT and parentheses
- ALL selects every dish
- Optional suffix: ORDER BY field ASC|DESC, then LIMIT n
- dietary is one of "Vegetarian", "Non-Vegetarian", "Vegan"
- spice_level is one of "None", "Low", "Medium", "High" (ordered)
- price is in rupees, rating is 0 to 5, prep_time_mins is in minutes

Examples:
- cuisine == "Chinese"
- price < 200 AND dietary == "Vegetarian"
- category == "Dessert" ORDER BY rating DESC LIMIT 5
- spice_level == "High"

Be concise and output only the tagged decision."#;

pub const GENERATOR_PREAMBLE: &str = r#"You are the recommendation writer for Forkcast.

Give personalized food recommendations based on:
1. The user's request
2. The user's memory (order history, feedback, preferences)
3. Dishes found in the catalog, when a search was made
4. The current time

IMPORTANT: Always give exactly the TOP 5 recommendations ranked by relevance,
or all available dishes if fewer than 5 were found.

Format each recommendation exactly like this:
1. **Dish Name - Restaurant (₹Price)**
   Brief explanation of why this is recommended (1-2 sentences)

Guidelines:
- Be conversational and friendly
- Explain WHY each dish fits, based on their history
- Reference past feedback when relevant, acknowledging likes and dislikes
- Respect their preferences and dietary restrictions
- Rank by relevance, most relevant first
- Mention price and restaurant name for each dish

Tone: warm, personal, enthusiastic but not pushy.

Always end with: "Let me know how you like it! The more feedback you share, the better I can personalize recommendations for you.""#;

/// Render a timestamp the way the prompts present it,
/// e.g. `Friday, March 01, 2024 at 07:30 PM`
pub fn format_current_time<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format("%A, %B %d, %Y at %I:%M %p").to_string()
}

/// User turn for the classification stage
pub fn classifier_turn(current_time: &str, query: &str, memory_context: &str) -> String {
    format!(
        "Current Time: {}\n\nUser Query: {}\n\nUser Memory Context:\n{}\n\n\
         Analyze the query and decide if we need to search the dish catalog.",
        current_time, query, memory_context
    )
}

/// User turn for the generation stage. `catalog_rows` is the formatted
/// search result, or `None` when the catalog was not searched.
pub fn generator_turn(
    current_time: &str,
    query: &str,
    memory_context: &str,
    catalog_rows: Option<&str>,
) -> String {
    let mut turn = format!(
        "Current Time: {}\n\nUser Query: {}\n\nUser Memory Context:\n{}\n\n",
        current_time, query, memory_context
    );

    if let Some(rows) = catalog_rows {
        turn.push_str("\nAvailable Dishes (from catalog search):\n");
        turn.push_str(rows);
    }

    turn.push_str("\n\nProvide your personalized recommendation:");
    turn
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_time_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 0).unwrap();
        assert_eq!(format_current_time(&now), "Friday, March 01, 2024 at 07:30 PM");
    }

    #[test]
    fn test_preambles_name_their_tags() {
        assert!(CLASSIFIER_PREAMBLE.contains("<catalog_query>"));
        assert!(CLASSIFIER_PREAMBLE.contains("</no_catalog_query>"));
        assert!(GENERATOR_PREAMBLE.contains("**Dish Name - Restaurant (₹Price)**"));
    }

    #[test]
    fn test_generator_turn_with_and_without_rows() {
        let with_rows = generator_turn("now", "desserts", "No previous history.", Some("Found 2"));
        assert!(with_rows.contains("Available Dishes (from catalog search):\nFound 2"));
        assert!(with_rows.ends_with("Provide your personalized recommendation:"));

        let without = generator_turn("now", "hi", "No previous history.", None);
        assert!(!without.contains("Available Dishes"));
    }

    #[test]
    fn test_classifier_turn_layout() {
        let turn = classifier_turn("now", "spicy food", "User Preferences:\n  - x: y");
        assert!(turn.starts_with("Current Time: now\n\nUser Query: spicy food\n\n"));
        assert!(turn.contains("User Memory Context:\nUser Preferences:"));
    }
}
