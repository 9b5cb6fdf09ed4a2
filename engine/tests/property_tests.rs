use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use forkcast_engine::catalog::query::MAX_NESTING;
use forkcast_engine::catalog::{Catalog, Query};
use forkcast_engine::memory::{UserMemory, RECENT_FEEDBACK_CAPACITY};
use forkcast_sdk::types::Feedback;

fn feedback(n: u32, rating: f64) -> Feedback {
    Feedback {
        dish_id: format!("D{:03}", n % 20 + 1),
        dish_name: format!("Dish {}", n),
        feedback: format!("comment {}", n),
        rating,
        timestamp: Utc
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .unwrap()
            + chrono::Duration::days(i64::from(n)),
    }
}

// The recent window never exceeds its capacity, nothing is lost, and the
// consolidated summary only ever grows.
proptest! {
    #[test]
    fn test_feedback_window_bounded_and_summary_monotonic(
        ratings in prop::collection::vec(0u8..=10, 0..40),
    ) {
        let mut memory = UserMemory::new("prop_user");
        let mut previous_summary = String::new();

        for (i, steps) in ratings.iter().enumerate() {
            let n = u32::try_from(i).unwrap();
            memory.add_feedback(feedback(n, f64::from(*steps) * 0.5)).unwrap();

            prop_assert!(memory.recent_feedback().len() <= RECENT_FEEDBACK_CAPACITY);
            prop_assert!(memory.consolidated_feedback().starts_with(&previous_summary));
            previous_summary = memory.consolidated_feedback().to_string();
        }

        let consolidated_lines = memory
            .consolidated_feedback()
            .lines()
            .filter(|line| line.starts_with('•'))
            .count();
        prop_assert_eq!(
            consolidated_lines + memory.recent_feedback().len(),
            ratings.len()
        );

        // The window holds the newest entries, oldest first
        if let Some(last) = memory.recent_feedback().last() {
            prop_assert_eq!(&last.dish_name, &format!("Dish {}", ratings.len() - 1));
        }
    }
}

proptest! {
    #[test]
    fn test_out_of_range_ratings_are_rejected(rating in prop_oneof![
        -100.0..-0.001f64,
        5.001..100.0f64,
    ]) {
        let mut memory = UserMemory::new("prop_user");
        prop_assert!(memory.add_feedback(feedback(1, rating)).is_err());
        prop_assert!(memory.recent_feedback().is_empty());
    }
}

// Arbitrary input never panics the expression parser or the filter.
proptest! {
    #[test]
    fn test_filter_never_panics(expression in "\\PC{0,80}") {
        let catalog = Catalog::seeded();
        let outcome = catalog.filter(&expression);
        if outcome.error.is_some() {
            prop_assert!(outcome.dishes.is_empty());
        }
    }

    #[test]
    fn test_filter_never_panics_on_dsl_like_input(
        tokens in prop::collection::vec(
            prop_oneof![
                Just("price"), Just("rating"), Just("dietary"), Just("tags"),
                Just("<"), Just(">="), Just("=="), Just("!="), Just("CONTAINS"),
                Just("IN"), Just("NOT"), Just("AND"), Just("OR"), Just("("), Just(")"),
                Just("["), Just("]"), Just(","), Just("200"), Just("4.5"),
                Just("\"Vegetarian\""), Just("\"Spicy\""), Just("ORDER BY"), Just("DESC"),
                Just("LIMIT"), Just("3"), Just("ALL"),
            ],
            0..16,
        ),
    ) {
        let expression = tokens.join(" ");
        let _ = Query::parse(&expression);
        let _ = Catalog::seeded().filter(&expression);
    }

    #[test]
    fn test_nesting_depth_is_bounded(
        depth in 0usize..5_000,
        opener in prop_oneof![Just("("), Just("!"), Just("NOT ")],
    ) {
        let closer = if opener == "(" { ")" } else { "" };
        let expression = format!(
            "{}price < 200{}",
            opener.repeat(depth),
            closer.repeat(depth)
        );
        let outcome = Catalog::seeded().filter(&expression);
        prop_assert_eq!(outcome.error.is_none(), depth <= MAX_NESTING);
    }
}

// Numeric comparisons select exactly the dishes that satisfy them.
proptest! {
    #[test]
    fn test_price_filter_matches_manual_scan(limit in 0u32..600) {
        let catalog = Catalog::seeded();
        let outcome = catalog.filter(&format!("price < {}", limit));

        prop_assert!(outcome.error.is_none());
        let expected = catalog.dishes().iter().filter(|d| d.price < limit).count();
        prop_assert_eq!(outcome.dishes.len(), expected);
        prop_assert!(outcome.dishes.iter().all(|d| d.price < limit));
    }

    #[test]
    fn test_limit_caps_result_size(limit in 0usize..30) {
        let catalog = Catalog::seeded();
        let outcome = catalog.filter(&format!("ALL ORDER BY rating DESC LIMIT {}", limit));

        prop_assert!(outcome.error.is_none());
        prop_assert_eq!(outcome.dishes.len(), limit.min(catalog.len()));
        prop_assert!(outcome
            .dishes
            .windows(2)
            .all(|pair| pair[0].rating >= pair[1].rating));
    }
}
