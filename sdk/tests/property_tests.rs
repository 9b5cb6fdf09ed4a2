use forkcast_sdk::errors::{EngineError, ForkcastErrorExt};
use forkcast_sdk::types::{format_rating, is_valid_rating, SpiceLevel};
use proptest::prelude::*;

// User hints are static text and never echo the inner message back.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::Catalog(error_str.clone()),
            EngineError::Memory(error_str.clone()),
            EngineError::LLMProvider(error_str.clone()),
            EngineError::KeyringError(error_str.clone()),
            EngineError::InvalidUserId(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            if error_str.len() > 12 {
                prop_assert!(!hint.contains(&error_str));
            }
        }
    }
}

proptest! {
    #[test]
    fn test_spice_level_parse_ignores_case(idx in 0usize..4, upper in any::<bool>()) {
        let level = [SpiceLevel::None, SpiceLevel::Low, SpiceLevel::Medium, SpiceLevel::High][idx];
        let text = if upper {
            level.as_str().to_uppercase()
        } else {
            level.as_str().to_lowercase()
        };
        prop_assert_eq!(text.parse::<SpiceLevel>().unwrap(), level);
    }

    #[test]
    fn test_half_step_ratings_are_valid_and_render_with_decimal(steps in 0u32..=10) {
        let rating = f64::from(steps) * 0.5;
        prop_assert!(is_valid_rating(rating));
        prop_assert!(format_rating(rating).contains('.'));
    }
}
