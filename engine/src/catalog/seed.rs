//! Built-in dish catalog
//!
//! Twenty dishes across fourteen restaurants. Written to `catalog.toml` the
//! first time the catalog is loaded.

use forkcast_sdk::types::{Dietary, Dish, SpiceLevel};

#[allow(clippy::too_many_arguments)]
fn dish(
    id: &str,
    name: &str,
    restaurant: &str,
    cuisine: &str,
    category: &str,
    price: u32,
    rating: f64,
    dietary: Dietary,
    spice_level: SpiceLevel,
    prep_time_mins: u32,
    tags: &[&str],
    description: &str,
) -> Dish {
    Dish {
        id: id.to_string(),
        name: name.to_string(),
        restaurant: restaurant.to_string(),
        cuisine: cuisine.to_string(),
        category: category.to_string(),
        price,
        rating,
        dietary,
        spice_level,
        prep_time_mins,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: description.to_string(),
    }
}

/// The seed dishes, in catalog order
pub fn seed_dishes() -> Vec<Dish> {
    vec![
        dish(
            "D001",
            "Butter Chicken",
            "Punjab Grill",
            "North Indian",
            "Main Course",
            380,
            4.5,
            Dietary::NonVegetarian,
            SpiceLevel::Medium,
            25,
            &["Creamy", "Popular", "Rich"],
            "Tender chicken in rich tomato-butter gravy",
        ),
        dish(
            "D002",
            "Paneer Tikka Masala",
            "Punjab Grill",
            "North Indian",
            "Main Course",
            320,
            4.4,
            Dietary::Vegetarian,
            SpiceLevel::Medium,
            20,
            &["Creamy", "Popular", "Protein-Rich"],
            "Grilled cottage cheese in spiced tomato gravy",
        ),
        dish(
            "D003",
            "Margherita Pizza",
            "Pizza Hub",
            "Italian",
            "Main Course",
            280,
            4.3,
            Dietary::Vegetarian,
            SpiceLevel::None,
            18,
            &["Cheesy", "Classic", "Quick"],
            "Classic pizza with mozzarella and basil",
        ),
        dish(
            "D004",
            "Chicken Biryani",
            "Biryani Blues",
            "Hyderabadi",
            "Main Course",
            350,
            4.7,
            Dietary::NonVegetarian,
            SpiceLevel::Medium,
            30,
            &["Aromatic", "Filling", "Traditional"],
            "Fragrant basmati rice with tender chicken",
        ),
        dish(
            "D005",
            "Veg Hakka Noodles",
            "Wok Express",
            "Chinese",
            "Main Course",
            180,
            4.2,
            Dietary::Vegetarian,
            SpiceLevel::Medium,
            15,
            &["Quick", "Light", "Stir-Fried"],
            "Stir-fried noodles with vegetables",
        ),
        dish(
            "D006",
            "Masala Dosa",
            "South Spice",
            "South Indian",
            "Main Course",
            120,
            4.6,
            Dietary::Vegetarian,
            SpiceLevel::Medium,
            20,
            &["Crispy", "Traditional", "Healthy"],
            "Crispy rice crepe with spiced potato filling",
        ),
        dish(
            "D007",
            "Chicken Fried Rice",
            "Wok Express",
            "Chinese",
            "Main Course",
            220,
            4.3,
            Dietary::NonVegetarian,
            SpiceLevel::Low,
            15,
            &["Quick", "Filling", "Savory"],
            "Stir-fried rice with chicken and vegetables",
        ),
        dish(
            "D008",
            "Chocolate Brownie",
            "Dessert Dreams",
            "Continental",
            "Dessert",
            150,
            4.5,
            Dietary::Vegetarian,
            SpiceLevel::None,
            10,
            &["Sweet", "Chocolatey", "Indulgent"],
            "Rich chocolate brownie with ice cream",
        ),
        dish(
            "D009",
            "Caesar Salad",
            "Healthy Bites",
            "Continental",
            "Appetizer",
            200,
            4.1,
            Dietary::NonVegetarian,
            SpiceLevel::None,
            10,
            &["Healthy", "Fresh", "Light"],
            "Crisp romaine with Caesar dressing and chicken",
        ),
        dish(
            "D010",
            "Gulab Jamun",
            "Sweet Tooth",
            "Indian",
            "Dessert",
            80,
            4.4,
            Dietary::Vegetarian,
            SpiceLevel::None,
            5,
            &["Sweet", "Traditional", "Popular"],
            "Deep-fried milk balls in sugar syrup",
        ),
        dish(
            "D011",
            "Fish Curry",
            "Coastal Kitchen",
            "Coastal",
            "Main Course",
            400,
            4.6,
            Dietary::NonVegetarian,
            SpiceLevel::High,
            25,
            &["Spicy", "Tangy", "Traditional"],
            "Fresh fish in coconut-based spicy curry",
        ),
        dish(
            "D012",
            "Veg Burger",
            "Burger Town",
            "American",
            "Main Course",
            150,
            4.0,
            Dietary::Vegetarian,
            SpiceLevel::Low,
            12,
            &["Quick", "Filling", "Casual"],
            "Vegetable patty with fresh veggies and sauces",
        ),
        dish(
            "D013",
            "Chole Bhature",
            "Punjabi Zaika",
            "North Indian",
            "Main Course",
            140,
            4.5,
            Dietary::Vegetarian,
            SpiceLevel::Medium,
            20,
            &["Filling", "Traditional", "Popular"],
            "Spicy chickpea curry with fried bread",
        ),
        dish(
            "D014",
            "Pad Thai",
            "Thai Basil",
            "Thai",
            "Main Course",
            320,
            4.4,
            Dietary::NonVegetarian,
            SpiceLevel::Medium,
            20,
            &["Tangy", "Sweet", "Exotic"],
            "Stir-fried rice noodles with shrimp and peanuts",
        ),
        dish(
            "D015",
            "Idli Sambar",
            "South Spice",
            "South Indian",
            "Main Course",
            100,
            4.5,
            Dietary::Vegetarian,
            SpiceLevel::Low,
            15,
            &["Healthy", "Light", "Traditional"],
            "Steamed rice cakes with lentil soup",
        ),
        dish(
            "D016",
            "Chicken Wings",
            "Wings & Things",
            "American",
            "Appetizer",
            280,
            4.3,
            Dietary::NonVegetarian,
            SpiceLevel::High,
            18,
            &["Spicy", "Crispy", "Popular"],
            "Crispy chicken wings with hot sauce",
        ),
        dish(
            "D017",
            "Paneer Wrap",
            "Quick Bites",
            "Fusion",
            "Main Course",
            160,
            4.2,
            Dietary::Vegetarian,
            SpiceLevel::Medium,
            10,
            &["Quick", "Filling", "Portable"],
            "Grilled paneer with veggies in wrap",
        ),
        dish(
            "D018",
            "Mutton Rogan Josh",
            "Kashmir Kitchen",
            "Kashmiri",
            "Main Course",
            450,
            4.7,
            Dietary::NonVegetarian,
            SpiceLevel::High,
            35,
            &["Rich", "Aromatic", "Premium"],
            "Tender mutton in aromatic red curry",
        ),
        dish(
            "D019",
            "Mango Lassi",
            "Lassi Corner",
            "Indian",
            "Beverage",
            80,
            4.6,
            Dietary::Vegetarian,
            SpiceLevel::None,
            5,
            &["Refreshing", "Sweet", "Cooling"],
            "Yogurt-based mango drink",
        ),
        dish(
            "D020",
            "Veg Thali",
            "Rajdhani Thali",
            "Rajasthani",
            "Main Course",
            300,
            4.6,
            Dietary::Vegetarian,
            SpiceLevel::Medium,
            25,
            &["Complete Meal", "Variety", "Traditional"],
            "Complete meal with dal, vegetables, roti, rice, dessert",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_has_twenty_unique_ids() {
        let dishes = seed_dishes();
        assert_eq!(dishes.len(), 20);

        let ids: HashSet<_> = dishes.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(dishes[0].id, "D001");
        assert_eq!(dishes[19].id, "D020");
    }

    #[test]
    fn test_seed_ratings_in_range() {
        for dish in seed_dishes() {
            assert!(
                forkcast_sdk::types::is_valid_rating(dish.rating),
                "{} has rating {}",
                dish.name,
                dish.rating
            );
        }
    }
}
