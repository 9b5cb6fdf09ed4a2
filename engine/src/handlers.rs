//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - ask / chat: Run queries through the recommendation pipeline
//! - order: Record an order and optional feedback
//! - history / profile / prefs: Inspect and edit a user's memory
//! - catalog: Browse or filter the dish catalog
//! - demo: Seed the sample user
//! - key / doctor: API key storage and diagnostics

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::agent::{parse_recommendations, resolve_picks, Orchestrator, QueryOutcome, RankedPick};
use crate::catalog::{Catalog, FilterOutcome};
use crate::cli::{parse_preference, KeyAction};
use crate::config::Config;
use crate::llm::provider_from_config;
use crate::memory::{seed_demo_user, MemoryStore, StoredMemory};
use crate::secrets::{SecretCache, SecretManager, SecretString, GEMINI_API_KEY};
use forkcast_sdk::errors::EngineError;
use forkcast_sdk::types::{format_rating, is_valid_rating, Dish};

/// Keychain service name
const KEYRING_SERVICE: &str = "forkcast";

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Everything a command needs: configuration, catalog and the user's store
pub struct App {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub store: MemoryStore,
    pub user_id: String,
}

impl App {
    /// Load the catalog and resolve the active user
    pub fn load(config: Config, user_override: Option<String>) -> Result<Self> {
        let user_id = user_override.unwrap_or_else(|| config.core.user_id.clone());
        crate::memory::validate_user_id(&user_id)?;

        let catalog_path = config.catalog_path();
        let catalog = Catalog::load_or_seed(&catalog_path)
            .with_context(|| format!("Failed to load catalog from {}", catalog_path.display()))?;
        let store = MemoryStore::new(config.core.data_dir.clone());

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            store,
            user_id,
        })
    }

    pub fn memory(&self) -> Result<StoredMemory> {
        self.store
            .open(&self.user_id)
            .with_context(|| format!("Failed to open memory for {}", self.user_id))
    }

    /// Build the pipeline with the configured provider for both stages.
    ///
    /// The Gemini key is resolved up front, prompting on a blocking thread if
    /// it is not stored anywhere. Requests never wait on the terminal.
    pub async fn orchestrator(&self) -> Result<Orchestrator> {
        let manager = Arc::new(SecretManager::new(KEYRING_SERVICE).non_interactive());
        let secrets = Arc::new(SecretCache::new(manager));
        if self.config.llm.provider == "gemini" {
            let key = tokio::task::spawn_blocking(|| {
                SecretManager::new(KEYRING_SERVICE).get_secret(GEMINI_API_KEY)
            })
            .await
            .context("API key lookup was interrupted")??;
            secrets.insert(GEMINI_API_KEY, SecretString::new(key));
        }
        let provider = provider_from_config(&self.config.llm, secrets)?;

        Ok(Orchestrator::new(
            Arc::clone(&self.catalog),
            Arc::clone(&provider),
            provider,
            (&self.config).into(),
        ))
    }
}

/// Ranked picks from a response, with catalog ids filled in
fn picks_for(outcome: &QueryOutcome, catalog: &Catalog) -> Vec<RankedPick> {
    if !outcome.is_success() {
        return Vec::new();
    }
    let mut picks = parse_recommendations(&outcome.response);
    resolve_picks(&mut picks, catalog);
    picks
}

fn print_outcome(outcome: &QueryOutcome, picks: &[RankedPick], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", outcome.response);
        }
        OutputFormat::Json => {
            let output = json!({
                "response": outcome.response,
                "picks": picks,
                "trace": outcome.trace,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Answer a single query
pub async fn handle_ask(app: &App, query: &str, format: OutputFormat) -> Result<()> {
    let orchestrator = app.orchestrator().await?;
    let memory = app.memory()?;
    let mut session = orchestrator.new_session();

    let outcome = orchestrator
        .process(&mut session, query, &memory.context())
        .await;
    let picks = picks_for(&outcome, &app.catalog);

    print_outcome(&outcome, &picks, format)
}

/// Read one trimmed line from stdin after printing `prompt`.
/// Returns `None` at end of input.
fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Interactive loop: ask, pick a dish, rate it
pub async fn handle_chat(app: &App, format: OutputFormat) -> Result<()> {
    let orchestrator = app.orchestrator().await?;
    let mut memory = app.memory()?;
    let mut session = orchestrator.new_session();

    if format == OutputFormat::Text {
        println!("Forkcast. Tell me what you're craving. Type 'exit' to quit.");
        println!();
    }

    loop {
        let Some(query) = prompt_line("You: ")? else {
            break;
        };
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_ascii_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let outcome = orchestrator
            .process(&mut session, &query, &memory.context())
            .await;
        let picks = picks_for(&outcome, &app.catalog);

        if format == OutputFormat::Text {
            println!();
        }
        print_outcome(&outcome, &picks, format)?;
        println!();

        if format == OutputFormat::Text && !picks.is_empty() {
            confirm_order(&mut memory, &picks)?;
        }
    }

    if format == OutputFormat::Text {
        println!("Enjoy your meal!");
    }
    Ok(())
}

/// Offer the picks for ordering, then ask for a rating and a comment.
/// Nothing is saved unless the user picks a dish and rates it.
fn confirm_order(memory: &mut StoredMemory, picks: &[RankedPick]) -> Result<()> {
    let prompt = format!("Order one of these? [1-{}, Enter to skip]: ", picks.len());
    let Some(choice) = prompt_line(&prompt)? else {
        return Ok(());
    };
    let Some(pick) = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| picks.get(i))
    else {
        return Ok(());
    };

    let Some(rating) = prompt_line("Rating 0-5: ")? else {
        return Ok(());
    };
    let Some(rating) = parse_rating(&rating) else {
        println!("Order not saved: ratings are numbers from 0 to 5.");
        return Ok(());
    };
    let comment = prompt_line("Comment: ")?.unwrap_or_default();

    let dish_id = pick.dish_id.as_deref().unwrap_or("UNKNOWN");
    record_order(
        memory,
        dish_id,
        &pick.dish_name,
        &pick.restaurant,
        pick.price,
        rating,
        &comment,
    )?;
    println!(
        "Ordered {} from {}. Feedback saved.",
        pick.dish_name, pick.restaurant
    );
    Ok(())
}

/// A rating typed at the prompt, if it is a number from 0 to 5
fn parse_rating(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|r| is_valid_rating(*r))
}

/// Save an order together with its feedback. The rating is checked first so
/// a bad one leaves the memory file untouched.
fn record_order(
    memory: &mut StoredMemory,
    dish_id: &str,
    dish_name: &str,
    restaurant: &str,
    price: u32,
    rating: f64,
    comment: &str,
) -> Result<()> {
    if !is_valid_rating(rating) {
        return Err(EngineError::InvalidRating(rating).into());
    }
    memory.add_order(dish_id, dish_name, restaurant, price, None)?;
    memory.add_feedback(dish_id, dish_name, comment, rating, None)?;
    Ok(())
}

/// Resolve a dish argument: an id first, then a name
fn lookup_dish<'a>(
    catalog: &'a Catalog,
    dish: &str,
    restaurant: Option<&str>,
) -> Result<&'a Dish, EngineError> {
    catalog
        .find_by_id(dish.trim())
        .filter(|d| restaurant.map_or(true, |r| d.restaurant.eq_ignore_ascii_case(r.trim())))
        .or_else(|| catalog.find(dish, restaurant))
        .ok_or_else(|| EngineError::DishNotFound(dish.to_string()))
}

/// Record an order together with its rating and optional comment
pub async fn handle_order(
    app: &App,
    dish: &str,
    restaurant: Option<&str>,
    rating: f64,
    comment: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let dish = lookup_dish(&app.catalog, dish, restaurant)?;
    let mut memory = app.memory()?;
    record_order(
        &mut memory,
        &dish.id,
        &dish.name,
        &dish.restaurant,
        dish.price,
        rating,
        comment.unwrap_or(""),
    )?;

    match format {
        OutputFormat::Text => {
            println!(
                "✓ Ordered {} from {} (₹{})",
                dish.name, dish.restaurant, dish.price
            );
            println!("  Feedback saved: {}/5", format_rating(rating));
        }
        OutputFormat::Json => {
            let output = json!({
                "status": "ordered",
                "user_id": app.user_id,
                "dish": dish,
                "rating": rating,
                "comment": comment,
                "total_orders": memory.order_history().len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Show the most recent orders and all retained feedback
pub async fn handle_history(app: &App, limit: usize, format: OutputFormat) -> Result<()> {
    let memory = app.memory()?;
    let orders = memory.order_history();
    let shown = &orders[orders.len().saturating_sub(limit)..];

    match format {
        OutputFormat::Text => {
            if orders.is_empty() {
                println!("No orders yet for {}", app.user_id);
                return Ok(());
            }

            println!(
                "Order History for {} (showing {} of {}):",
                app.user_id,
                shown.len(),
                orders.len()
            );
            println!();
            for order in shown.iter().rev() {
                println!(
                    "  {}  {} from {} (₹{})",
                    order.timestamp.format("%Y-%m-%d %H:%M"),
                    order.dish_name,
                    order.restaurant,
                    order.price
                );
            }
            println!();
            println!("Total spent: ₹{}", memory.total_spent());

            if !memory.recent_feedback().is_empty() {
                println!();
                println!("Recent Feedback:");
                for feedback in memory.recent_feedback().iter().rev() {
                    println!("  {}", feedback.summary_line());
                }
            }
            if !memory.consolidated_feedback().is_empty() {
                println!();
                println!("{}", memory.consolidated_feedback());
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "user_id": app.user_id,
                "orders": shown,
                "count": orders.len(),
                "limit": limit,
                "total_spent": memory.total_spent(),
                "recent_feedback": memory.recent_feedback(),
                "consolidated_feedback": memory.consolidated_feedback(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Show the memory context exactly as the models receive it
pub async fn handle_profile(app: &App, format: OutputFormat) -> Result<()> {
    let memory = app.memory()?;

    match format {
        OutputFormat::Text => {
            println!("Profile: {}", app.user_id);
            println!("Member since: {}", memory.created_at.format("%Y-%m-%d"));
            println!();
            println!("{}", memory.context());
        }
        OutputFormat::Json => {
            let output = json!({
                "user_id": app.user_id,
                "created_at": memory.created_at,
                "total_orders": memory.order_history().len(),
                "total_spent": memory.total_spent(),
                "preferences": memory.preferences(),
                "context": memory.context(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Set preferences given as `key=value`, then show the full map
pub async fn handle_prefs(app: &App, set: &[String], format: OutputFormat) -> Result<()> {
    let mut memory = app.memory()?;

    if !set.is_empty() {
        let mut updates = Vec::with_capacity(set.len());
        for item in set {
            match parse_preference(item) {
                Some(pair) => updates.push(pair),
                None => {
                    return Err(EngineError::InvalidPreference(format!(
                        "'{}' is not key=value",
                        item
                    ))
                    .into())
                }
            }
        }
        memory.update_preferences(updates)?;
    }

    match format {
        OutputFormat::Text => {
            if memory.preferences().is_empty() {
                println!("No preferences set. Use 'forkcast prefs key=value'.");
            } else {
                println!("Preferences for {}:", app.user_id);
                for (key, value) in memory.preferences() {
                    println!("  {:<20} {}", format!("{}:", key), value);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "user_id": app.user_id,
                "preferences": memory.preferences(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// List the catalog, optionally narrowed by a filter expression
pub async fn handle_catalog(app: &App, filter: Option<&str>, format: OutputFormat) -> Result<()> {
    let outcome = match filter {
        Some(expression) => app.catalog.filter(expression),
        None => FilterOutcome {
            dishes: app.catalog.dishes().to_vec(),
            error: None,
        },
    };

    if let Some(error) = &outcome.error {
        match format {
            OutputFormat::Text => println!("✗ Invalid filter: {}", error),
            OutputFormat::Json => {
                let output = json!({ "error": error.to_string(), "dishes": [] });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        bail!("invalid filter expression");
    }

    match format {
        OutputFormat::Text => {
            if filter.is_none() {
                let stats = app.catalog.stats();
                println!(
                    "{} dishes from {} restaurants across {} cuisines (average ₹{})",
                    stats.dish_count,
                    stats.restaurant_count,
                    stats.cuisine_count,
                    stats.average_price
                );
                println!();
            }
            if outcome.dishes.is_empty() {
                println!("No matching dishes.");
            }
            for dish in &outcome.dishes {
                println!(
                    "  {}  {:<24} {:<18} ₹{:<5} {}/5  {}, {}",
                    dish.id,
                    dish.name,
                    dish.restaurant,
                    dish.price,
                    format_rating(dish.rating),
                    dish.dietary,
                    dish.spice_level
                );
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "filter": filter,
                "count": outcome.dishes.len(),
                "dishes": outcome.dishes,
                "stats": app.catalog.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Reset the active user to the demo profile
pub async fn handle_demo(app: &App, format: OutputFormat) -> Result<()> {
    let memory = seed_demo_user(&app.store, &app.user_id)?;

    match format {
        OutputFormat::Text => {
            println!("✓ Demo history loaded for {}", app.user_id);
            println!();
            println!("{}", memory.context());
        }
        OutputFormat::Json => {
            let output = json!({
                "status": "seeded",
                "user_id": app.user_id,
                "orders": memory.order_history().len(),
                "feedback": memory.recent_feedback().len(),
                "context": memory.context(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Store or remove the Gemini API key
pub async fn handle_key(action: KeyAction, format: OutputFormat) -> Result<()> {
    let manager = SecretManager::new(KEYRING_SERVICE);

    let status = match action {
        KeyAction::Set => {
            let key = rpassword::prompt_password_stderr("Gemini API key: ")
                .context("Failed to read API key")?;
            let key = key.trim();
            if key.is_empty() {
                bail!("API key cannot be empty");
            }
            manager.set_secret(GEMINI_API_KEY, key)?;
            "stored"
        }
        KeyAction::Clear => {
            manager.delete_secret(GEMINI_API_KEY)?;
            "cleared"
        }
    };

    match format {
        OutputFormat::Text => println!("✓ Gemini API key {} in the OS keychain.", status),
        OutputFormat::Json => println!("{}", json!({ "status": status })),
    }
    Ok(())
}

/// Check configuration, catalog, memory file and provider
pub async fn handle_doctor(app: &App, format: OutputFormat) -> Result<()> {
    let mut checks: Vec<(&str, String)> = Vec::new();
    let mut issues = Vec::new();

    // Config is validated when loaded
    checks.push(("Configuration", "Valid".to_string()));

    if app.config.core.data_dir.is_dir() {
        checks.push(("Data directory", "Exists".to_string()));
    } else {
        checks.push(("Data directory", "Missing".to_string()));
        issues.push(format!(
            "Data directory does not exist: {}",
            app.config.core.data_dir.display()
        ));
    }

    checks.push(("Catalog", format!("{} dishes", app.catalog.len())));

    match app.memory() {
        Ok(memory) => checks.push((
            "User memory",
            format!("{} orders", memory.order_history().len()),
        )),
        Err(e) => {
            checks.push(("User memory", "Unreadable".to_string()));
            issues.push(format!("{:#}", e));
        }
    }

    let manager = Arc::new(SecretManager::new(KEYRING_SERVICE).non_interactive());
    match provider_from_config(
        &app.config.llm,
        Arc::new(SecretCache::new(Arc::clone(&manager))),
    ) {
        Ok(provider) if provider.is_local() => {
            if provider.check_health().await {
                checks.push(("Ollama", "Reachable".to_string()));
            } else {
                checks.push(("Ollama", "Unreachable".to_string()));
                issues.push(format!(
                    "Cannot reach Ollama at {}",
                    app.config.llm.ollama.base_url
                ));
            }
        }
        Ok(_) => {
            if let Ok(key) = manager.get_secret(GEMINI_API_KEY) {
                let key = SecretString::new(key);
                checks.push(("Gemini API key", format!("Found ({})", key.masked())));
            } else {
                checks.push(("Gemini API key", "Missing".to_string()));
                issues.push(
                    "No Gemini API key. Set GEMINI_API_KEY or run 'forkcast key set'".to_string(),
                );
            }
        }
        Err(e) => {
            checks.push(("LLM provider", "Error".to_string()));
            issues.push(e.to_string());
        }
    }

    match format {
        OutputFormat::Text => {
            println!("Forkcast Diagnostics");
            println!("====================");
            println!();
            for (check, status) in &checks {
                println!("  {:<20} {}", format!("{}:", check), status);
            }
            println!();
            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({ "name": name, "status": status })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_dish_by_id_or_name() {
        let catalog = Catalog::seeded();
        assert_eq!(lookup_dish(&catalog, "D008", None).unwrap().name, "Chocolate Brownie");
        assert_eq!(
            lookup_dish(&catalog, "masala dosa", Some("South Spice"))
                .unwrap()
                .id,
            "D006"
        );
        assert!(matches!(
            lookup_dish(&catalog, "D008", Some("Punjab Grill")),
            Err(EngineError::DishNotFound(_))
        ));
        assert!(lookup_dish(&catalog, "Unicorn Cake", None).is_err());
    }

    #[test]
    fn test_app_load_seeds_catalog_and_validates_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default_config();
        config.core.data_dir = dir.path().to_path_buf();

        let app = App::load(config.clone(), Some("tester".to_string())).unwrap();
        assert_eq!(app.user_id, "tester");
        assert_eq!(app.catalog.len(), 20);
        assert!(dir.path().join("catalog.toml").exists());

        assert!(App::load(config, Some("../x".to_string())).is_err());
    }

    #[test]
    fn test_parse_rating_at_prompt() {
        assert_eq!(parse_rating(" 4.5 "), Some(4.5));
        assert_eq!(parse_rating("0"), Some(0.0));
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_rating("7"), None);
        assert_eq!(parse_rating("great"), None);
    }

    #[test]
    fn test_record_order_saves_order_and_feedback_together() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        let mut memory = store.open("pat").unwrap();

        record_order(&mut memory, "D008", "Chocolate Brownie", "Sweet Tooth", 150, 4.5, "")
            .unwrap();

        let reloaded = store.open("pat").unwrap();
        assert_eq!(reloaded.order_history().len(), 1);
        assert_eq!(reloaded.recent_feedback().len(), 1);
        assert_eq!(reloaded.recent_feedback()[0].rating, 4.5);
    }

    #[test]
    fn test_record_order_with_bad_rating_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        let mut memory = store.open("quinn").unwrap();

        let err = record_order(&mut memory, "D008", "Chocolate Brownie", "Sweet Tooth", 150, 5.5, "")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InvalidRating(_))
        ));
        assert!(memory.order_history().is_empty());
        assert!(!memory.path().exists());
    }
}
