// Forkcast food recommendation assistant
// Main entry point for the forkcast binary

use clap::Parser;
use forkcast_engine::cli::{Cli, Command};
use forkcast_engine::config::Config;
use forkcast_engine::handlers::{
    handle_ask, handle_catalog, handle_chat, handle_demo, handle_doctor, handle_history,
    handle_key, handle_order, handle_prefs, handle_profile, App, OutputFormat,
};
use forkcast_engine::telemetry::init_telemetry_with_level;
use forkcast_sdk::errors::{EngineError, ForkcastErrorExt};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        if let Some(engine_error) = e.downcast_ref::<EngineError>() {
            eprintln!("Hint: {}", engine_error.user_hint());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the configured level; RUST_LOG wins over both
    let level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(level, config.core.log_format);

    tracing::info!("Forkcast v{}", env!("CARGO_PKG_VERSION"));

    // Only the key command runs without the catalog and a user
    let user = cli.user;
    let load_app = move || -> anyhow::Result<App> {
        let app = App::load(config, user)?;
        tracing::debug!("Active user: {}", app.user_id);
        Ok(app)
    };

    match cli.command {
        Command::Key { action } => handle_key(action, format).await,
        Command::Ask { query } => handle_ask(&load_app()?, &query.join(" "), format).await,
        Command::Chat => handle_chat(&load_app()?, format).await,
        Command::Order {
            dish,
            restaurant,
            rating,
            comment,
        } => {
            handle_order(
                &load_app()?,
                &dish,
                restaurant.as_deref(),
                rating,
                comment.as_deref(),
                format,
            )
            .await
        }
        Command::History { limit } => handle_history(&load_app()?, limit, format).await,
        Command::Profile => handle_profile(&load_app()?, format).await,
        Command::Prefs { set } => handle_prefs(&load_app()?, &set, format).await,
        Command::Catalog { filter } => {
            handle_catalog(&load_app()?, filter.as_deref(), format).await
        }
        Command::Demo => handle_demo(&load_app()?, format).await,
        Command::Doctor => handle_doctor(&load_app()?, format).await,
    }
}
