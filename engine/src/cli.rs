//! CLI interface for Forkcast
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Forkcast food recommendation assistant
///
/// Recommends dishes from a local catalog, personalized with your order
/// history and feedback.
#[derive(Parser, Debug)]
#[command(name = "forkcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Act as this user instead of the configured one
    #[arg(long, global = true, value_name = "USER_ID")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask for recommendations once
    Ask {
        /// What you are in the mood for
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Start an interactive session
    Chat,

    /// Record an order with its rating
    Order {
        /// Dish id (e.g. D008) or dish name
        dish: String,

        /// Restaurant, to tell apart dishes with the same name
        #[arg(short, long)]
        restaurant: Option<String>,

        /// Rating from 0 to 5
        #[arg(long)]
        rating: f64,

        /// Free-text comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Show order history and feedback
    History {
        /// Number of orders to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the memory context sent to the models
    Profile,

    /// Show or update preferences
    Prefs {
        /// Preferences to set, as key=value
        #[arg(value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Browse the dish catalog
    Catalog {
        /// Filter expression, e.g. 'price < 200 AND dietary == "Vegetarian"'
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Reset the current user to the demo profile
    Demo,

    /// Manage the Gemini API key in the OS keychain
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Run system diagnostics
    Doctor,
}

/// API key actions
#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Prompt for the key and store it
    Set,

    /// Remove the stored key
    Clear,
}

/// Split `key=value` into its parts, trimming both
pub fn parse_preference(input: &str) -> Option<(String, String)> {
    let (key, value) = input.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_joins_words() {
        let cli = Cli::parse_from(["forkcast", "--json", "ask", "veg", "desserts"]);
        assert!(cli.json);
        match cli.command {
            Command::Ask { query } => assert_eq!(query.join(" "), "veg desserts"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_order_flags() {
        let cli = Cli::parse_from([
            "forkcast", "--user", "alice", "order", "D008", "--rating", "4.5", "--comment",
            "Rich",
        ]);
        assert_eq!(cli.user.as_deref(), Some("alice"));
        match cli.command {
            Command::Order {
                dish,
                rating,
                comment,
                ..
            } => {
                assert_eq!(dish, "D008");
                assert_eq!(rating, 4.5);
                assert_eq!(comment.as_deref(), Some("Rich"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_order_requires_rating() {
        assert!(Cli::try_parse_from(["forkcast", "order", "D008"]).is_err());
        assert!(Cli::try_parse_from(["forkcast", "order", "D008", "--comment", "nice"]).is_err());
        assert!(Cli::try_parse_from(["forkcast", "order", "D008", "--rating", "4"]).is_ok());
    }

    #[test]
    fn test_parse_preference() {
        assert_eq!(
            parse_preference("budget_range = ₹150-400"),
            Some(("budget_range".to_string(), "₹150-400".to_string()))
        );
        assert_eq!(
            parse_preference("note=a=b"),
            Some(("note".to_string(), "a=b".to_string()))
        );
        assert_eq!(parse_preference("novalue"), None);
        assert_eq!(parse_preference("=x"), None);
    }
}
