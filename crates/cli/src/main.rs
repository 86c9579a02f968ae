//! Rallypoint CLI - exercises the client data-access layer.
//!
//! # Usage
//!
//! ```bash
//! # Create an account
//! rp-cli account sign-up -e member@example.com -p <password> -n "Robin"
//!
//! # Browse clubs
//! rp-cli clubs list
//! rp-cli clubs list --joined
//! rp-cli clubs create -t "Trail Runners" --private
//!
//! # Events
//! rp-cli events list -c <club-id>
//! rp-cli events watch -c <club-id>   # live feed, falls back to polling
//!
//! # Store
//! rp-cli store items -c <club-id>
//! rp-cli store orders -c <club-id>
//!
//! # Local cart
//! rp-cli cart show
//! rp-cli cart clear
//! ```
//!
//! # Environment Variables
//!
//! Backend configuration comes from the `RALLYPOINT_*` variables (see the
//! client crate). Commands that need a session additionally read
//! `RALLYPOINT_EMAIL` and `RALLYPOINT_PASSWORD` unless `-e`/`-p` are
//! given.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rp-cli")]
#[command(author, version, about = "Rallypoint CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
    /// Browse and manage clubs
    Clubs {
        #[command(subcommand)]
        action: commands::clubs::ClubsAction,
    },
    /// Browse and watch events
    Events {
        #[command(subcommand)]
        action: commands::events::EventsAction,
    },
    /// Club store items and orders
    Store {
        #[command(subcommand)]
        action: commands::shop::StoreAction,
    },
    /// Local shopping cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing; RUST_LOG overrides the default
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rallypoint_client=info,rallypoint_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = rallypoint_client::Config::from_env()?;
    let client = rallypoint_client::Client::new(config);

    match cli.command {
        Commands::Account { action } => commands::account::run(&client, action).await?,
        Commands::Clubs { action } => commands::clubs::run(&client, action).await?,
        Commands::Events { action } => commands::events::run(&client, action).await?,
        Commands::Store { action } => commands::shop::run(&client, action).await?,
        Commands::Cart { action } => commands::cart::run(&client, action).await?,
    }
    Ok(())
}
