//! Zava CLI - product search and connectivity checks.
//!
//! # Usage
//!
//! ```bash
//! # Search the catalog as the store manager (unrestricted)
//! zava-cli search --name paint
//!
//! # Search as a store-scoped identity, at most 5 rows
//! zava-cli search --name drill --max-rows 5 --user 2f6c9a1e-store-7
//!
//! # Verify the database is reachable
//! zava-cli check
//! ```
//!
//! # Commands
//!
//! - `search` - Search products by name or description, print the JSON envelope
//! - `check` - Open and close a single connection

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "zava-cli")]
#[command(author, version, about = "Zava product search tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search products by name or description
    Search {
        /// Text to look for in product names and descriptions
        #[arg(short, long)]
        name: String,

        /// Maximum number of rows (clamped to 1-100)
        #[arg(short, long, default_value_t = 20, allow_negative_numbers = true)]
        max_rows: i64,

        /// Row-level security identity (empty for store manager)
        #[arg(short, long, default_value = "")]
        user: String,
    },
    /// Check that the database is reachable
    Check,
}

#[tokio::main]
async fn main() {
    // Load .env before Sentry and tracing read their variables
    let _ = dotenvy::dotenv();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = telemetry::init_sentry();
    telemetry::init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Search {
            name,
            max_rows,
            user,
        } => commands::search::run(&name, max_rows, &user).await?,
        Commands::Check => commands::check::run().await?,
    }
    Ok(())
}
