//! Rwaya CLI - Session table setup and order lookups.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table used by the storefront
//! rwaya-cli migrate sessions
//!
//! # Look up an order through the store API
//! rwaya-cli track TRK-2024-0042
//! ```
//!
//! # Commands
//!
//! - `migrate sessions` - Create the `tower_sessions` table
//! - `track` - Print an order's status and tracking timeline

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rwaya-cli")]
#[command(author, version, about = "Rwaya CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Look up an order by tracking ID
    Track {
        /// Tracking ID as printed on the order confirmation
        tracking_id: String,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the storefront session table
    Sessions,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Track { tracking_id } => commands::track::order(&tracking_id).await?,
    }
    Ok(())
}
