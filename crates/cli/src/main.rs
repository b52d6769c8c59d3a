//! Katale CLI - Delivery zone and checkout pricing tools.
//!
//! # Usage
//!
//! ```bash
//! # List delivery zones served by the marketplace API
//! katale zones list
//!
//! # Quote a subtotal for a district
//! katale quote --district Kampala --subtotal 50000
//!
//! # Quote a cart file without contacting the API
//! katale quote --district Gulu --cart cart.yaml --offline
//! ```
//!
//! # Commands
//!
//! - `zones list` - Show delivery zones, their districts and costs
//! - `quote` - Compute subtotal, shipping, tax and total

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::quote::QuoteInput;

#[derive(Parser)]
#[command(name = "katale")]
#[command(author, version, about = "Katale marketplace CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect delivery zones
    Zones {
        #[command(subcommand)]
        action: ZonesAction,
    },
    /// Price an order for a district
    Quote {
        /// District to deliver to (case-sensitive)
        #[arg(short, long)]
        district: String,

        /// Order subtotal in shillings, e.g. 50000 or "UGX 50,000"
        #[arg(short, long, conflicts_with = "cart", required_unless_present = "cart")]
        subtotal: Option<String>,

        /// YAML or JSON file with a list of cart items
        #[arg(short, long)]
        cart: Option<PathBuf>,

        /// Skip the zone fetch and use the fallback shipping cost
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand)]
enum ZonesAction {
    /// List all delivery zones
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Zones { action } => match action {
            ZonesAction::List => commands::zones::list().await?,
        },
        Commands::Quote {
            district,
            subtotal,
            cart,
            offline,
        } => {
            let input = match (&subtotal, &cart) {
                (_, Some(path)) => QuoteInput::CartFile(path),
                (Some(raw), None) => QuoteInput::Subtotal(raw),
                // clap requires one of the two
                (None, None) => QuoteInput::Subtotal(""),
            };
            commands::quote::run(&district, input, offline).await?;
        }
    }
    Ok(())
}
