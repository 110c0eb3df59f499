//! EZCENTIALS CLI - Local order and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the cached orders of the configured origin
//! ezc-cli orders list
//!
//! # Place an order, then confirm its payment as the confirmation page would
//! ezc-cli orders place ORD-1001
//! ezc-cli orders confirm ORD-1001
//!
//! # Apply pending decisions now instead of waiting for the storefront
//! ezc-cli orders sync
//!
//! # List a category in French
//! ezc-cli catalog list seren --lang fr
//! ```
//!
//! # Commands
//!
//! - `orders` - Inspect and drive the local order cache
//! - `catalog list` - Print a category listing
//!
//! Both operate on the storage directory, origin and catalog file configured
//! for the storefront (`STOREFRONT_*` environment variables).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use ezcentials_core::TerminalStatus;
use ezcentials_storefront::config::StorefrontConfig;

mod commands;

#[derive(Parser)]
#[command(name = "ezc-cli")]
#[command(author, version, about = "EZCENTIALS CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local order cache
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Browse the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List cached orders and pending status updates
    List,
    /// Place a new pending order
    Place {
        /// Order ID
        id: String,
    },
    /// Record a completed payment for an order
    Confirm {
        /// Order ID
        id: String,
    },
    /// Record a rejected payment for an order
    Reject {
        /// Order ID
        id: String,
    },
    /// Run one status reconciliation pass
    Sync,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products of a category (all products when omitted)
    List {
        /// Category slug
        category: Option<String>,

        /// Display language (`de`, `fr`, `en`)
        #[arg(short, long, default_value = "de")]
        lang: String,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;

    let lines = match cli.command {
        Commands::Orders { action } => {
            let storage = commands::orders::open_storage(&config)?;
            match action {
                OrdersAction::List => commands::orders::list(&storage)?,
                OrdersAction::Place { id } => commands::orders::place(&storage, &id)?,
                OrdersAction::Confirm { id } => {
                    commands::orders::decide(&storage, &id, TerminalStatus::Completed)?
                }
                OrdersAction::Reject { id } => {
                    commands::orders::decide(&storage, &id, TerminalStatus::Rejected)?
                }
                OrdersAction::Sync => commands::orders::sync(&storage)?,
            }
        }
        Commands::Catalog { action } => match action {
            CatalogAction::List { category, lang } => {
                commands::catalog::list(&config.catalog_path, category.as_deref(), &lang)?
            }
        },
    };

    for line in lines {
        println!("{line}");
    }
    Ok(())
}
