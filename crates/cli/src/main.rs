//! FuelEU CLI - Main entry point

use clap::{Parser, Subcommand};
use fueleu_cli::{commands, AppContext};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fueleu")]
#[command(about = "FuelEU - compliance balance, banking and pooling ledger", long_about = None)]
struct Cli {
    /// SQLite database path
    #[arg(long, default_value = "./data/fueleu.db")]
    db: PathBuf,

    /// Engine configuration (JSON)
    #[arg(long, default_value = "./fueleu.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the target intensity for a year (overrides the schedule)
    Target {
        year: i32,
        /// gCO2e/MJ
        intensity: Decimal,
    },

    /// Record fuel consumption for a ship-year
    Record {
        /// Ship ID (will be uppercased)
        ship: String,
        year: i32,
        /// Fuel code (HFO, MGO, LNG, ... or a custom code)
        fuel: String,
        /// Tonnes consumed
        quantity: Decimal,
        /// Well-to-wake emission factor, gCO2e/MJ
        emission_factor: Decimal,
        /// Lower calorific value in MJ/t (required for custom fuels)
        #[arg(long)]
        lcv: Option<Decimal>,
        /// Renewable fuel
        #[arg(long)]
        renewable: bool,
    },

    /// Compute the compliance snapshot for a ship-year
    Snapshot { ship: String, year: i32 },

    /// Bank surplus of a year
    Bank {
        ship: String,
        year: i32,
        amount: Decimal,
    },

    /// Borrow an advance against next year's surplus
    Borrow {
        ship: String,
        year: i32,
        amount: Decimal,
        /// Expected surplus of the following year
        #[arg(long)]
        expected_surplus: Decimal,
    },

    /// Repay earlier advances from a surplus year
    Repay { ship: String, year: i32 },

    /// Resolve the Adjusted CB for a ship-year
    Resolve {
        ship: String,
        year: i32,
        /// Compute without drawing from the bank
        #[arg(long)]
        preview: bool,
    },

    /// Form a pool for a year
    Pool {
        year: i32,
        /// Member ship IDs
        #[arg(required = true, num_args = 2..)]
        ships: Vec<String>,
    },

    /// List a ship's banking entries
    Entries {
        ship: String,
        /// Report advances overdue as of this year
        #[arg(long)]
        as_of: Option<i32>,
    },

    /// Audit the journal (verify hash chain)
    Audit,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli.db, &cli.config)?;

    match cli.command {
        Commands::Target { year, intensity } => {
            commands::target(&ctx, year, intensity)?;
        }

        Commands::Record {
            ship,
            year,
            fuel,
            quantity,
            emission_factor,
            lcv,
            renewable,
        } => {
            commands::record(&ctx, &ship, year, &fuel, quantity, emission_factor, lcv, renewable)?;
        }

        Commands::Snapshot { ship, year } => {
            commands::snapshot(&ctx, &ship, year)?;
        }

        Commands::Bank { ship, year, amount } => {
            commands::bank(&ctx, &ship, year, amount)?;
        }

        Commands::Borrow {
            ship,
            year,
            amount,
            expected_surplus,
        } => {
            commands::borrow(&ctx, &ship, year, amount, expected_surplus)?;
        }

        Commands::Repay { ship, year } => {
            commands::repay(&ctx, &ship, year)?;
        }

        Commands::Resolve {
            ship,
            year,
            preview,
        } => {
            commands::resolve(&ctx, &ship, year, preview)?;
        }

        Commands::Pool { year, ships } => {
            commands::pool(&ctx, year, &ships)?;
        }

        Commands::Entries { ship, as_of } => {
            commands::entries(&ctx, &ship, as_of)?;
        }

        Commands::Audit => {
            commands::audit(&ctx)?;
        }
    }

    Ok(())
}
