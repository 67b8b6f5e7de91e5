mod domain;
mod error;
mod estimator;
mod export;
mod program;
mod progression;
mod seeder;
mod server;
mod store;
mod submission;
mod units;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Mutex;

use crate::domain::LiftKey;
use crate::program::SeedPolicy;
use crate::server::AppState;
use crate::store::Store;

/// Self-hosted tracker for a fixed 12-week strength program.
#[derive(Parser, Debug)]
#[command(name = "liftplan")]
#[command(about = "12-week program tracker with double progression and PR detection")]
#[command(version)]
struct Args {
    /// Path to the SQLite database file.
    /// Can also be set via LIFTPLAN_DB environment variable.
    #[arg(long, value_name = "DB", env = "LIFTPLAN_DB", default_value = "liftplan.sqlite")]
    db: PathBuf,

    /// Port number for the web server.
    /// Can also be set via LIFTPLAN_PORT environment variable.
    #[arg(long, value_name = "PORT", env = "LIFTPLAN_PORT", default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    // Open (and if needed create) the database
    println!("Opening database: {}", args.db.display());
    let store = Store::open(&args.db)
        .with_context(|| format!("Failed to open database at {}", args.db.display()))?;

    // Print a short summary of what is on record
    let units = store.units()?;
    let maxes = store.maxes()?;
    let logged = store.all_rows()?.len();
    let tested = LiftKey::all()
        .iter()
        .filter(|l| maxes.get(**l).is_some_and(|v| v > 0.0))
        .count();

    println!();
    println!("=== Program State ===");
    println!();
    println!("Display units: {}", units);
    println!("Tested maxes on record: {} of {}", tested, LiftKey::all().len());
    println!("Logged rows: {}", logged);
    println!();

    // Build application state
    let state = Arc::new(AppState {
        store: Mutex::new(store),
        seed_policy: SeedPolicy::default(),
    });

    // Start server
    server::run_server(state, args.port).await?;

    Ok(())
}
