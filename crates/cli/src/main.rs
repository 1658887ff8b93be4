//! Pressly CLI - Database migrations, seeding and quick lookups.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pressly migrate
//!
//! # Load producers from YAML, replacing what is there
//! pressly seed producers data/producers.yaml --clear
//!
//! # Level, features and progress for an order count
//! pressly level 7
//!
//! # Distance between two points
//! pressly distance 41.8781 -87.6298 41.9230 -87.6397 --unit mi
//!
//! # Rank producers from a YAML file around a point
//! pressly nearby data/producers.yaml --lat 41.8781 --lng -87.6298 --radius-km 25
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed producers` - Validate and upsert producers
//! - `level` - Print level summary
//! - `distance` - Print a formatted distance
//! - `nearby` - Print producers within a radius, nearest first

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pressly_core::geo::DistanceUnit;

mod commands;

#[derive(Parser)]
#[command(name = "pressly")]
#[command(author, version, about = "Pressly CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load records from YAML files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Show level, unlocked features and progress for an order count
    Level {
        /// Completed orders (negative counts as zero)
        #[arg(allow_negative_numbers = true)]
        order_count: i64,
    },
    /// Great-circle distance between two points
    #[command(allow_negative_numbers = true)]
    Distance {
        lat1: f64,
        lng1: f64,
        lat2: f64,
        lng2: f64,
        /// Unit for the result (`km` or `mi`)
        #[arg(short, long, default_value = "km")]
        unit: DistanceUnit,
    },
    /// Rank producers from a YAML file by distance from a point
    #[command(allow_negative_numbers = true)]
    Nearby {
        /// YAML file with a `producers` list
        file: PathBuf,
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        #[arg(long, default_value_t = 10.0)]
        radius_km: f64,
        /// Unit for reported distances (`km` or `mi`)
        #[arg(short, long, default_value = "km")]
        unit: DistanceUnit,
        /// Show at most this many producers
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert producers from a YAML file
    Producers {
        /// YAML file with a `producers` list
        file: PathBuf,

        /// Delete all existing producers first
        #[arg(long)]
        clear: bool,
    },
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Producers { file, clear } => {
                commands::seed::producers(&file, clear).await?;
            }
        },
        Commands::Level { order_count } => commands::lookup::level(order_count),
        Commands::Distance {
            lat1,
            lng1,
            lat2,
            lng2,
            unit,
        } => commands::lookup::distance_between((lat1, lng1), (lat2, lng2), unit)?,
        Commands::Nearby {
            file,
            lat,
            lng,
            radius_km,
            unit,
            limit,
        } => {
            let query = commands::lookup::NearbyQuery {
                lat,
                lng,
                radius_km,
                unit,
                limit,
            };
            commands::lookup::nearby(&file, &query).await?;
        }
    }
    Ok(())
}
