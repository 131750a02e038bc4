//! RoadLink CLI
//!
//! Drives a proximity session against simulated drivers and exposes the
//! distance helpers used by the engine.

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::{geo, run};

/// Nearby-driver proximity engine
#[derive(Parser)]
#[command(name = "roadlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a drive with nearby drivers
    Run(run::RunArgs),

    /// Great-circle distance between two points
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Point at a distance and bearing from an origin
    Offset {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        /// Distance in meters
        meters: f64,
        /// Bearing in degrees clockwise from north
        #[arg(allow_negative_numbers = true)]
        bearing_deg: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Path to a configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run::run(args),
        Commands::Distance { lat1, lng1, lat2, lng2, json } => {
            geo::distance(lat1, lng1, lat2, lng2, json)
        }
        Commands::Offset { lat, lng, meters, bearing_deg, json } => {
            geo::offset(lat, lng, meters, bearing_deg, json)
        }
        Commands::Config { config } => run::show_config(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
