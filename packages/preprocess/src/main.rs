#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI tool that builds the dashboard's static artifacts from the raw
//! flood event data and boundary sources.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flood_impact_geography::simplify::DEFAULT_TOLERANCE_DEGREES;
use flood_impact_preprocess::BuildPaths;

#[derive(Parser)]
#[command(name = "flood_impact_preprocess", about = "Flood impact preprocessing tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build `records.csv` and `geometries.geojson`
    Build {
        /// Event-level flood CSV
        #[arg(long)]
        events: PathBuf,
        /// GAUL admin-1 boundaries (`GeoJSON`, keyed by `ADM1_CODE`)
        #[arg(long)]
        admin1: PathBuf,
        /// Natural Earth country boundaries (`GeoJSON`, keyed by `ISO_A3`)
        #[arg(long)]
        countries: PathBuf,
        /// UN M49 country classification CSV
        #[arg(long)]
        m49: PathBuf,
        /// Output directory
        #[arg(long, default_value = "data/preprocessed")]
        out_dir: PathBuf,
        /// Simplification tolerance in degrees
        #[arg(long, default_value_t = DEFAULT_TOLERANCE_DEGREES)]
        tolerance: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            events,
            admin1,
            countries,
            m49,
            out_dir,
            tolerance,
        } => {
            let paths = BuildPaths {
                events,
                admin1,
                countries,
                m49,
                out_dir,
            };
            let artifacts = flood_impact_preprocess::run(&paths, tolerance)?;
            log::info!(
                "Wrote {} records and {} geometries to {}",
                artifacts.records.len(),
                artifacts.geometries.len(),
                paths.out_dir.display()
            );
        }
    }

    Ok(())
}
