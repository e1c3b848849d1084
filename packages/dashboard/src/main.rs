#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads the flood impact dataset and prints rendered panels as JSON.
//!
//! Useful for checking preprocessed artifacts and for feeding a front end
//! that renders panels from files.

use std::path::PathBuf;

use clap::Parser;
use flood_impact_dashboard::{Dashboard, DashboardConfig, init_logger};
use flood_impact_view::{Tab, TabInput};

#[derive(Parser)]
#[command(name = "flood_impact_dashboard", about = "Flood impact dashboard core")]
struct Cli {
    /// TOML config file. Without one, defaults and environment overrides
    /// are used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render only this tab (`trends`, `map`, `top_regions`, `methods`,
    /// `about`).
    #[arg(long)]
    tab: Option<Tab>,

    /// Inputs to apply to the selected tab before rendering, as JSON
    /// objects such as `{"control":"select_statistic","value":"median"}`.
    #[arg(long = "input", requires = "tab")]
    inputs: Vec<String>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::from_env()?,
    };

    let dashboard = Dashboard::start(&config)?;
    let mut session = dashboard.open_session();

    let tabs: Vec<Tab> = cli.tab.map_or_else(|| Tab::all().to_vec(), |tab| vec![tab]);

    if let Some(tab) = cli.tab {
        for raw in &cli.inputs {
            let input: TabInput = serde_json::from_str(raw)?;
            session.handle(tab, &input)?;
        }
    }

    for tab in tabs {
        let panel = session.panel(tab)?;
        let json = if cli.pretty {
            serde_json::to_string_pretty(panel)?
        } else {
            serde_json::to_string(panel)?
        };
        println!("{json}");
    }

    log::info!("Query cache: {:?}", dashboard.cache_stats());

    Ok(())
}
