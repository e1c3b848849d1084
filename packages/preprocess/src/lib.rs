#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offline preprocessing for the flood impact dashboard.
//!
//! Turns the raw event-level flood CSV and the boundary sources (GAUL
//! admin-1 units, Natural Earth countries, UN M49 subregion membership)
//! into the two static artifacts the dashboard loads at startup:
//! `records.csv` and `geometries.geojson`. Output is a pure function of
//! the inputs, so rerunning the tool on the same files reproduces the
//! same artifacts byte for byte.

pub mod boundaries;
pub mod events;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flood_impact_geography::features::write_region_geometries;
use flood_impact_geography::{GeographyError, RegionGeometry};
use flood_impact_models::{ImpactRecord, RegionLevel, Variable};
use serde::Serialize;
use thiserror::Error;

use crate::boundaries::PolygonIndex;
use crate::events::FloodEvents;

/// File name of the records artifact.
pub const RECORDS_FILE_NAME: &str = "records.csv";

/// File name of the geometries artifact.
pub const GEOMETRIES_FILE_NAME: &str = "geometries.geojson";

/// Errors that can occur during preprocessing.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// Reading an input or writing an artifact failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An input file could not be opened.
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        /// Path of the input.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// A boundary source is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A boundary source is not a `FeatureCollection`.
    #[error("Boundary source is not a FeatureCollection")]
    NotFeatureCollection,

    /// An events row could not be parsed.
    #[error("Malformed event{}: {message}", .line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    Events {
        /// 1-based line of the offending row, when known.
        line: Option<u64>,
        /// Description of what went wrong.
        message: String,
    },

    /// A month-year value does not end in a four-digit year.
    #[error("Invalid mon-yr '{value}'")]
    InvalidMonthYear {
        /// Rejected value.
        value: String,
    },

    /// An M49 row could not be parsed.
    #[error("Malformed M49 row{}: {message}", .line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    M49 {
        /// 1-based line of the offending row, when known.
        line: Option<u64>,
        /// Description of what went wrong.
        message: String,
    },

    /// Writing the records artifact failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the geometries artifact failed.
    #[error("Geography error: {0}")]
    Geography(#[from] GeographyError),

    /// The simplification tolerance is negative or not a number.
    #[error("Invalid simplification tolerance {0}")]
    InvalidTolerance(f64),
}

/// Locations of the raw inputs and the output directory.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    /// Event-level flood CSV.
    pub events: PathBuf,
    /// GAUL admin-1 boundaries `GeoJSON`.
    pub admin1: PathBuf,
    /// Natural Earth country boundaries `GeoJSON`.
    pub countries: PathBuf,
    /// UN M49 country classification CSV.
    pub m49: PathBuf,
    /// Directory the artifacts are written to.
    pub out_dir: PathBuf,
}

/// The two dashboard artifacts, in memory.
#[derive(Debug, Clone)]
pub struct Artifacts {
    /// Long-format records in input order.
    pub records: Vec<ImpactRecord>,
    /// Simplified boundaries of every region a record references, ordered
    /// by level then region id.
    pub geometries: Vec<RegionGeometry>,
}

#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    region_id: &'a str,
    region_level: RegionLevel,
    year: i32,
    variable: Variable,
    value: Option<f64>,
    normalized_value: Option<f64>,
    is_missing: bool,
}

impl<'a> From<&'a ImpactRecord> for RecordRow<'a> {
    fn from(record: &'a ImpactRecord) -> Self {
        Self {
            region_id: &record.region_id,
            region_level: record.region_level,
            year: record.year,
            variable: record.variable,
            value: (!record.is_missing).then_some(record.value),
            normalized_value: record.normalized_value,
            is_missing: record.is_missing,
        }
    }
}

impl Artifacts {
    /// Writes the records CSV to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError`] if serialization or writing fails.
    pub fn write_records(&self, writer: impl Write) -> Result<(), PreprocessError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &self.records {
            csv_writer.serialize(RecordRow::from(record))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the geometries `GeoJSON` to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError`] if writing fails.
    pub fn write_geometries(&self, writer: impl Write) -> Result<(), PreprocessError> {
        write_region_geometries(&self.geometries, writer)?;
        Ok(())
    }
}

/// Pairs every referenced region with its boundary.
///
/// Boundaries no record references are dropped. Regions without a
/// boundary keep their records and are reported in the log.
#[must_use]
pub fn assemble_geometries(
    events: &FloodEvents,
    admin1: &PolygonIndex,
    countries: &PolygonIndex,
    subregions: &PolygonIndex,
) -> Vec<RegionGeometry> {
    let mut unmatched = 0_usize;

    let geometries: Vec<RegionGeometry> = events
        .names
        .iter()
        .filter_map(|((level, region_id), name)| {
            let polygons = match level {
                RegionLevel::Admin1 => admin1,
                RegionLevel::Country => countries,
                RegionLevel::Subregion => subregions,
            };
            let Some(polygon) = polygons.get(region_id) else {
                log::debug!("No boundary for {level} region '{region_id}'");
                unmatched += 1;
                return None;
            };
            Some(RegionGeometry {
                region_id: region_id.clone(),
                region_level: *level,
                polygon: polygon.clone(),
                display_name: name.display_name.clone(),
                parent_name: name.parent_name.clone(),
            })
        })
        .collect();

    if unmatched > 0 {
        log::warn!("{unmatched} regions with records have no boundary and will not be drawn");
    }

    geometries
}

/// Runs the whole pipeline over in-memory inputs.
///
/// # Errors
///
/// Returns [`PreprocessError`] if the tolerance is invalid or any input
/// is malformed.
pub fn build(
    events: impl std::io::Read,
    admin1: impl std::io::Read,
    countries: impl std::io::Read,
    m49: impl std::io::Read,
    tolerance: f64,
) -> Result<Artifacts, PreprocessError> {
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(PreprocessError::InvalidTolerance(tolerance));
    }

    let events = events::read_events(events)?;

    log::info!("Simplifying admin-1 boundaries (tolerance {tolerance})...");
    let admin1 = boundaries::read_admin1_boundaries(admin1, tolerance)?;
    log::info!("Simplifying country boundaries (tolerance {tolerance})...");
    let countries = boundaries::read_country_boundaries(countries, tolerance)?;
    let members = boundaries::read_subregion_members(m49)?;
    let subregions = boundaries::subregion_boundaries(&members, &countries);

    let geometries = assemble_geometries(&events, &admin1, &countries, &subregions);
    log::info!(
        "Built {} records and {} region geometries",
        events.records.len(),
        geometries.len()
    );

    Ok(Artifacts {
        records: events.records,
        geometries,
    })
}

fn open(path: &Path) -> Result<BufReader<File>, PreprocessError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| PreprocessError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads the inputs named by `paths` and writes both artifacts into
/// `paths.out_dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`PreprocessError`] if any input cannot be read or parsed, or
/// the artifacts cannot be written.
pub fn run(paths: &BuildPaths, tolerance: f64) -> Result<Artifacts, PreprocessError> {
    let artifacts = build(
        open(&paths.events)?,
        open(&paths.admin1)?,
        open(&paths.countries)?,
        open(&paths.m49)?,
        tolerance,
    )?;

    std::fs::create_dir_all(&paths.out_dir)?;

    let records_path = paths.out_dir.join(RECORDS_FILE_NAME);
    log::info!("Writing {}", records_path.display());
    artifacts.write_records(BufWriter::new(File::create(&records_path)?))?;

    let geometries_path = paths.out_dir.join(GEOMETRIES_FILE_NAME);
    log::info!("Writing {}", geometries_path.display());
    artifacts.write_geometries(BufWriter::new(File::create(&geometries_path)?))?;

    Ok(artifacts)
}
