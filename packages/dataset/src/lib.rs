#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Immutable, process-wide snapshot of the flood impact dataset.
//!
//! [`DatasetSnapshot`] is built once at startup from the two static
//! artifacts written by the preprocessing tool (a records CSV and a
//! boundaries `GeoJSON`) and is then shared read-only, typically behind an
//! `Arc`, by every session and tab. It exposes no mutation API, so all
//! readers observe the same data for the lifetime of the process.

pub mod records;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flood_impact_geography::features::read_region_geometries;
use flood_impact_geography::{GeographyError, RegionGeometry};
use flood_impact_models::{ImpactRecord, RegionLevel, Variable, YearRange};
use thiserror::Error;

/// Boundaries at one level, keyed by region id.
pub type GeometryIndex = BTreeMap<String, RegionGeometry>;

/// Errors that make the dataset unusable. Fatal at startup.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// An artifact is missing or unreadable.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// A records row could not be parsed.
    #[error("Malformed record{}: {message}", .line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    Records {
        /// 1-based line of the offending row, when known.
        line: Option<u64>,
        /// Description of what went wrong.
        message: String,
    },

    /// A records row has a blank `region_id`.
    #[error("Record on line {line} has an empty region_id")]
    EmptyRegionId {
        /// 1-based line of the offending row.
        line: u64,
    },

    /// The boundaries document is malformed.
    #[error("Malformed geometries: {0}")]
    Geometries(#[from] GeographyError),

    /// A boundary references a region no record carries.
    #[error("Geometry references unknown {level} region '{region_id}'")]
    UnknownRegion {
        /// Level of the boundary.
        level: RegionLevel,
        /// Region id of the boundary.
        region_id: String,
    },

    /// Two boundaries share a level and region id.
    #[error("Duplicate geometry for {level} region '{region_id}'")]
    DuplicateGeometry {
        /// Level of the boundaries.
        level: RegionLevel,
        /// Shared region id.
        region_id: String,
    },
}

/// Locations of the two static artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    /// Records CSV.
    pub records: PathBuf,
    /// Boundaries `GeoJSON` `FeatureCollection`.
    pub geometries: PathBuf,
}

/// Read-only dataset snapshot.
#[derive(Debug)]
pub struct DatasetSnapshot {
    /// Records partitioned by level and variable, in artifact order.
    partitions: BTreeMap<(RegionLevel, Variable), Vec<ImpactRecord>>,
    geometries: BTreeMap<RegionLevel, GeometryIndex>,
    year_bounds: Option<YearRange>,
    record_count: usize,
}

impl DatasetSnapshot {
    /// Loads both artifacts from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if either artifact is missing or malformed,
    /// or if a geometry references a region no record carries.
    pub fn load(paths: &DatasetPaths) -> Result<Self, DataLoadError> {
        log::info!("Loading impact records from {}", paths.records.display());
        let records = open(&paths.records)?;

        log::info!("Loading region geometries from {}", paths.geometries.display());
        let geometries = open(&paths.geometries)?;

        Self::from_readers(records, geometries)
    }

    /// Builds a snapshot from in-memory artifact sources.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if either source is malformed or if a
    /// geometry references a region no record carries.
    pub fn from_readers(records: impl Read, geometries: impl Read) -> Result<Self, DataLoadError> {
        let records = records::read_records(records)?;
        let geometries = read_region_geometries(geometries)?;
        Self::from_parts(records, geometries)
    }

    /// Indexes already-parsed records and geometries.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError::UnknownRegion`] if a geometry has no
    /// matching record at its level, or
    /// [`DataLoadError::DuplicateGeometry`] if two geometries collide.
    pub fn from_parts(
        records: Vec<ImpactRecord>,
        geometries: Vec<RegionGeometry>,
    ) -> Result<Self, DataLoadError> {
        let record_count = records.len();
        let known: BTreeSet<(RegionLevel, &str)> = records
            .iter()
            .map(|r| (r.region_level, r.region_id.as_str()))
            .collect();

        let mut geometry_index: BTreeMap<RegionLevel, GeometryIndex> = RegionLevel::all()
            .iter()
            .map(|level| (*level, GeometryIndex::new()))
            .collect();

        for geometry in geometries {
            let level = geometry.region_level;
            if !known.contains(&(level, geometry.region_id.as_str())) {
                return Err(DataLoadError::UnknownRegion {
                    level,
                    region_id: geometry.region_id,
                });
            }

            let index = geometry_index.entry(level).or_default();
            if index.contains_key(&geometry.region_id) {
                return Err(DataLoadError::DuplicateGeometry {
                    level,
                    region_id: geometry.region_id,
                });
            }
            index.insert(geometry.region_id.clone(), geometry);
        }

        let year_bounds = records
            .iter()
            .map(|r| r.year)
            .fold(None, |bounds: Option<YearRange>, year| {
                Some(bounds.map_or_else(
                    || YearRange::new(year, year),
                    |b| YearRange::new(b.start.min(year), b.end.max(year)),
                ))
            });

        let mut partitions: BTreeMap<(RegionLevel, Variable), Vec<ImpactRecord>> = BTreeMap::new();
        for record in records {
            partitions
                .entry((record.region_level, record.variable))
                .or_default()
                .push(record);
        }

        log::info!(
            "Loaded {record_count} impact records ({} partitions) and {} region geometries",
            partitions.len(),
            geometry_index.values().map(BTreeMap::len).sum::<usize>()
        );

        Ok(Self {
            partitions,
            geometries: geometry_index,
            year_bounds,
            record_count,
        })
    }

    /// Iterates over every record.
    pub fn records(&self) -> impl Iterator<Item = &ImpactRecord> {
        self.partitions.values().flatten()
    }

    /// Records of one variable at one level, in artifact order.
    #[must_use]
    pub fn records_for(&self, level: RegionLevel, variable: Variable) -> &[ImpactRecord] {
        self.partitions
            .get(&(level, variable))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of records.
    #[must_use]
    pub const fn record_count(&self) -> usize {
        self.record_count
    }

    /// Boundaries at `level`, keyed by region id.
    #[must_use]
    pub fn geometries(&self, level: RegionLevel) -> &GeometryIndex {
        &self.geometries[&level]
    }

    /// Boundary of one region.
    #[must_use]
    pub fn geometry(&self, level: RegionLevel, region_id: &str) -> Option<&RegionGeometry> {
        self.geometries(level).get(region_id)
    }

    /// Number of regions with a boundary at `level`.
    #[must_use]
    pub fn region_count(&self, level: RegionLevel) -> usize {
        self.geometries(level).len()
    }

    /// Earliest and latest year present, or `None` for an empty dataset.
    #[must_use]
    pub const fn year_bounds(&self) -> Option<YearRange> {
        self.year_bounds
    }
}

fn open(path: &Path) -> Result<BufReader<File>, DataLoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}
