#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region boundary geometries for the flood impact map.
//!
//! Boundaries are exchanged as a single `GeoJSON` `FeatureCollection` in
//! which every feature carries its `region_id`, `region_level`, and display
//! names as properties. The interactive core only ever reads that artifact;
//! the offline preprocessing tool writes it after simplifying polygons with
//! [`simplify::simplify_multipolygon`].

pub mod features;
pub mod simplify;

use flood_impact_models::RegionLevel;
use geo::MultiPolygon;
use thiserror::Error;

/// Errors that can occur while reading or writing boundary geometries.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// The document is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Reading or writing the artifact failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document parsed but is not a `FeatureCollection`.
    #[error("Expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    /// A feature is missing a required property.
    #[error("Feature {index} is missing property '{property}'")]
    MissingProperty {
        /// Zero-based feature index.
        index: usize,
        /// Name of the absent property.
        property: &'static str,
    },

    /// A feature property holds a value that cannot be interpreted.
    #[error("Feature {index} has invalid '{property}': {message}")]
    InvalidProperty {
        /// Zero-based feature index.
        index: usize,
        /// Name of the offending property.
        property: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// A feature has no geometry, or one that is not a (multi)polygon.
    #[error("Feature {index} does not carry a Polygon or MultiPolygon geometry")]
    UnsupportedGeometry {
        /// Zero-based feature index.
        index: usize,
    },
}

/// A simplified region boundary joined to the impact records by
/// `(region_level, region_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    /// Region identifier at `region_level`.
    pub region_id: String,
    /// Geographic level of this boundary.
    pub region_level: RegionLevel,
    /// Simplified boundary polygons.
    pub polygon: MultiPolygon<f64>,
    /// Human-readable region name.
    pub display_name: String,
    /// Enclosing country name, for admin-1 units.
    pub parent_name: Option<String>,
}

impl RegionGeometry {
    /// Returns the label used in rankings and tooltips.
    ///
    /// Admin-1 names are ambiguous on their own ("Punjab", "Georgia"), so
    /// they are qualified with their country when one is known.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.region_level, &self.parent_name) {
            (RegionLevel::Admin1, Some(parent)) => format!("{}, {parent}", self.display_name),
            _ => self.display_name.clone(),
        }
    }
}
