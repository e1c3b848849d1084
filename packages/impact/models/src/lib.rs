#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood impact dataset vocabulary.
//!
//! Defines the measured variables, aggregation statistics, geographic
//! levels, and the [`ImpactRecord`] row type shared by every other crate
//! in the workspace. The enumerations double as the allowed value sets of
//! the dashboard's selector controls, so they parse from and print to the
//! same `snake_case` strings used in the records artifact.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// First year covered by the flood impact dataset.
pub const DATASET_FIRST_YEAR: i32 = 2000;

/// Last year covered by the flood impact dataset.
pub const DATASET_LAST_YEAR: i32 = 2024;

/// A measured flood-impact quantity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Variable {
    /// Economic damages adjusted to 2023 U.S. dollars.
    Damage,
    /// People injured, made homeless, or otherwise impacted.
    PopulationAffected,
    /// Inundated area derived from MODIS imagery.
    FloodedArea,
    /// Number of recorded floods.
    FloodCount,
    /// Average precipitation rate during floods.
    Precipitation,
    /// Average of the top 25% of precipitation rates during floods.
    ExtremePrecipitation,
}

impl Variable {
    /// Human-readable selector label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Damage => "Economic Damages",
            Self::PopulationAffected => "Population Affected",
            Self::FloodedArea => "Flooded Area",
            Self::FloodCount => "Flood Count",
            Self::Precipitation => "Avg Precipitation (Flood)",
            Self::ExtremePrecipitation => "Avg 75th Percentile Precipitation (Flood)",
        }
    }

    /// Long-form description shown beneath the variable selector.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Damage => "Total economic damages adjusted to 2023 U.S dollar equivalent.",
            Self::PopulationAffected => {
                "Number of people injured, made homeless, or otherwise impacted by the flood."
            }
            Self::FloodedArea => "Total inundated area derived from MODIS satellite imagery.",
            Self::FloodCount => "Number of recorded floods.",
            Self::Precipitation => "Average precipitation rate during floods.",
            Self::ExtremePrecipitation => {
                "Average of the top 25% of precipitation rates during floods. Indicates heavy rainfall."
            }
        }
    }

    /// Whether the dataset carries a normalized form of this variable.
    #[must_use]
    pub const fn supports_normalization(self) -> bool {
        matches!(
            self,
            Self::Damage | Self::PopulationAffected | Self::FloodedArea
        )
    }

    /// Whether summing this variable across regions is meaningful.
    ///
    /// Precipitation rates are averages and cannot be totalled.
    #[must_use]
    pub const fn is_additive(self) -> bool {
        !matches!(self, Self::Precipitation | Self::ExtremePrecipitation)
    }

    /// Unit of the raw or normalized value.
    ///
    /// `normalized` is ignored for variables without a normalized form.
    #[must_use]
    pub const fn unit(self, normalized: bool) -> &'static str {
        match (self, normalized && self.supports_normalization()) {
            (Self::Damage, false) => "US$ (2023)",
            (Self::Damage, true) => "% of GDP",
            (Self::PopulationAffected, false) => "people",
            (Self::PopulationAffected, true) => "% of total population",
            (Self::FloodedArea, false) => "km²",
            (Self::FloodedArea, true) => "% of total area",
            (Self::FloodCount, _) => "floods",
            (Self::Precipitation | Self::ExtremePrecipitation, _) => "mm/day",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Damage,
            Self::PopulationAffected,
            Self::FloodedArea,
            Self::FloodCount,
            Self::Precipitation,
            Self::ExtremePrecipitation,
        ]
    }
}

/// Aggregation function applied across the records of a group.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Statistic {
    /// Arithmetic mean.
    Mean,
    /// Median, averaging the two middle values for even counts.
    Median,
    /// Maximum value.
    Max,
    /// Arithmetic sum.
    Sum,
}

impl Statistic {
    /// Human-readable selector label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::Median => "Median",
            Self::Max => "Max",
            Self::Sum => "Sum",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Mean, Self::Median, Self::Max, Self::Sum]
    }
}

/// Granularity of geographic aggregation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegionLevel {
    /// Sovereign country (ISO alpha-3 codes).
    Country,
    /// First-level administrative unit (state/province, GAUL codes).
    #[serde(rename = "admin1")]
    #[strum(serialize = "admin1")]
    Admin1,
    /// UN M49 geographic subregion.
    Subregion,
}

impl RegionLevel {
    /// Human-readable selector label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::Admin1 => "Admin1 (States/Provinces)",
            Self::Subregion => "UN Subregion",
        }
    }

    /// Largest number of regions a ranking at this level may list.
    ///
    /// There are only about twenty UN subregions, so their rankings are
    /// capped lower.
    #[must_use]
    pub const fn max_ranked_regions(self) -> usize {
        match self {
            Self::Country | Self::Admin1 => 30,
            Self::Subregion => 15,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Country, Self::Admin1, Self::Subregion]
    }
}

/// Whether an aggregation buckets records by region or by year.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupingMode {
    /// One group per region (map and ranking views).
    ByRegion,
    /// One group per year (trend views).
    ByYear,
}

/// An inclusive range of years.
///
/// Construction does not validate ordering; an inverted range is rejected
/// when the query that carries it is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRange {
    /// First year included.
    pub start: i32,
    /// Last year included.
    pub end: i32,
}

impl YearRange {
    /// Creates a range from `start` to `end`, inclusive.
    #[must_use]
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// The full span of the dataset, 2000 through 2024.
    #[must_use]
    pub const fn full() -> Self {
        Self::new(DATASET_FIRST_YEAR, DATASET_LAST_YEAR)
    }

    /// Whether `start` is after `end`.
    #[must_use]
    pub const fn is_inverted(self) -> bool {
        self.start > self.end
    }

    /// Whether `year` lies within the range.
    #[must_use]
    pub const fn contains(self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::full()
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}

/// One measurement of one variable for one region in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactRecord {
    /// Region identifier at `region_level` (ISO code, GAUL code, or
    /// subregion name).
    pub region_id: String,
    /// Geographic level of `region_id`.
    pub region_level: RegionLevel,
    /// Calendar year of the flood.
    pub year: i32,
    /// Measured quantity.
    pub variable: Variable,
    /// Raw value. Meaningless when `is_missing` is set.
    pub value: f64,
    /// Normalized value, when the dataset carries one.
    pub normalized_value: Option<f64>,
    /// Whether the source had no value for this measurement.
    pub is_missing: bool,
}

impl ImpactRecord {
    /// Returns the value an aggregation should use, or `None` when the
    /// record must be counted as missing.
    ///
    /// With `normalize` set and a variable that supports normalization,
    /// the normalized value is used and its absence counts as missing.
    #[must_use]
    pub fn measured(&self, normalize: bool) -> Option<f64> {
        if self.is_missing {
            return None;
        }

        let value = if normalize && self.variable.supports_normalization() {
            self.normalized_value?
        } else {
            self.value
        };

        (!value.is_nan()).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: f64, normalized_value: Option<f64>, is_missing: bool) -> ImpactRecord {
        ImpactRecord {
            region_id: "USA".to_string(),
            region_level: RegionLevel::Country,
            year: 2010,
            variable: Variable::Damage,
            value,
            normalized_value,
            is_missing,
        }
    }

    #[test]
    fn selector_strings_parse() {
        assert_eq!("damage".parse::<Variable>().unwrap(), Variable::Damage);
        assert_eq!(
            "population_affected".parse::<Variable>().unwrap(),
            Variable::PopulationAffected
        );
        assert_eq!("median".parse::<Statistic>().unwrap(), Statistic::Median);
        assert_eq!("admin1".parse::<RegionLevel>().unwrap(), RegionLevel::Admin1);
        assert_eq!("by_year".parse::<GroupingMode>().unwrap(), GroupingMode::ByYear);
        assert!("stddev".parse::<Statistic>().is_err());
        assert!("rainfall".parse::<Variable>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for variable in Variable::all() {
            assert_eq!(variable.to_string().parse::<Variable>().unwrap(), *variable);
        }
        for level in RegionLevel::all() {
            assert_eq!(level.to_string().parse::<RegionLevel>().unwrap(), *level);
        }
        for statistic in Statistic::all() {
            assert_eq!(statistic.as_ref().parse::<Statistic>().unwrap(), *statistic);
        }
    }

    #[test]
    fn serde_uses_selector_strings() {
        assert_eq!(
            serde_json::to_string(&RegionLevel::Admin1).unwrap(),
            "\"admin1\""
        );
        assert_eq!(
            serde_json::to_string(&Variable::ExtremePrecipitation).unwrap(),
            "\"extreme_precipitation\""
        );
    }

    #[test]
    fn year_range_bounds_are_inclusive() {
        let range = YearRange::new(2005, 2010);
        assert!(range.contains(2005));
        assert!(range.contains(2010));
        assert!(!range.contains(2004));
        assert!(!range.contains(2011));
        assert!(!range.is_inverted());
        assert!(YearRange::new(2020, 2010).is_inverted());
        assert_eq!(YearRange::default(), YearRange::new(2000, 2024));
    }

    #[test]
    fn measured_excludes_missing() {
        assert_eq!(record(5.0, None, false).measured(false), Some(5.0));
        assert_eq!(record(5.0, None, true).measured(false), None);
        assert_eq!(record(f64::NAN, None, false).measured(false), None);
    }

    #[test]
    fn measured_uses_normalized_value_when_requested() {
        assert_eq!(record(5.0, Some(0.2), false).measured(true), Some(0.2));
        assert_eq!(record(5.0, None, false).measured(true), None);

        let mut precip = record(12.5, None, false);
        precip.variable = Variable::Precipitation;
        assert_eq!(precip.measured(true), Some(12.5));
    }

    #[test]
    fn only_rates_are_non_additive() {
        assert!(Variable::Damage.is_additive());
        assert!(Variable::FloodCount.is_additive());
        assert!(!Variable::Precipitation.is_additive());
        assert!(!Variable::ExtremePrecipitation.is_additive());
    }
}
