#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation query and result types.
//!
//! An [`AggregationQuery`] is a plain value object: two queries with the
//! same fields are the same query, which is what lets the cache key on it
//! directly. Queries arriving from selector controls come in as
//! [`QueryParams`] (raw strings) and are validated into a query, failing
//! with [`InvalidQueryError`] when a value is outside its enumeration.

use flood_impact_models::{GroupingMode, RegionLevel, Statistic, Variable, YearRange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rejected query or selector input. Recoverable: the caller keeps its
/// previous view and shows the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQueryError {
    /// The year range starts after it ends.
    #[error("Invalid year range: {start} is after {end}")]
    InvertedYearRange {
        /// Requested first year.
        start: i32,
        /// Requested last year.
        end: i32,
    },

    /// The variable is not one of the dataset's variables.
    #[error("Unknown variable '{value}'")]
    UnknownVariable {
        /// The rejected selector value.
        value: String,
    },

    /// The statistic is not one of mean, median, max, or sum.
    #[error("Unknown statistic '{value}'")]
    UnknownStatistic {
        /// The rejected selector value.
        value: String,
    },

    /// The region level is not country, admin1, or subregion.
    #[error("Unknown region level '{value}'")]
    UnknownRegionLevel {
        /// The rejected selector value.
        value: String,
    },

    /// The grouping mode is not `by_region` or `by_year`.
    #[error("Unknown grouping mode '{value}'")]
    UnknownMode {
        /// The rejected selector value.
        value: String,
    },

    /// A display option selector value is outside its enumeration.
    #[error("Unknown {control} '{value}'")]
    UnknownOption {
        /// Name of the control.
        control: &'static str,
        /// The rejected selector value.
        value: String,
    },

    /// The variable exists but the panel does not offer it.
    #[error("{variable} is not available in {panel}")]
    VariableNotOffered {
        /// The rejected variable.
        variable: Variable,
        /// Title of the panel that rejected it.
        panel: &'static str,
    },

    /// The panel has no such control.
    #[error("{panel} has no {control} control")]
    ControlNotOffered {
        /// Name of the control.
        control: &'static str,
        /// Title of the panel.
        panel: &'static str,
    },

    /// A numeric control value is outside its bounds.
    #[error("{control} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the control.
        control: &'static str,
        /// Rejected value.
        value: usize,
        /// Smallest allowed value.
        min: usize,
        /// Largest allowed value.
        max: usize,
    },

    /// A year lies outside the years the dataset covers.
    #[error("Years must be between {first} and {last}, got {start}-{end}")]
    YearOutOfRange {
        /// Requested first year.
        start: i32,
        /// Requested last year.
        end: i32,
        /// First year covered.
        first: i32,
        /// Last year covered.
        last: i32,
    },
}

/// A fully-specified aggregation over the impact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationQuery {
    /// Variable to aggregate.
    pub variable: Variable,
    /// Statistic applied within each group.
    pub statistic: Statistic,
    /// Inclusive year filter.
    pub year_range: YearRange,
    /// Level whose records are aggregated.
    pub region_level: RegionLevel,
    /// Whether groups are regions or years.
    pub mode: GroupingMode,
    /// Whether to aggregate the normalized form of the variable.
    pub normalize: bool,
}

impl AggregationQuery {
    /// Checks the query's internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQueryError::InvertedYearRange`] if the year range
    /// starts after it ends.
    pub const fn validate(&self) -> Result<(), InvalidQueryError> {
        if self.year_range.is_inverted() {
            return Err(InvalidQueryError::InvertedYearRange {
                start: self.year_range.start,
                end: self.year_range.end,
            });
        }
        Ok(())
    }

    /// Returns the query with `normalize` cleared when the variable has no
    /// normalized form, so equivalent queries share one cache entry.
    ///
    /// Flood count records carry one event each, so the count is always
    /// their sum whatever statistic was selected.
    #[must_use]
    pub const fn canonical(mut self) -> Self {
        self.normalize = self.uses_normalized_values();
        if matches!(self.variable, Variable::FloodCount) {
            self.statistic = Statistic::Sum;
        }
        self
    }

    /// Whether records will be read through their normalized value.
    #[must_use]
    pub const fn uses_normalized_values(&self) -> bool {
        self.normalize && self.variable.supports_normalization()
    }

    /// Unit of the aggregated values.
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        self.variable.unit(self.normalize)
    }
}

/// Raw query fields as delivered by selector controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Variable selector value (e.g. `"damage"`).
    pub variable: String,
    /// Statistic selector value (e.g. `"median"`).
    pub statistic: String,
    /// First year of the range slider.
    pub start_year: i32,
    /// Last year of the range slider.
    pub end_year: i32,
    /// Region level selector value (e.g. `"admin1"`).
    pub region_level: String,
    /// Grouping mode (`"by_region"` or `"by_year"`).
    pub mode: String,
    /// Normalization toggle.
    #[serde(default)]
    pub normalize: bool,
}

impl TryFrom<&QueryParams> for AggregationQuery {
    type Error = InvalidQueryError;

    fn try_from(params: &QueryParams) -> Result<Self, Self::Error> {
        let query = Self {
            variable: parse_variable(&params.variable)?,
            statistic: parse_statistic(&params.statistic)?,
            year_range: YearRange::new(params.start_year, params.end_year),
            region_level: parse_region_level(&params.region_level)?,
            mode: params
                .mode
                .trim()
                .parse()
                .map_err(|_| InvalidQueryError::UnknownMode {
                    value: params.mode.clone(),
                })?,
            normalize: params.normalize,
        };
        query.validate()?;
        Ok(query)
    }
}

/// Parses a variable selector value.
///
/// # Errors
///
/// Returns [`InvalidQueryError::UnknownVariable`] for values outside the
/// enumeration.
pub fn parse_variable(value: &str) -> Result<Variable, InvalidQueryError> {
    value
        .trim()
        .parse()
        .map_err(|_| InvalidQueryError::UnknownVariable {
            value: value.to_string(),
        })
}

/// Parses a statistic selector value.
///
/// # Errors
///
/// Returns [`InvalidQueryError::UnknownStatistic`] for values outside the
/// enumeration.
pub fn parse_statistic(value: &str) -> Result<Statistic, InvalidQueryError> {
    value
        .trim()
        .parse()
        .map_err(|_| InvalidQueryError::UnknownStatistic {
            value: value.to_string(),
        })
}

/// Parses a region level selector value.
///
/// # Errors
///
/// Returns [`InvalidQueryError::UnknownRegionLevel`] for values outside
/// the enumeration.
pub fn parse_region_level(value: &str) -> Result<RegionLevel, InvalidQueryError> {
    value
        .trim()
        .parse()
        .map_err(|_| InvalidQueryError::UnknownRegionLevel {
            value: value.to_string(),
        })
}

/// The key of one aggregation group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// A calendar year (trend views).
    Year(i32),
    /// A region id (map and ranking views).
    Region(String),
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Region(id) => write!(f, "{id}"),
        }
    }
}

/// An aggregated value, or the explicit absence of one.
///
/// `NoData` is distinct from a zero value: a group whose records are all
/// missing has no value, and must not be drawn as if it had zero impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatedValue {
    /// The statistic over at least one non-missing record.
    Value(f64),
    /// No non-missing record contributed.
    NoData,
}

impl AggregatedValue {
    /// The numeric value, if any.
    #[must_use]
    pub const fn as_f64(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoData => None,
        }
    }

    /// Whether this is the no-data marker.
    #[must_use]
    pub const fn is_no_data(self) -> bool {
        matches!(self, Self::NoData)
    }
}

/// One aggregated group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAggregate {
    /// Region id or year.
    pub key: GroupKey,
    /// Aggregated value.
    pub value: AggregatedValue,
    /// Non-missing records that contributed.
    pub record_count: u64,
    /// Missing records excluded from the statistic.
    pub missing_count: u64,
}

/// The outcome of one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// The (canonical) query that produced this result.
    pub query: AggregationQuery,
    /// Unit of every value in `groups`.
    pub unit: String,
    /// Groups in ascending key order.
    pub groups: Vec<GroupAggregate>,
    /// Non-missing records that contributed across all groups.
    pub record_count: u64,
    /// Missing records excluded across all groups.
    pub missing_count: u64,
}

impl AggregationResult {
    /// Looks up a group by key.
    #[must_use]
    pub fn group(&self, key: &GroupKey) -> Option<&GroupAggregate> {
        self.groups
            .binary_search_by(|g| g.key.cmp(key))
            .ok()
            .map(|i| &self.groups[i])
    }

    /// Aggregated value of a region, or `NoData` when the region had no
    /// matching records at all.
    #[must_use]
    pub fn region_value(&self, region_id: &str) -> AggregatedValue {
        self.group(&GroupKey::Region(region_id.to_string()))
            .map_or(AggregatedValue::NoData, |g| g.value)
    }

    /// Aggregated value of a year, or `NoData` when the year had no
    /// matching records at all.
    #[must_use]
    pub fn year_value(&self, year: i32) -> AggregatedValue {
        self.group(&GroupKey::Year(year))
            .map_or(AggregatedValue::NoData, |g| g.value)
    }

    /// Smallest and largest value across groups that have data.
    #[must_use]
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.groups
            .iter()
            .filter_map(|g| g.value.as_f64())
            .fold(None, |bounds, v| match bounds {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            })
    }

    /// Warnings for every group that rendered as no data, or a single
    /// view-wide warning when nothing matched the filters.
    #[must_use]
    pub fn empty_result_warnings(&self) -> Vec<EmptyResultWarning> {
        if self.groups.is_empty() {
            return vec![EmptyResultWarning { group: None }];
        }

        self.groups
            .iter()
            .filter(|g| g.value.is_no_data())
            .map(|g| EmptyResultWarning {
                group: Some(g.key.clone()),
            })
            .collect()
    }
}

/// Non-fatal notice that part (or all) of a view has no data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyResultWarning {
    /// The affected group, or `None` when the whole view is empty.
    pub group: Option<GroupKey>,
}

impl std::fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.group {
            Some(group) => write!(f, "No data available for {group}"),
            None => write!(f, "No data available for the selected filters"),
        }
    }
}
