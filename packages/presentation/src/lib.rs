#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turns aggregation results into chart- and map-ready structures.
//!
//! Nothing here draws. The output types are plain `serde`-serializable
//! values (series, rankings, per-region fills and tooltips) that any
//! renderer can consume. No-data groups are never given a palette color
//! and never ranked as if they were zero.

pub mod color;
pub mod pages;
pub mod panel;
pub mod titles;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use flood_impact_analytics_models::{
    AggregatedValue, AggregationResult, GroupAggregate, GroupKey,
};
use flood_impact_dataset::GeometryIndex;
use flood_impact_geography::RegionGeometry;
use flood_impact_models::GroupingMode;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use color::{ColorScale, NO_DATA_COLOR};
pub use panel::PanelView;
pub use titles::{format_value, panel_title};

/// Tooltip text for regions without data.
pub const NO_DATA_TOOLTIP: &str = "No data available";

/// Ranking order.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortDirection {
    /// Largest values first.
    #[default]
    Descending,
    /// Smallest values first.
    Ascending,
}

/// One point of a bar or line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Year or region id.
    pub key: GroupKey,
    /// Axis label.
    pub label: String,
    /// Bar height, or no data.
    pub value: AggregatedValue,
}

/// One row of a Top Regions ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRegion {
    /// 1-based position.
    pub rank: usize,
    /// Region id.
    pub region_id: String,
    /// Display name ("Name, Country" for admin-1 units).
    pub label: String,
    /// Aggregated value.
    pub value: f64,
}

/// Fill and tooltip of one map region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFeatureStyle {
    /// `#RRGGBB` fill.
    pub color: String,
    /// The value the fill encodes.
    pub value: AggregatedValue,
    /// Hover text.
    pub tooltip: String,
}

/// Orders a result's groups for charting.
///
/// `by_year` results come out in ascending year order. `by_region` results
/// are sorted by descending value with ties broken by ascending region id,
/// and regions without data go last.
#[must_use]
pub fn to_chart_series(result: &AggregationResult) -> Vec<ChartPoint> {
    let mut groups: Vec<&GroupAggregate> = result.groups.iter().collect();

    match result.query.mode {
        GroupingMode::ByYear => groups.sort_by(|a, b| a.key.cmp(&b.key)),
        GroupingMode::ByRegion => groups.sort_by(|a, b| {
            compare_values(a.value, b.value, SortDirection::Descending)
                .then_with(|| a.key.cmp(&b.key))
        }),
    }

    groups
        .into_iter()
        .map(|g| ChartPoint {
            key: g.key.clone(),
            label: g.key.to_string(),
            value: g.value,
        })
        .collect()
}

/// Ranks regions by value and keeps the first `n`.
///
/// Ties are broken by ascending region id whatever the direction, so the
/// ranking is stable across runs. Regions without data are left out.
#[must_use]
pub fn top_regions(
    result: &AggregationResult,
    geometries: &GeometryIndex,
    n: usize,
    direction: SortDirection,
) -> Vec<RankedRegion> {
    let mut ranked: Vec<(&str, f64)> = result
        .groups
        .iter()
        .filter_map(|g| match (&g.key, g.value) {
            (GroupKey::Region(id), AggregatedValue::Value(value)) => Some((id.as_str(), value)),
            _ => None,
        })
        .collect();

    ranked.sort_by(|(id_a, a), (id_b, b)| {
        compare_values(
            AggregatedValue::Value(*a),
            AggregatedValue::Value(*b),
            direction,
        )
        .then_with(|| id_a.cmp(id_b))
    });

    ranked
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (region_id, value))| RankedRegion {
            rank: i + 1,
            region_id: region_id.to_string(),
            label: geometries
                .get(region_id)
                .map_or_else(|| region_id.to_string(), RegionGeometry::label),
            value,
        })
        .collect()
}

/// Fills every region in `geometries` using the variable's default palette.
///
/// See [`to_map_layer_with_scale`].
#[must_use]
pub fn to_map_layer(
    result: &AggregationResult,
    geometries: &GeometryIndex,
) -> BTreeMap<String, MapFeatureStyle> {
    to_map_layer_with_scale(
        result,
        geometries,
        ColorScale::for_variable(result.query.variable),
    )
}

/// Fills every region in `geometries` from `scale`.
///
/// Values map linearly between the result's smallest and largest value.
/// Regions that are no-data in the result, or absent from it entirely, get
/// [`NO_DATA_COLOR`] and a no-data tooltip.
#[must_use]
pub fn to_map_layer_with_scale(
    result: &AggregationResult,
    geometries: &GeometryIndex,
    scale: ColorScale,
) -> BTreeMap<String, MapFeatureStyle> {
    let bounds = result.value_bounds();

    geometries
        .iter()
        .map(|(region_id, geometry)| {
            let value = result.region_value(region_id);
            let header = format!("{}\nCode: {region_id}", geometry.label());

            let style = match (value, bounds) {
                (AggregatedValue::Value(v), Some((lo, hi))) => MapFeatureStyle {
                    color: scale.color_for(v, lo, hi),
                    value,
                    tooltip: format!("{header}\nValue: {} {}", format_value(v), result.unit),
                },
                _ => MapFeatureStyle {
                    color: NO_DATA_COLOR.to_string(),
                    value: AggregatedValue::NoData,
                    tooltip: format!("{header}\n{NO_DATA_TOOLTIP}"),
                },
            };

            (region_id.clone(), style)
        })
        .collect()
}

/// Orders two values for display. No-data sorts after every value in
/// either direction.
fn compare_values(a: AggregatedValue, b: AggregatedValue, direction: SortDirection) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Descending => b.total_cmp(&a),
            SortDirection::Ascending => a.total_cmp(&b),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use flood_impact_analytics_models::AggregationQuery;
    use flood_impact_models::{RegionLevel, Statistic, Variable, YearRange};
    use geo::MultiPolygon;

    use super::*;

    fn result(mode: GroupingMode, groups: Vec<(GroupKey, AggregatedValue)>) -> AggregationResult {
        AggregationResult {
            query: AggregationQuery {
                variable: Variable::Damage,
                statistic: Statistic::Mean,
                year_range: YearRange::full(),
                region_level: RegionLevel::Country,
                mode,
                normalize: false,
            },
            unit: "US$ (2023)".to_string(),
            groups: groups
                .into_iter()
                .map(|(key, value)| GroupAggregate {
                    key,
                    value,
                    record_count: 1,
                    missing_count: 0,
                })
                .collect(),
            record_count: 0,
            missing_count: 0,
        }
    }

    fn region(id: &str, value: Option<f64>) -> (GroupKey, AggregatedValue) {
        (
            GroupKey::Region(id.to_string()),
            value.map_or(AggregatedValue::NoData, AggregatedValue::Value),
        )
    }

    fn geometries(ids: &[&str]) -> GeometryIndex {
        ids.iter()
            .map(|id| {
                (
                    (*id).to_string(),
                    RegionGeometry {
                        region_id: (*id).to_string(),
                        region_level: RegionLevel::Country,
                        polygon: MultiPolygon(vec![]),
                        display_name: format!("Region {id}"),
                        parent_name: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn ties_break_by_region_id() {
        let r = result(
            GroupingMode::ByRegion,
            vec![
                region("C", Some(3.0)),
                region("B", Some(5.0)),
                region("A", Some(5.0)),
            ],
        );
        let ids: Vec<String> = top_regions(&r, &geometries(&[]), 10, SortDirection::Descending)
            .into_iter()
            .map(|r| r.region_id)
            .collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn ranking_excludes_no_data_and_truncates() {
        let r = result(
            GroupingMode::ByRegion,
            vec![
                region("A", Some(1.0)),
                region("B", None),
                region("C", Some(9.0)),
                region("D", Some(4.0)),
            ],
        );
        let ranked = top_regions(&r, &geometries(&["C"]), 2, SortDirection::Descending);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].label, "Region C");
        assert_eq!(ranked[1].region_id, "D");
        assert_eq!(ranked[1].label, "D");

        let ascending = top_regions(&r, &geometries(&[]), 5, SortDirection::Ascending);
        let ids: Vec<&str> = ascending.iter().map(|r| r.region_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "D", "C"]);
    }

    #[test]
    fn region_series_puts_no_data_last() {
        let r = result(
            GroupingMode::ByRegion,
            vec![
                region("A", None),
                region("B", Some(2.0)),
                region("C", Some(7.0)),
            ],
        );
        let labels: Vec<String> = to_chart_series(&r).into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["C", "B", "A"]);
    }

    #[test]
    fn year_series_is_chronological() {
        let r = result(
            GroupingMode::ByYear,
            vec![
                (GroupKey::Year(2001), AggregatedValue::Value(9.0)),
                (GroupKey::Year(2002), AggregatedValue::NoData),
                (GroupKey::Year(2003), AggregatedValue::Value(1.0)),
            ],
        );
        let keys: Vec<GroupKey> = to_chart_series(&r).into_iter().map(|p| p.key).collect();
        assert_eq!(
            keys,
            vec![GroupKey::Year(2001), GroupKey::Year(2002), GroupKey::Year(2003)]
        );
    }

    #[test]
    fn no_data_regions_get_neutral_fill() {
        let r = result(
            GroupingMode::ByRegion,
            vec![region("A", Some(0.0)), region("B", None), region("C", Some(10.0))],
        );
        let layer = to_map_layer(&r, &geometries(&["A", "B", "C", "D"]));

        assert_eq!(layer.len(), 4);
        assert_eq!(layer["A"].color, "#E8F5E9");
        assert_eq!(layer["C"].color, "#1B5E20");
        assert_eq!(layer["B"].color, NO_DATA_COLOR);
        assert_eq!(layer["D"].color, NO_DATA_COLOR);
        assert!(layer["D"].tooltip.ends_with(NO_DATA_TOOLTIP));
        assert!(layer["C"].tooltip.contains("Value: 10.00 US$ (2023)"));
    }

    #[test]
    fn zero_is_data_not_no_data() {
        let r = result(GroupingMode::ByRegion, vec![region("A", Some(0.0))]);
        let layer = to_map_layer(&r, &geometries(&["A"]));
        assert_ne!(layer["A"].color, NO_DATA_COLOR);
        assert_eq!(layer["A"].value, AggregatedValue::Value(0.0));
    }

    #[test]
    fn panels_serialize_with_kind_tag() {
        let r = result(GroupingMode::ByYear, vec![]);
        let view = panel::trend_panel(&r, ColorScale::Greens);
        assert_eq!(view.title(), "Total Economic Damages by Year");
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "trend");
        assert_eq!(json["palette"][0], "#E8F5E9");
    }
}
