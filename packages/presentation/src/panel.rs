//! Serializable render output, one shape per kind of tab.

use std::collections::BTreeMap;

use flood_impact_analytics_models::AggregationResult;
use flood_impact_dataset::GeometryIndex;
use serde::Serialize;

use crate::color::ColorScale;
use crate::pages::StaticPage;
use crate::titles::{map_title, panel_title, trend_title};
use crate::{
    ChartPoint, MapFeatureStyle, RankedRegion, SortDirection, to_chart_series,
    to_map_layer_with_scale, top_regions,
};

/// Bar chart of one variable over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPanel {
    /// Chart title.
    pub title: String,
    /// Caption describing the variable.
    pub description: String,
    /// Unit of the bar heights.
    pub unit: String,
    /// Bars in ascending year order.
    pub points: Vec<ChartPoint>,
    /// Palette the renderer maps bar heights onto.
    pub palette: Vec<String>,
}

/// Choropleth of one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPanel {
    /// Map title.
    pub title: String,
    /// Caption describing the variable.
    pub description: String,
    /// Unit of the mapped values.
    pub unit: String,
    /// Palette in use.
    pub scale: ColorScale,
    /// Smallest and largest mapped value, when any region has data.
    pub value_range: Option<(f64, f64)>,
    /// Fill and tooltip for every region at the mapped level.
    pub features: BTreeMap<String, MapFeatureStyle>,
    /// Regions drawn with the no-data fill.
    pub no_data_count: usize,
}

/// Ranked bar chart of the highest (or lowest) regions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingPanel {
    /// Chart title.
    pub title: String,
    /// Caption describing the variable.
    pub description: String,
    /// Unit of the ranked values.
    pub unit: String,
    /// Palette the renderer maps bar lengths onto.
    pub palette: Vec<String>,
    /// Ranking order.
    pub direction: SortDirection,
    /// Ranked regions, best first.
    pub regions: Vec<RankedRegion>,
}

/// What a tab currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelView {
    /// Global annual trends.
    Trend(TrendPanel),
    /// Regional map.
    Map(MapPanel),
    /// Top regions.
    Ranking(RankingPanel),
    /// Methods or About text.
    Static(StaticPage),
}

impl PanelView {
    /// Panel heading.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Trend(panel) => &panel.title,
            Self::Map(panel) => &panel.title,
            Self::Ranking(panel) => &panel.title,
            Self::Static(page) => &page.title,
        }
    }
}

/// Builds the trend chart for a `by_year` result.
#[must_use]
pub fn trend_panel(result: &AggregationResult, scale: ColorScale) -> PanelView {
    let variable = result.query.variable;
    PanelView::Trend(TrendPanel {
        title: trend_title(variable),
        description: variable.description().to_string(),
        unit: result.unit.clone(),
        points: to_chart_series(result),
        palette: scale.hex_stops(),
    })
}

/// Builds the choropleth for a `by_region` result.
#[must_use]
pub fn map_panel(
    result: &AggregationResult,
    geometries: &GeometryIndex,
    scale: ColorScale,
) -> PanelView {
    let query = &result.query;
    let features = to_map_layer_with_scale(result, geometries, scale);
    let no_data_count = features.values().filter(|f| f.value.is_no_data()).count();

    PanelView::Map(MapPanel {
        title: map_title(
            query.variable,
            query.statistic,
            query.normalize,
            query.region_level,
        ),
        description: query.variable.description().to_string(),
        unit: result.unit.clone(),
        scale,
        value_range: result.value_bounds(),
        features,
        no_data_count,
    })
}

/// Builds the ranking chart for a `by_region` result.
#[must_use]
pub fn ranking_panel(
    result: &AggregationResult,
    geometries: &GeometryIndex,
    n: usize,
    direction: SortDirection,
    scale: ColorScale,
) -> PanelView {
    let query = &result.query;
    PanelView::Ranking(RankingPanel {
        title: panel_title(query.variable, query.statistic, query.normalize),
        description: query.variable.description().to_string(),
        unit: result.unit.clone(),
        palette: scale.hex_stops(),
        direction,
        regions: top_regions(result, geometries, n, direction),
    })
}
