#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-tab view state.
//!
//! Each tab owns one [`TabViewState`]. A state changes only through
//! [`TabViewState::apply`] with input from its own tab, and an input either
//! applies completely or is rejected with the previous settings intact.
//! No field is shared between tab states, so nothing one tab does can
//! invalidate what another tab shows.

pub mod tab;

use std::sync::Arc;

use flood_impact_analytics_models::{
    AggregationQuery, AggregationResult, InvalidQueryError, parse_region_level, parse_statistic,
    parse_variable,
};
use flood_impact_models::{DATASET_FIRST_YEAR, DATASET_LAST_YEAR, RegionLevel, YearRange};
use flood_impact_presentation::{ColorScale, PanelView, SortDirection};
use serde::{Deserialize, Serialize};

pub use tab::{DEFAULT_TOP_N, MIN_TOP_N, Tab};

/// A selector change, carrying the raw value the control produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "control", content = "value", rename_all = "snake_case")]
pub enum TabInput {
    /// Variable selector (e.g. `"flooded_area"`).
    SelectVariable(String),
    /// Statistic selector (e.g. `"median"`).
    SelectStatistic(String),
    /// Year range slider.
    SetYearRange {
        /// First year.
        start: i32,
        /// Last year.
        end: i32,
    },
    /// Region level selector (e.g. `"subregion"`).
    SelectRegionLevel(String),
    /// Normalization toggle.
    SetNormalize(bool),
    /// Number of ranked regions.
    SetTopN(usize),
    /// Ranking order (`"descending"` or `"ascending"`).
    SelectSortDirection(String),
    /// Palette override, or `None` for the variable's default.
    SelectColorScale(Option<String>),
}

impl TabInput {
    /// Name of the control that produced this input.
    #[must_use]
    pub const fn control(&self) -> &'static str {
        match self {
            Self::SelectVariable(_) => "variable",
            Self::SelectStatistic(_) => "statistic",
            Self::SetYearRange { .. } => "year range",
            Self::SelectRegionLevel(_) => "region level",
            Self::SetNormalize(_) => "normalize",
            Self::SetTopN(_) => "top N",
            Self::SelectSortDirection(_) => "sort direction",
            Self::SelectColorScale(_) => "color scale",
        }
    }
}

/// Display options that do not affect the aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayOptions {
    /// Palette override. `None` uses the variable's palette.
    pub color_scale: Option<ColorScale>,
    /// Ranking order.
    pub sort_direction: SortDirection,
    /// Number of ranked regions.
    pub top_n: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            color_scale: None,
            sort_direction: SortDirection::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Everything a tab's controls determine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSettings {
    /// Current aggregation, or `None` for static tabs.
    pub query: Option<AggregationQuery>,
    /// Current display options.
    pub display: DisplayOptions,
}

impl TabSettings {
    /// Palette in effect for the current variable.
    #[must_use]
    pub fn color_scale(&self) -> ColorScale {
        self.display.color_scale.unwrap_or_else(|| {
            self.query.map_or(ColorScale::Blues, |q| {
                ColorScale::for_variable(q.variable)
            })
        })
    }
}

/// A tab's last successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    /// The result the panel was built from, if the tab aggregates.
    pub result: Option<Arc<AggregationResult>>,
    /// What the tab shows.
    pub panel: PanelView,
}

/// State of one tab.
#[derive(Debug, Clone)]
pub struct TabViewState {
    tab: Tab,
    settings: TabSettings,
    last_rendered: Option<RenderedView>,
    last_error: Option<String>,
}

impl TabViewState {
    /// Creates a tab in its default state, not yet rendered.
    #[must_use]
    pub fn new(tab: Tab) -> Self {
        Self {
            tab,
            settings: TabSettings {
                query: tab.default_query(),
                display: DisplayOptions::default(),
            },
            last_rendered: None,
            last_error: None,
        }
    }

    /// Which tab this is.
    #[must_use]
    pub const fn tab(&self) -> Tab {
        self.tab
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &TabSettings {
        &self.settings
    }

    /// Current aggregation, or `None` for static tabs.
    #[must_use]
    pub const fn query(&self) -> Option<AggregationQuery> {
        self.settings.query
    }

    /// Last successful render.
    #[must_use]
    pub const fn last_rendered(&self) -> Option<&RenderedView> {
        self.last_rendered.as_ref()
    }

    /// Message of the most recent rejected input, cleared by the next
    /// successful render.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Applies one input.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQueryError`] if the tab does not offer the control,
    /// or the value is outside the control's allowed set. The settings are
    /// left untouched and the message is kept as [`Self::last_error`].
    pub fn apply(&mut self, input: &TabInput) -> Result<(), InvalidQueryError> {
        match next_settings(self.tab, self.settings, input) {
            Ok(settings) => {
                log::debug!("{} accepted {} input", self.tab.label(), input.control());
                self.settings = settings;
                Ok(())
            }
            Err(e) => {
                self.reject(&e);
                Err(e)
            }
        }
    }

    /// Restores `previous` settings after an input that applied but could
    /// not be rendered.
    pub fn roll_back(&mut self, previous: TabSettings, error: &InvalidQueryError) {
        self.settings = previous;
        self.reject(error);
    }

    /// Stores a successful render and clears the last error.
    pub fn record_render(&mut self, rendered: RenderedView) -> &RenderedView {
        self.last_error = None;
        &*self.last_rendered.insert(rendered)
    }

    /// Returns the last render, producing the first one with `render` if
    /// the tab has never been shown.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `render`.
    pub fn rendered_or_else(
        &mut self,
        render: impl FnOnce(Tab, &TabSettings) -> Result<RenderedView, InvalidQueryError>,
    ) -> Result<&RenderedView, InvalidQueryError> {
        match &mut self.last_rendered {
            Some(rendered) => Ok(&*rendered),
            slot => {
                let rendered = render(self.tab, &self.settings)?;
                self.last_error = None;
                Ok(&*slot.insert(rendered))
            }
        }
    }

    fn reject(&mut self, error: &InvalidQueryError) {
        log::warn!("{} rejected input: {error}", self.tab.label());
        self.last_error = Some(error.to_string());
    }
}

fn not_offered(tab: Tab, input: &TabInput) -> InvalidQueryError {
    InvalidQueryError::ControlNotOffered {
        control: input.control(),
        panel: tab.label(),
    }
}

fn next_settings(
    tab: Tab,
    mut settings: TabSettings,
    input: &TabInput,
) -> Result<TabSettings, InvalidQueryError> {
    let Some(query) = settings.query.as_mut() else {
        return Err(not_offered(tab, input));
    };
    let ranks = tab == Tab::TopRegions;
    let fixed_view = tab == Tab::Trends;

    match input {
        TabInput::SelectVariable(value) => {
            let variable = parse_variable(value)?;
            if !tab.offers_variable(variable) {
                return Err(InvalidQueryError::VariableNotOffered {
                    variable,
                    panel: tab.label(),
                });
            }
            query.variable = variable;
        }
        TabInput::SelectStatistic(value) => {
            if fixed_view {
                return Err(not_offered(tab, input));
            }
            query.statistic = parse_statistic(value)?;
        }
        TabInput::SetYearRange { start, end } => {
            let year_range = YearRange::new(*start, *end);
            if year_range.is_inverted() {
                return Err(InvalidQueryError::InvertedYearRange {
                    start: *start,
                    end: *end,
                });
            }
            if !(YearRange::full().contains(*start) && YearRange::full().contains(*end)) {
                return Err(InvalidQueryError::YearOutOfRange {
                    start: *start,
                    end: *end,
                    first: DATASET_FIRST_YEAR,
                    last: DATASET_LAST_YEAR,
                });
            }
            query.year_range = year_range;
        }
        TabInput::SelectRegionLevel(value) => {
            if fixed_view {
                return Err(not_offered(tab, input));
            }
            let level = parse_region_level(value)?;
            query.region_level = level;
            settings.display.top_n = settings.display.top_n.min(level.max_ranked_regions());
        }
        TabInput::SetNormalize(normalize) => {
            if fixed_view {
                return Err(not_offered(tab, input));
            }
            query.normalize = *normalize;
        }
        TabInput::SetTopN(n) => {
            if !ranks {
                return Err(not_offered(tab, input));
            }
            settings.display.top_n = checked_top_n(*n, query.region_level)?;
        }
        TabInput::SelectSortDirection(value) => {
            if !ranks {
                return Err(not_offered(tab, input));
            }
            settings.display.sort_direction =
                value
                    .trim()
                    .parse()
                    .map_err(|_| InvalidQueryError::UnknownOption {
                        control: input.control(),
                        value: value.clone(),
                    })?;
        }
        TabInput::SelectColorScale(value) => {
            settings.display.color_scale = value
                .as_deref()
                .map(|v| {
                    v.trim()
                        .parse::<ColorScale>()
                        .map_err(|_| InvalidQueryError::UnknownOption {
                            control: input.control(),
                            value: v.to_string(),
                        })
                })
                .transpose()?;
        }
    }

    Ok(settings)
}

fn checked_top_n(n: usize, level: RegionLevel) -> Result<usize, InvalidQueryError> {
    let max = level.max_ranked_regions();
    if (MIN_TOP_N..=max).contains(&n) {
        Ok(n)
    } else {
        Err(InvalidQueryError::OutOfRange {
            control: "top N",
            value: n,
            min: MIN_TOP_N,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use flood_impact_models::{Statistic, Variable};

    use super::*;

    #[test]
    fn applies_valid_input() {
        let mut state = TabViewState::new(Tab::Map);
        state
            .apply(&TabInput::SelectStatistic("median".to_string()))
            .unwrap();
        state
            .apply(&TabInput::SetYearRange {
                start: 2005,
                end: 2010,
            })
            .unwrap();

        let query = state.query().unwrap();
        assert_eq!(query.statistic, Statistic::Median);
        assert_eq!(query.year_range, YearRange::new(2005, 2010));
        assert!(state.last_error().is_none());
    }

    #[test]
    fn rejected_input_leaves_settings_untouched() {
        let mut state = TabViewState::new(Tab::Map);
        let before = *state.settings();

        let err = state
            .apply(&TabInput::SelectStatistic("stddev".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            InvalidQueryError::UnknownStatistic {
                value: "stddev".to_string()
            }
        );
        assert_eq!(*state.settings(), before);
        assert_eq!(state.last_error(), Some("Unknown statistic 'stddev'"));

        assert!(
            state
                .apply(&TabInput::SetYearRange {
                    start: 2020,
                    end: 2010
                })
                .is_err()
        );
        assert_eq!(*state.settings(), before);
    }

    #[test]
    fn years_outside_the_dataset_are_rejected() {
        let mut state = TabViewState::new(Tab::Trends);
        let before = *state.settings();

        for (start, end) in [(1800, 2010), (2010, 3000), (1999, 2025)] {
            let err = state.apply(&TabInput::SetYearRange { start, end }).unwrap_err();
            assert!(matches!(err, InvalidQueryError::YearOutOfRange { .. }));
        }
        assert_eq!(*state.settings(), before);
        assert_eq!(
            state.last_error(),
            Some("Years must be between 2000 and 2024, got 1999-2025")
        );

        state
            .apply(&TabInput::SetYearRange {
                start: 2000,
                end: 2024,
            })
            .unwrap();
    }

    #[test]
    fn static_tabs_reject_everything() {
        let mut state = TabViewState::new(Tab::About);
        let err = state
            .apply(&TabInput::SetYearRange {
                start: 2000,
                end: 2001,
            })
            .unwrap_err();
        assert!(matches!(err, InvalidQueryError::ControlNotOffered { .. }));
        assert!(state.query().is_none());
    }

    #[test]
    fn trends_lock_statistic_level_and_normalization() {
        let mut state = TabViewState::new(Tab::Trends);
        for input in [
            TabInput::SelectStatistic("mean".to_string()),
            TabInput::SelectRegionLevel("admin1".to_string()),
            TabInput::SetNormalize(true),
            TabInput::SetTopN(10),
        ] {
            assert!(matches!(
                state.apply(&input),
                Err(InvalidQueryError::ControlNotOffered { .. })
            ));
        }

        let err = state
            .apply(&TabInput::SelectVariable("precipitation".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            InvalidQueryError::VariableNotOffered {
                variable: Variable::Precipitation,
                ..
            }
        ));

        state
            .apply(&TabInput::SelectVariable("flood_count".to_string()))
            .unwrap();
        assert_eq!(state.query().unwrap().variable, Variable::FloodCount);
    }

    #[test]
    fn top_n_is_bounded_by_level() {
        let mut state = TabViewState::new(Tab::TopRegions);
        state.apply(&TabInput::SetTopN(30)).unwrap();
        assert_eq!(state.settings().display.top_n, 30);

        assert!(matches!(
            state.apply(&TabInput::SetTopN(4)),
            Err(InvalidQueryError::OutOfRange { min: 5, max: 30, .. })
        ));

        state
            .apply(&TabInput::SelectRegionLevel("subregion".to_string()))
            .unwrap();
        assert_eq!(state.settings().display.top_n, 15);

        assert!(matches!(
            state.apply(&TabInput::SetTopN(20)),
            Err(InvalidQueryError::OutOfRange { max: 15, .. })
        ));
    }

    #[test]
    fn display_options() {
        let mut state = TabViewState::new(Tab::TopRegions);
        assert_eq!(state.settings().color_scale(), ColorScale::Greens);

        state
            .apply(&TabInput::SelectColorScale(Some("reds".to_string())))
            .unwrap();
        state
            .apply(&TabInput::SelectSortDirection("ascending".to_string()))
            .unwrap();
        assert_eq!(state.settings().color_scale(), ColorScale::Reds);
        assert_eq!(
            state.settings().display.sort_direction,
            SortDirection::Ascending
        );

        state.apply(&TabInput::SelectColorScale(None)).unwrap();
        assert_eq!(state.settings().color_scale(), ColorScale::Greens);

        assert!(matches!(
            state.apply(&TabInput::SelectColorScale(Some("rainbow".to_string()))),
            Err(InvalidQueryError::UnknownOption { .. })
        ));
    }

    #[test]
    fn map_rejects_ranking_controls() {
        let mut state = TabViewState::new(Tab::Map);
        assert!(state.apply(&TabInput::SetTopN(10)).is_err());
        assert!(
            state
                .apply(&TabInput::SelectSortDirection("ascending".to_string()))
                .is_err()
        );
    }

    #[test]
    fn states_are_independent() {
        let mut map = TabViewState::new(Tab::Map);
        let ranking = TabViewState::new(Tab::TopRegions);
        let before = *ranking.settings();

        map.apply(&TabInput::SelectStatistic("max".to_string()))
            .unwrap();

        assert_eq!(*ranking.settings(), before);
        assert_eq!(map.query().unwrap().statistic, Statistic::Max);
    }
}
