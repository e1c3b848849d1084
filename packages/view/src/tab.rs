//! The five dashboard tabs and their defaults.

use flood_impact_analytics_models::AggregationQuery;
use flood_impact_models::{GroupingMode, RegionLevel, Statistic, Variable, YearRange};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Smallest number of regions a ranking may list.
pub const MIN_TOP_N: usize = 5;

/// Ranking length when a session opens.
pub const DEFAULT_TOP_N: usize = 15;

/// A dashboard tab.
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
pub enum Tab {
    /// Global annual totals over time.
    Trends,
    /// Regional choropleth.
    Map,
    /// Ranked regions.
    TopRegions,
    /// How the dataset was built.
    Methods,
    /// Project background.
    About,
}

impl Tab {
    /// Tab heading.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Trends => "Global Annual Trends",
            Self::Map => "Map View",
            Self::TopRegions => "Top Regions",
            Self::Methods => "Methods",
            Self::About => "About",
        }
    }

    /// Whether the tab is text only and accepts no input.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Methods | Self::About)
    }

    /// Whether the tab's variable selector lists `variable`.
    ///
    /// Annual totals only make sense for additive variables.
    #[must_use]
    pub const fn offers_variable(self, variable: Variable) -> bool {
        match self {
            Self::Trends => variable.is_additive(),
            Self::Map | Self::TopRegions => true,
            Self::Methods | Self::About => false,
        }
    }

    /// Variables listed by the tab's selector, in display order.
    #[must_use]
    pub fn offered_variables(self) -> Vec<Variable> {
        Variable::all()
            .iter()
            .copied()
            .filter(|v| self.offers_variable(*v))
            .collect()
    }

    /// Query a freshly opened tab renders, or `None` for static tabs.
    #[must_use]
    pub const fn default_query(self) -> Option<AggregationQuery> {
        let (statistic, region_level, mode, normalize) = match self {
            Self::Trends => (
                Statistic::Sum,
                RegionLevel::Country,
                GroupingMode::ByYear,
                false,
            ),
            Self::Map => (
                Statistic::Mean,
                RegionLevel::Country,
                GroupingMode::ByRegion,
                true,
            ),
            Self::TopRegions => (
                Statistic::Mean,
                RegionLevel::Admin1,
                GroupingMode::ByRegion,
                true,
            ),
            Self::Methods | Self::About => return None,
        };

        Some(AggregationQuery {
            variable: Variable::Damage,
            statistic,
            year_range: YearRange::full(),
            region_level,
            mode,
            normalize,
        })
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Trends,
            Self::Map,
            Self::TopRegions,
            Self::Methods,
            Self::About,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trends_defaults() {
        let query = Tab::Trends.default_query().unwrap();
        assert_eq!(query.statistic, Statistic::Sum);
        assert_eq!(query.mode, GroupingMode::ByYear);
        assert!(!query.normalize);
    }

    #[test]
    fn top_regions_defaults_to_admin1_mean() {
        let query = Tab::TopRegions.default_query().unwrap();
        assert_eq!(query.region_level, RegionLevel::Admin1);
        assert_eq!(query.statistic, Statistic::Mean);
        assert!(query.normalize);
    }

    #[test]
    fn static_tabs_have_no_query() {
        assert!(Tab::Methods.default_query().is_none());
        assert!(Tab::About.default_query().is_none());
        assert!(Tab::About.offered_variables().is_empty());
    }

    #[test]
    fn trends_offer_only_additive_variables() {
        assert_eq!(
            Tab::Trends.offered_variables(),
            vec![
                Variable::Damage,
                Variable::PopulationAffected,
                Variable::FloodedArea,
                Variable::FloodCount,
            ]
        );
        assert_eq!(Tab::Map.offered_variables().len(), Variable::all().len());
    }

    #[test]
    fn parses_tab_names() {
        assert_eq!("top_regions".parse::<Tab>().unwrap(), Tab::TopRegions);
        assert_eq!(Tab::Trends.to_string(), "trends");
    }
}
