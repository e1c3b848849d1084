#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood impact dashboard core.
//!
//! A [`Dashboard`] owns the two process-wide pieces: the immutable
//! [`DatasetSnapshot`] and the shared [`QueryCache`]. Each user gets a
//! [`Session`] holding five independent tab states. Handling an input runs
//! View State, then the (cached) aggregation, then the presentation
//! adapter, and stores the resulting panel on the tab that asked for it.

pub mod config;

use std::sync::Arc;

use flood_impact_analytics::{CacheStats, InvalidQueryError, QueryCache, aggregate};
use flood_impact_dataset::{DataLoadError, DatasetSnapshot};
use flood_impact_models::GroupingMode;
use flood_impact_presentation::pages::{about_page, methods_page};
use flood_impact_presentation::panel::{map_panel, ranking_panel, trend_panel};
use flood_impact_presentation::PanelView;
use flood_impact_view::{RenderedView, Tab, TabInput, TabSettings, TabViewState};
use thiserror::Error;

pub use config::{ConfigError, DashboardConfig};

/// Errors that stop the dashboard from starting.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The dataset could not be loaded.
    #[error(transparent)]
    Data(#[from] DataLoadError),
}

/// Initializes `pretty_env_logger` from `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger() {
    pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .try_init()
        .ok();
}

/// Process-wide dashboard state, shared by every session.
#[derive(Debug, Clone)]
pub struct Dashboard {
    snapshot: Arc<DatasetSnapshot>,
    cache: Arc<QueryCache>,
}

impl Dashboard {
    /// Loads the dataset named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] if the configuration is invalid or either
    /// artifact fails to load. Both are fatal.
    pub fn start(config: &DashboardConfig) -> Result<Self, DashboardError> {
        config.validate()?;
        let snapshot = DatasetSnapshot::load(&config.dataset_paths())?;
        log::info!(
            "Dashboard ready: {} records, query cache capacity {}",
            snapshot.record_count(),
            config.cache_capacity
        );
        Ok(Self::from_snapshot(snapshot, config.cache_capacity))
    }

    /// Wraps an already-loaded snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: DatasetSnapshot, cache_capacity: usize) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            cache: Arc::new(QueryCache::new(cache_capacity)),
        }
    }

    /// Opens a session with every tab in its default state.
    #[must_use]
    pub fn open_session(&self) -> Session {
        Session {
            snapshot: Arc::clone(&self.snapshot),
            cache: Arc::clone(&self.cache),
            trends: TabViewState::new(Tab::Trends),
            map: TabViewState::new(Tab::Map),
            top_regions: TabViewState::new(Tab::TopRegions),
            methods: TabViewState::new(Tab::Methods),
            about: TabViewState::new(Tab::About),
        }
    }

    /// The loaded dataset.
    #[must_use]
    pub fn snapshot(&self) -> &DatasetSnapshot {
        &self.snapshot
    }

    /// Query cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// One user's five tabs.
#[derive(Debug)]
pub struct Session {
    snapshot: Arc<DatasetSnapshot>,
    cache: Arc<QueryCache>,
    trends: TabViewState,
    map: TabViewState,
    top_regions: TabViewState,
    methods: TabViewState,
    about: TabViewState,
}

impl Session {
    /// State of one tab.
    #[must_use]
    pub const fn state(&self, tab: Tab) -> &TabViewState {
        match tab {
            Tab::Trends => &self.trends,
            Tab::Map => &self.map,
            Tab::TopRegions => &self.top_regions,
            Tab::Methods => &self.methods,
            Tab::About => &self.about,
        }
    }

    const fn state_mut(&mut self, tab: Tab) -> &mut TabViewState {
        match tab {
            Tab::Trends => &mut self.trends,
            Tab::Map => &mut self.map,
            Tab::TopRegions => &mut self.top_regions,
            Tab::Methods => &mut self.methods,
            Tab::About => &mut self.about,
        }
    }

    /// Applies `input` to `tab` and re-renders it.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQueryError`] if the tab rejects the input. The tab
    /// keeps its previous settings and panel, and no other tab is touched.
    pub fn handle(&mut self, tab: Tab, input: &TabInput) -> Result<&PanelView, InvalidQueryError> {
        let snapshot = Arc::clone(&self.snapshot);
        let cache = Arc::clone(&self.cache);
        let state = self.state_mut(tab);

        let previous = *state.settings();
        state.apply(input)?;

        match render(tab, state.settings(), &snapshot, &cache) {
            Ok(rendered) => Ok(&state.record_render(rendered).panel),
            Err(e) => {
                state.roll_back(previous, &e);
                Err(e)
            }
        }
    }

    /// The tab's current panel, rendering it on first access.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQueryError`] if the tab's first render fails.
    pub fn panel(&mut self, tab: Tab) -> Result<&PanelView, InvalidQueryError> {
        let snapshot = Arc::clone(&self.snapshot);
        let cache = Arc::clone(&self.cache);
        self.state_mut(tab)
            .rendered_or_else(|tab, settings| render(tab, settings, &snapshot, &cache))
            .map(|rendered| &rendered.panel)
    }
}

fn render(
    tab: Tab,
    settings: &TabSettings,
    snapshot: &DatasetSnapshot,
    cache: &QueryCache,
) -> Result<RenderedView, InvalidQueryError> {
    let Some(query) = settings.query else {
        let page = if tab == Tab::About {
            about_page()
        } else {
            methods_page()
        };
        return Ok(RenderedView {
            result: None,
            panel: PanelView::Static(page),
        });
    };

    let result = cache.get_or_compute(&query, |q| {
        aggregate(q, snapshot.records_for(q.region_level, q.variable))
    })?;

    let warnings = result.empty_result_warnings();
    if let Some(first) = warnings.first() {
        log::warn!(
            "{}: {first} ({} group(s) without data)",
            tab.label(),
            warnings.len()
        );
    }

    let scale = settings.color_scale();
    let geometries = snapshot.geometries(query.region_level);
    let panel = match query.mode {
        GroupingMode::ByYear => trend_panel(&result, scale),
        GroupingMode::ByRegion if tab == Tab::TopRegions => ranking_panel(
            &result,
            geometries,
            settings.display.top_n,
            settings.display.sort_direction,
            scale,
        ),
        GroupingMode::ByRegion => map_panel(&result, geometries, scale),
    };

    log::debug!("Rendered {} panel '{}'", tab.label(), panel.title());

    Ok(RenderedView {
        result: Some(result),
        panel,
    })
}
