//! Static text shown on the Methods and About tabs.

use serde::Serialize;

/// One headed block of a static page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticSection {
    /// Section heading.
    pub heading: String,
    /// Markdown body.
    pub body: String,
}

/// A text-only panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticPage {
    /// Page heading.
    pub title: String,
    /// Sections in display order.
    pub sections: Vec<StaticSection>,
}

fn section(heading: &str, body: &str) -> StaticSection {
    StaticSection {
        heading: heading.to_string(),
        body: body.to_string(),
    }
}

/// The Methods tab.
#[must_use]
pub fn methods_page() -> StaticPage {
    StaticPage {
        title: "Methods".to_string(),
        sections: vec![
            section(
                "Summary",
                "Inland flood events from 2000 to 2024 are disaggregated into \
                 admin1-month events, enriched with satellite-derived flood maps \
                 and population exposure, and aggregated to countries and UN \
                 subregions.",
            ),
            section(
                "Data Sources Overview",
                "Flood events and reported impacts come from the EM-DAT disaster \
                 database. Boundaries come from the 2015 Global Administrative Unit \
                 Layers (GAUL). Inundation is derived from MODIS imagery, population \
                 from the Gridded Population of the World dataset, and precipitation \
                 from daily gridded rainfall during each event.",
            ),
            section(
                "Normalization",
                "Economic damages are expressed in 2023 U.S. dollars and, when \
                 normalized, as a percentage of GDP. Population affected is \
                 normalized by total population and flooded area by region area. \
                 Flood counts and precipitation rates have no normalized form.",
            ),
            section(
                "Missing Values",
                "Events without a reported value for a variable are excluded from \
                 that variable's statistics and counted separately. Regions or years \
                 with no reported value are shown as having no data rather than zero.",
            ),
        ],
    }
}

/// The About tab.
#[must_use]
pub fn about_page() -> StaticPage {
    StaticPage {
        title: "About This Project".to_string(),
        sections: vec![
            section(
                "Summary",
                "A visual companion to the project \"A Spatially and Temporally \
                 Disaggregated Twenty-First Century Global Flood Record for Flood \
                 Impact Analysis.\"",
            ),
            section(
                "Dataset",
                "The record covers inland floods worldwide from 2000 through 2024 \
                 at the first administrative level, with country and UN subregion \
                 aggregates derived from it.",
            ),
        ],
    }
}
