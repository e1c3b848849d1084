//! Event-level flood CSV parsing.
//!
//! Every input row is one flood event in one admin-1 unit. A row becomes a
//! record per region level it names (admin-1 code, country ISO code, UN
//! subregion) and per [`Variable`].

use std::collections::BTreeMap;
use std::io::Read;

use flood_impact_models::{ImpactRecord, RegionLevel, Variable};
use serde::Deserialize;

use crate::PreprocessError;

/// Admin-1 name the source uses for units it could not identify.
pub const UNAVAILABLE_ADMIN1_NAME: &str = "Administrative unit not available";

/// Admin-1 codes that appear under several countries in the source data,
/// with the country each actually belongs to.
pub const COUNTRY_CORRECTIONS: &[(&str, &str)] = &[
    ("2720", "Spain"),
    ("2961", "Timor-Leste"),
    ("25351", "Montenegro"),
    ("25355", "Montenegro"),
    ("25356", "Montenegro"),
    ("25365", "Montenegro"),
    ("25372", "Serbia"),
    ("25373", "Serbia"),
    ("25375", "Serbia"),
    ("25376", "Serbia"),
    ("25378", "Serbia"),
    ("25379", "Serbia"),
    ("25381", "Serbia"),
    ("25385", "Serbia"),
    ("25389", "Serbia"),
    ("25394", "Serbia"),
    ("25395", "Serbia"),
    ("40408", "Jammu and Kashmir"),
    ("40409", "Jammu and Kashmir"),
    ("40422", "Jammu and Kashmir"),
    ("40423", "Jammu and Kashmir"),
    ("40424", "Jammu and Kashmir"),
    ("40425", "Jammu and Kashmir"),
    ("40426", "Jammu and Kashmir"),
    ("40427", "Jammu and Kashmir"),
    ("40428", "Jammu and Kashmir"),
    ("40429", "Jammu and Kashmir"),
    ("40430", "Jammu and Kashmir"),
    ("40431", "Jammu and Kashmir"),
];

/// Display names for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionName {
    /// Human-readable name.
    pub display_name: String,
    /// Enclosing country, for admin-1 units.
    pub parent_name: Option<String>,
}

/// Names of every region a record references, keyed by level and id.
pub type RegionNames = BTreeMap<(RegionLevel, String), RegionName>;

/// Records and names extracted from the events CSV.
#[derive(Debug, Default)]
pub struct FloodEvents {
    /// One record per event, region level, and variable, in input order.
    pub records: Vec<ImpactRecord>,
    /// Names of every referenced region.
    pub names: RegionNames,
    /// Rows turned into records.
    pub event_count: usize,
    /// Rows skipped for lacking a month-year.
    pub dropped_count: usize,
    /// Rows with no ISO code, left out of country and global totals.
    pub without_country_count: usize,
}

#[derive(Debug, Deserialize)]
struct EventRow {
    #[serde(rename = "mon-yr", default)]
    month_year: Option<String>,
    #[serde(rename = "adm1_code", default)]
    admin1_code: Option<String>,
    #[serde(rename = "adm1_name", default)]
    admin1_name: Option<String>,
    #[serde(rename = "ISO", default)]
    iso: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Subregion", default)]
    subregion: Option<String>,
    #[serde(rename = "flooded_area", default)]
    flooded_area: Option<f64>,
    #[serde(rename = "flooded_area (normalized by adm1 area)", default)]
    flooded_area_normalized: Option<f64>,
    #[serde(
        rename = "Total Damage, Adjusted ('000 US$) (population-weighted)",
        default
    )]
    damage_thousands: Option<f64>,
    #[serde(
        rename = "Total Damage, Adjusted ('000 US$) (population-weighted, normalized by GDP)",
        default
    )]
    damage_normalized: Option<f64>,
    #[serde(rename = "Total Affected (population-weighted)", default)]
    population_affected: Option<f64>,
    #[serde(rename = "Total Affected (population-weighted, normalized)", default)]
    population_affected_normalized: Option<f64>,
    #[serde(rename = "event_precip_mean (mm/day)", default)]
    precipitation: Option<f64>,
    #[serde(rename = "event_precip_75_quant_mean (mm/day)", default)]
    extreme_precipitation: Option<f64>,
}

impl EventRow {
    /// `(variable, value, normalized value)` for each measured quantity.
    fn measurements(&self) -> [(Variable, Option<f64>, Option<f64>); 6] {
        [
            (
                Variable::Damage,
                self.damage_thousands.map(|v| v * 1000.0),
                self.damage_normalized,
            ),
            (
                Variable::PopulationAffected,
                self.population_affected,
                self.population_affected_normalized,
            ),
            (
                Variable::FloodedArea,
                self.flooded_area,
                self.flooded_area_normalized,
            ),
            (Variable::FloodCount, Some(1.0), None),
            (Variable::Precipitation, self.precipitation, None),
            (
                Variable::ExtremePrecipitation,
                self.extreme_precipitation,
                None,
            ),
        ]
    }
}

/// Country an admin-1 code is reassigned to, if it is one of the
/// [`COUNTRY_CORRECTIONS`].
#[must_use]
pub fn corrected_country(admin1_code: &str) -> Option<&'static str> {
    COUNTRY_CORRECTIONS
        .iter()
        .find(|(code, _)| *code == admin1_code)
        .map(|(_, country)| *country)
}

/// Canonical text form of a region code.
///
/// Integer codes that went through a floating point column (`2720.0`)
/// lose their fractional suffix.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    let code = code.trim();
    code.strip_suffix(".0").unwrap_or(code).to_string()
}

/// Year encoded in the last four characters of a `mon-yr` value such as
/// `Jan-2010`.
#[must_use]
pub fn parse_year(month_year: &str) -> Option<i32> {
    let month_year = month_year.trim();
    month_year
        .get(month_year.len().checked_sub(4)?..)?
        .parse()
        .ok()
}

/// Display name for an admin-1 unit, substituting a code-based name for
/// units the source left unnamed.
#[must_use]
pub fn admin1_display_name(code: &str, name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name)
            if !name.is_empty()
                && !name.eq_ignore_ascii_case("nan")
                && name != UNAVAILABLE_ADMIN1_NAME =>
        {
            name.to_string()
        }
        _ => format!("Unknown Name (code: {code})"),
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Parses the event-level flood CSV.
///
/// # Errors
///
/// Returns [`PreprocessError::Events`] if a row cannot be parsed, or
/// [`PreprocessError::InvalidMonthYear`] if a month-year does not end in
/// a year.
pub fn read_events(reader: impl Read) -> Result<FloodEvents, PreprocessError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut events = FloodEvents::default();

    for row in csv_reader.deserialize::<EventRow>() {
        let row = row.map_err(|e| PreprocessError::Events {
            line: e.position().map(csv::Position::line),
            message: e.to_string(),
        })?;

        let Some(month_year) = non_empty(row.month_year.as_ref()) else {
            events.dropped_count += 1;
            continue;
        };
        let year = parse_year(month_year).ok_or_else(|| PreprocessError::InvalidMonthYear {
            value: month_year.to_string(),
        })?;

        let admin1_code = non_empty(row.admin1_code.as_ref()).map(normalize_code);
        let country = admin1_code
            .as_deref()
            .and_then(corrected_country)
            .map(str::to_string)
            .or_else(|| non_empty(row.country.as_ref()).map(str::to_string));

        let mut regions = Vec::with_capacity(3);

        if let Some(code) = admin1_code {
            events
                .names
                .entry((RegionLevel::Admin1, code.clone()))
                .or_insert_with(|| RegionName {
                    display_name: admin1_display_name(&code, row.admin1_name.as_deref()),
                    parent_name: country.clone(),
                });
            regions.push((RegionLevel::Admin1, code));
        }

        if let Some(iso) = non_empty(row.iso.as_ref()) {
            events
                .names
                .entry((RegionLevel::Country, iso.to_string()))
                .or_insert_with(|| RegionName {
                    display_name: country.clone().unwrap_or_else(|| iso.to_string()),
                    parent_name: None,
                });
            regions.push((RegionLevel::Country, iso.to_string()));
        } else {
            events.without_country_count += 1;
        }

        if let Some(subregion) = non_empty(row.subregion.as_ref()) {
            events
                .names
                .entry((RegionLevel::Subregion, subregion.to_string()))
                .or_insert_with(|| RegionName {
                    display_name: subregion.to_string(),
                    parent_name: None,
                });
            regions.push((RegionLevel::Subregion, subregion.to_string()));
        }

        let measurements = row.measurements();
        for (region_level, region_id) in regions {
            for (variable, value, normalized_value) in measurements {
                let value = finite(value);
                events.records.push(ImpactRecord {
                    region_id: region_id.clone(),
                    region_level,
                    year,
                    variable,
                    value: value.unwrap_or(0.0),
                    normalized_value: finite(normalized_value),
                    is_missing: value.is_none(),
                });
            }
        }

        events.event_count += 1;
    }

    if events.dropped_count > 0 {
        log::warn!(
            "Dropped {} event rows without a month-year",
            events.dropped_count
        );
    }
    if events.without_country_count > 0 {
        log::warn!(
            "{} event rows have no ISO code and are missing from country-level totals",
            events.without_country_count
        );
    }
    log::info!(
        "Read {} flood events into {} records",
        events.event_count,
        events.records.len()
    );

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "mon-yr,adm1_code,adm1_name,ISO,Country,Subregion,flooded_area,\
        flooded_area (normalized by adm1 area),\
        \"Total Damage, Adjusted ('000 US$) (population-weighted)\",\
        \"Total Damage, Adjusted ('000 US$) (population-weighted, normalized by GDP)\",\
        Total Affected (population-weighted),\
        \"Total Affected (population-weighted, normalized)\",\
        event_precip_mean (mm/day),event_precip_75_quant_mean (mm/day)";

    fn events(rows: &[&str]) -> FloodEvents {
        let csv = format!("{HEADER}\n{}\n", rows.join("\n"));
        read_events(csv.as_bytes()).unwrap()
    }

    fn find<'a>(
        events: &'a FloodEvents,
        level: RegionLevel,
        variable: Variable,
    ) -> Vec<&'a ImpactRecord> {
        events
            .records
            .iter()
            .filter(|r| r.region_level == level && r.variable == variable)
            .collect()
    }

    #[test]
    fn one_record_per_level_and_variable() {
        let events = events(&[
            "Jan-2010,1001,Galicia,ESP,Spain,Southern Europe,10,0.1,5,0.01,200,0.02,12.5,20",
        ]);

        assert_eq!(events.event_count, 1);
        assert_eq!(events.records.len(), 3 * Variable::all().len());
        assert!(events.records.iter().all(|r| r.year == 2010));
    }

    #[test]
    fn damages_are_converted_to_dollars() {
        let events = events(&["Jan-2010,1001,Galicia,ESP,Spain,Southern Europe,10,0.1,5,0.01,200,0.02,12.5,20"]);

        let damage = find(&events, RegionLevel::Country, Variable::Damage);
        assert_eq!(damage[0].value, 5000.0);
        assert_eq!(damage[0].normalized_value, Some(0.01));

        let precip = find(&events, RegionLevel::Country, Variable::ExtremePrecipitation);
        assert_eq!(precip[0].value, 20.0);
        assert_eq!(precip[0].normalized_value, None);
    }

    #[test]
    fn flood_count_is_one_per_event() {
        let events = events(&[
            "Jan-2010,1001,Galicia,ESP,Spain,Southern Europe,,,,,,,,",
            "Feb-2011,1001,Galicia,ESP,Spain,Southern Europe,,,,,,,,",
        ]);

        let counts = find(&events, RegionLevel::Admin1, Variable::FloodCount);
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().all(|r| r.value == 1.0 && !r.is_missing));
    }

    #[test]
    fn blank_and_nan_values_are_missing() {
        let events = events(&["Jan-2010,1001,Galicia,ESP,Spain,Southern Europe,NaN,,,,,,,"]);

        let area = find(&events, RegionLevel::Admin1, Variable::FloodedArea);
        assert!(area[0].is_missing);
        let damage = find(&events, RegionLevel::Admin1, Variable::Damage);
        assert!(damage[0].is_missing);
        assert_eq!(damage[0].normalized_value, None);
    }

    #[test]
    fn rows_without_month_year_are_dropped() {
        let events = events(&[
            ",1001,Galicia,ESP,Spain,Southern Europe,1,,,,,,,",
            "Mar-2012,1001,Galicia,ESP,Spain,Southern Europe,1,,,,,,,",
        ]);

        assert_eq!(events.dropped_count, 1);
        assert_eq!(events.event_count, 1);
        assert!(events.records.iter().all(|r| r.year == 2012));
    }

    #[test]
    fn rows_without_iso_are_counted() {
        let events = events(&[
            "Jan-2010,1001,Galicia,,Spain,Southern Europe,1,,,,,,,",
            "Feb-2010,1001,Galicia,ESP,Spain,Southern Europe,1,,,,,,,",
        ]);

        assert_eq!(events.event_count, 2);
        assert_eq!(events.without_country_count, 1);
        assert_eq!(
            find(&events, RegionLevel::Country, Variable::FloodCount).len(),
            1
        );
        assert_eq!(
            find(&events, RegionLevel::Admin1, Variable::FloodCount).len(),
            2
        );
    }

    #[test]
    fn corrects_country_of_shared_admin1_codes() {
        let events = events(&["Jan-2010,2720.0,Galicia,PRT,Portugal,Southern Europe,,,,,,,,"]);

        let name = &events.names[&(RegionLevel::Admin1, "2720".to_string())];
        assert_eq!(name.parent_name.as_deref(), Some("Spain"));
        assert_eq!(
            events.names[&(RegionLevel::Country, "PRT".to_string())].display_name,
            "Spain"
        );
    }

    #[test]
    fn names_unidentified_admin1_units() {
        let events = events(&[
            "Jan-2010,77,Administrative unit not available,ESP,Spain,Southern Europe,,,,,,,,",
            "Jan-2010,78,,ESP,Spain,Southern Europe,,,,,,,,",
        ]);

        assert_eq!(
            events.names[&(RegionLevel::Admin1, "77".to_string())].display_name,
            "Unknown Name (code: 77)"
        );
        assert_eq!(
            events.names[&(RegionLevel::Admin1, "78".to_string())].display_name,
            "Unknown Name (code: 78)"
        );
    }

    #[test]
    fn first_name_wins() {
        let events = events(&[
            "Jan-2010,1001,Galicia,ESP,Spain,Southern Europe,,,,,,,,",
            "Jan-2011,1001,Galiza,ESP,Spain,Southern Europe,,,,,,,,",
        ]);

        assert_eq!(
            events.names[&(RegionLevel::Admin1, "1001".to_string())].display_name,
            "Galicia"
        );
    }

    #[test]
    fn rejects_month_year_without_year() {
        let csv = format!("{HEADER}\nJan,1001,Galicia,ESP,Spain,Southern Europe,,,,,,,,\n");
        assert!(matches!(
            read_events(csv.as_bytes()),
            Err(PreprocessError::InvalidMonthYear { .. })
        ));
    }

    #[test]
    fn parses_years() {
        assert_eq!(parse_year("Jan-2010"), Some(2010));
        assert_eq!(parse_year(" 12-2024 "), Some(2024));
        assert_eq!(parse_year("201"), None);
    }

    #[test]
    fn normalizes_float_codes() {
        assert_eq!(normalize_code("2720.0"), "2720");
        assert_eq!(normalize_code("40431"), "40431");
    }
}
