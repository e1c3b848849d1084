//! Panel titles and value formatting.

use flood_impact_models::{RegionLevel, Statistic, Variable};

/// Title for a statistic of a variable, e.g. `"Mean Economic Damages (% of GDP)"`.
///
/// Flood counts always read "Flood Event Count". Variables without a
/// normalized form ignore `normalize`.
#[must_use]
pub fn panel_title(variable: Variable, statistic: Statistic, normalize: bool) -> String {
    let statistic = statistic.label();
    match (variable, normalize && variable.supports_normalization()) {
        (Variable::FloodCount, _) => "Flood Event Count".to_string(),
        (Variable::Damage, true) => format!("{statistic} Economic Damages (% of GDP)"),
        (Variable::PopulationAffected, true) => {
            format!("{statistic} Population Affected (% of Total)")
        }
        (Variable::FloodedArea, true) => format!("{statistic} Flooded Area (% of Total Area)"),
        _ => format!("{statistic} {}", variable.label()),
    }
}

/// Map title, e.g. `"Mean Economic Damages (% of GDP) by Country"`.
#[must_use]
pub fn map_title(
    variable: Variable,
    statistic: Statistic,
    normalize: bool,
    level: RegionLevel,
) -> String {
    format!(
        "{} by {}",
        panel_title(variable, statistic, normalize),
        level.label()
    )
}

/// Trend chart title, e.g. `"Total Flooded Area by Year"`.
#[must_use]
pub fn trend_title(variable: Variable) -> String {
    format!("Total {} by Year", variable.label())
}

/// Formats a value with two decimals and thousands separators.
#[must_use]
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
