//! Records artifact parsing.
//!
//! The records artifact is a CSV file in long format, one row per
//! region, year, and variable:
//!
//! ```text
//! region_id,region_level,year,variable,value,normalized_value,is_missing
//! USA,country,2010,damage,1250000,0.0001,false
//! USA,country,2011,damage,,,
//! ```
//!
//! An empty or `NaN` `value` marks the measurement as missing; the
//! `normalized_value` and `is_missing` columns are optional.

use std::io::Read;

use flood_impact_models::{ImpactRecord, RegionLevel, Variable};
use serde::Deserialize;

use crate::DataLoadError;

#[derive(Debug, Deserialize)]
struct RecordRow {
    region_id: String,
    region_level: RegionLevel,
    year: i32,
    variable: Variable,
    value: Option<f64>,
    #[serde(default)]
    normalized_value: Option<f64>,
    #[serde(default)]
    is_missing: Option<bool>,
}

impl RecordRow {
    fn into_record(self) -> ImpactRecord {
        let value = self.value.filter(|v| !v.is_nan());
        let is_missing = self.is_missing.unwrap_or(false) || value.is_none();

        ImpactRecord {
            region_id: self.region_id,
            region_level: self.region_level,
            year: self.year,
            variable: self.variable,
            value: value.unwrap_or(0.0),
            normalized_value: self.normalized_value.filter(|v| !v.is_nan()),
            is_missing,
        }
    }
}

/// Parses every row of a records CSV.
///
/// # Errors
///
/// Returns [`DataLoadError::Records`] naming the offending line if any row
/// cannot be parsed, or [`DataLoadError::EmptyRegionId`] if a row has a
/// blank `region_id`.
pub fn read_records(reader: impl Read) -> Result<Vec<ImpactRecord>, DataLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(malformed)?.clone();
    let mut raw = csv::StringRecord::new();
    let mut records = Vec::new();

    while csv_reader.read_record(&mut raw).map_err(malformed)? {
        let line = raw.position().map(csv::Position::line);
        let row: RecordRow =
            raw.deserialize(Some(&headers))
                .map_err(|e| DataLoadError::Records {
                    line,
                    message: e.to_string(),
                })?;

        if row.region_id.is_empty() {
            return Err(DataLoadError::EmptyRegionId {
                line: line.unwrap_or_default(),
            });
        }

        records.push(row.into_record());
    }

    Ok(records)
}

fn malformed(e: csv::Error) -> DataLoadError {
    DataLoadError::Records {
        line: e.position().map(csv::Position::line),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "region_id,region_level,year,variable,value,normalized_value,is_missing\n";

    fn parse(body: &str) -> Result<Vec<ImpactRecord>, DataLoadError> {
        read_records(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn parses_complete_rows() {
        let records = parse("USA,country,2010,damage,1250000,0.5,false\n").unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.region_id, "USA");
        assert_eq!(record.region_level, RegionLevel::Country);
        assert_eq!(record.year, 2010);
        assert_eq!(record.variable, Variable::Damage);
        assert!((record.value - 1_250_000.0).abs() < f64::EPSILON);
        assert_eq!(record.normalized_value, Some(0.5));
        assert!(!record.is_missing);
    }

    #[test]
    fn empty_or_nan_value_is_missing() {
        let records = parse(
            "USA,country,2010,damage,,,\n\
             USA,country,2011,damage,NaN,,\n\
             USA,country,2012,damage,3,,true\n",
        )
        .unwrap();
        assert!(records.iter().all(|r| r.is_missing));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let records = read_records(
            "region_id,region_level,year,variable,value\n2720,admin1,2004,flood_count,1\n"
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(records[0].region_level, RegionLevel::Admin1);
        assert_eq!(records[0].normalized_value, None);
        assert!(!records[0].is_missing);
    }

    #[test]
    fn unknown_variable_names_the_line() {
        let err = parse(
            "USA,country,2010,damage,1,,\n\
             USA,country,2010,rainfall,1,,\n",
        )
        .unwrap_err();
        assert!(
            matches!(err, DataLoadError::Records { line: Some(3), .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        assert!(matches!(
            parse("USA,country,twenty-ten,damage,1,,\n"),
            Err(DataLoadError::Records { .. })
        ));
    }

    #[test]
    fn blank_region_id_is_rejected() {
        assert!(matches!(
            parse(",country,2010,damage,1,,\n"),
            Err(DataLoadError::EmptyRegionId { line: 2 })
        ));
    }

    #[test]
    fn blank_lines_do_not_shift_reported_line() {
        assert!(matches!(
            parse("USA,country,2010,damage,1,,\n\n\n,country,2011,damage,1,,\n"),
            Err(DataLoadError::EmptyRegionId { line: 5 })
        ));
    }
}
