//! Aggregation of impact records into per-region or per-year groups.

use std::collections::BTreeMap;

use flood_impact_analytics_models::{
    AggregatedValue, AggregationQuery, AggregationResult, GroupAggregate, GroupKey,
    InvalidQueryError,
};
use flood_impact_models::{GroupingMode, ImpactRecord};

use crate::statistics;

#[derive(Default)]
struct Bucket {
    values: Vec<f64>,
    missing: u64,
}

/// Aggregates `records` according to `query`.
///
/// Records are filtered to the query's variable, region level, and
/// inclusive year range, then grouped by region id or year. Missing
/// records are excluded from the statistic and counted separately; a group
/// with no non-missing record yields [`AggregatedValue::NoData`].
///
/// The result is a pure function of the query and the record sequence.
///
/// # Errors
///
/// Returns [`InvalidQueryError`] if the query's year range is inverted.
pub fn aggregate<'a>(
    query: &AggregationQuery,
    records: impl IntoIterator<Item = &'a ImpactRecord>,
) -> Result<AggregationResult, InvalidQueryError> {
    query.validate()?;
    let query = query.canonical();

    let mut buckets: BTreeMap<GroupKey, Bucket> = BTreeMap::new();

    for record in records.into_iter().filter(|r| selects(&query, r)) {
        let key = match query.mode {
            GroupingMode::ByRegion => GroupKey::Region(record.region_id.clone()),
            GroupingMode::ByYear => GroupKey::Year(record.year),
        };
        let bucket = buckets.entry(key).or_default();

        match record.measured(query.normalize) {
            Some(value) => bucket.values.push(value),
            None => bucket.missing += 1,
        }
    }

    let mut record_count = 0;
    let mut missing_count = 0;

    let groups: Vec<GroupAggregate> = buckets
        .into_iter()
        .map(|(key, mut bucket)| {
            let contributing = bucket.values.len() as u64;
            record_count += contributing;
            missing_count += bucket.missing;

            let value = statistics::apply(query.statistic, &mut bucket.values)
                .map_or(AggregatedValue::NoData, AggregatedValue::Value);

            GroupAggregate {
                key,
                value,
                record_count: contributing,
                missing_count: bucket.missing,
            }
        })
        .collect();

    log::debug!(
        "Aggregated {} {} ({}, {}, {}) into {} groups from {record_count} records, {missing_count} missing",
        query.statistic,
        query.variable,
        query.region_level,
        query.mode,
        query.year_range,
        groups.len(),
    );

    Ok(AggregationResult {
        query,
        unit: query.unit().to_string(),
        groups,
        record_count,
        missing_count,
    })
}

fn selects(query: &AggregationQuery, record: &ImpactRecord) -> bool {
    record.variable == query.variable
        && record.region_level == query.region_level
        && query.year_range.contains(record.year)
}
