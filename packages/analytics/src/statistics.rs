//! Order-independent statistics over the non-missing values of a group.

use flood_impact_models::Statistic;

/// Applies `statistic` to `values`, or returns `None` when there are no
/// values to aggregate.
///
/// `values` may be reordered (the median sorts in place).
#[must_use]
pub fn apply(statistic: Statistic, values: &mut [f64]) -> Option<f64> {
    match statistic {
        Statistic::Mean => mean(values),
        Statistic::Median => median(values),
        Statistic::Max => max(values),
        Statistic::Sum => sum(values),
    }
}

/// Arithmetic mean.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median, averaging the two middle values when the count is even.
#[must_use]
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;

    if values.len() % 2 == 0 {
        Some(f64::midpoint(values[mid - 1], values[mid]))
    } else {
        Some(values[mid])
    }
}

/// Largest value.
#[must_use]
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Arithmetic sum. `None` for an empty group, never zero.
#[must_use]
pub fn sum(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_even_count_averages_middle_pair() {
        assert_eq!(median(&mut [10.0, 20.0]), Some(15.0));
        assert_eq!(median(&mut [40.0, 10.0, 30.0, 20.0]), Some(25.0));
    }

    #[test]
    fn median_odd_count_takes_middle() {
        assert_eq!(median(&mut [10.0, 20.0, 30.0]), Some(20.0));
        assert_eq!(median(&mut [30.0, 10.0, 20.0]), Some(20.0));
        assert_eq!(median(&mut [7.0]), Some(7.0));
    }

    #[test]
    fn mean_max_sum() {
        let values = [2.0, 4.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(max(&values), Some(9.0));
        assert_eq!(sum(&values), Some(15.0));
    }

    #[test]
    fn max_handles_negatives() {
        assert_eq!(max(&[-3.0, -1.0, -2.0]), Some(-1.0));
    }

    #[test]
    fn empty_input_has_no_value() {
        for statistic in Statistic::all() {
            assert_eq!(apply(*statistic, &mut []), None, "{statistic}");
        }
    }

    #[test]
    fn statistics_ignore_input_order() {
        for statistic in Statistic::all() {
            let forward = apply(*statistic, &mut [1.0, 5.0, 3.0, 8.0]);
            let reverse = apply(*statistic, &mut [8.0, 3.0, 5.0, 1.0]);
            assert_eq!(forward, reverse, "{statistic}");
        }
    }
}
