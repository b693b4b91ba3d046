//! Derived views over the cleaned series and the forecast.
//!
//! | Function | Panel |
//! |----------|-------|
//! | [`filter_range`] | trend / distribution (picker range) |
//! | [`monthly_means`] | seasonality |
//! | [`yearly_extrema`] | max/min per year |
//! | [`price_histogram`] | price distribution |
//! | [`correlation_matrix`] | correlation against indicators |
//! | [`seasonal_decomposition`] | decomposition |
//! | [`forecast_diagnostics`] | residual diagnostics |
//!
//! Everything except the range filter fails fast with
//! [`PipelineError::InsufficientData`](crate::PipelineError::InsufficientData)
//! on input too small to be meaningful.

mod aggregate;
mod correlation;
mod decomposition;
mod diagnostics;

pub use aggregate::{
    monthly_means, price_histogram, yearly_extrema, Histogram, HistogramBin, MonthlyMean,
    YearlyExtrema,
};
pub use correlation::{correlation_matrix, pearson, CorrelationMatrix};
pub use decomposition::{seasonal_decomposition, Decomposition, DecompositionPoint};
pub use diagnostics::{forecast_diagnostics, ForecastDiagnostics};

use crate::{DateRange, Dated};

/// Contiguous run of `items` whose date lies in `[range.start, range.end]`.
///
/// `items` must be chronologically ordered. An inverted range yields an empty
/// result rather than an error.
pub fn filter_range<T: Dated + Clone>(items: &[T], range: &DateRange) -> Vec<T> {
    if !range.is_ordered() {
        return Vec::new();
    }
    let start = items.partition_point(|item| item.date() < range.start);
    let end = items.partition_point(|item| item.date() <= range.end);
    if start >= end {
        return Vec::new();
    }
    items[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CalendarDate, Observation};

    fn series() -> Vec<Observation> {
        (1..=10)
            .map(|d| {
                Observation::new(CalendarDate::from_ymd(2020, 1, d).expect("date"), 10.0)
                    .expect("observation")
            })
            .collect()
    }

    fn range(start: u8, end: u8) -> DateRange {
        DateRange::new(
            CalendarDate::from_ymd(2020, 1, start).expect("date"),
            CalendarDate::from_ymd(2020, 1, end).expect("date"),
        )
    }

    #[test]
    fn bounds_are_inclusive() {
        let filtered = filter_range(&series(), &range(3, 5));
        let days: Vec<u8> = filtered.iter().map(|o| o.date.day()).collect();
        assert_eq!(days, vec![3, 4, 5]);
    }

    #[test]
    fn inverted_range_is_empty_not_an_error() {
        for (start, end) in [(5, 3), (10, 1), (2, 1)] {
            assert!(filter_range(&series(), &range(start, end)).is_empty());
        }
    }

    #[test]
    fn range_outside_series_is_empty() {
        let outside = DateRange::new(
            CalendarDate::from_ymd(2021, 1, 1).expect("date"),
            CalendarDate::from_ymd(2021, 2, 1).expect("date"),
        );
        assert!(filter_range(&series(), &outside).is_empty());
    }
}
