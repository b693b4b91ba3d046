use serde::{Deserialize, Serialize};

use crate::{CalendarDate, Observation, ObservationSeries, PipelineError, ValidationError};

/// Mean price of one calendar month that has at least one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMean {
    pub year: i32,
    pub month: u8,
    /// Month-end label used as the chart x value.
    pub period_end: CalendarDate,
    #[serde(rename = "y")]
    pub mean: f64,
    pub count: usize,
}

/// Calendar-month means in chronological order. Months without observations
/// are omitted.
pub fn monthly_means(series: &ObservationSeries) -> Result<Vec<MonthlyMean>, PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::insufficient("monthly aggregation", 1, 0));
    }

    let mut months: Vec<MonthlyMean> = Vec::new();
    let mut sum = 0.0;
    for observation in series.observations() {
        let key = (observation.date.year(), observation.date.month());
        match months.last_mut() {
            Some(current) if (current.year, current.month) == key => {
                current.count += 1;
                sum += observation.price;
                current.mean = sum / current.count as f64;
            }
            _ => {
                sum = observation.price;
                months.push(MonthlyMean {
                    year: key.0,
                    month: key.1,
                    period_end: observation.date.month_end(),
                    mean: observation.price,
                    count: 1,
                });
            }
        }
    }
    Ok(months)
}

/// Highest and lowest observation of every calendar year, one row per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyExtrema {
    pub max: Vec<Observation>,
    pub min: Vec<Observation>,
}

/// Ties go to the earliest observation of the year.
pub fn yearly_extrema(series: &ObservationSeries) -> Result<YearlyExtrema, PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::insufficient("yearly extrema", 1, 0));
    }

    let mut max: Vec<Observation> = Vec::new();
    let mut min: Vec<Observation> = Vec::new();
    for observation in series.observations() {
        let same_year = max
            .last()
            .is_some_and(|current| current.date.year() == observation.date.year());
        if !same_year {
            max.push(*observation);
            min.push(*observation);
            continue;
        }
        if let Some(current) = max.last_mut() {
            if observation.price > current.price {
                *current = *observation;
            }
        }
        if let Some(current) = min.last_mut() {
            if observation.price < current.price {
                *current = *observation;
            }
        }
    }
    Ok(YearlyExtrema { max, min })
}

/// Equal-width bin over `[lower, upper)`; the last bin is closed on the right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub total: usize,
}

/// Sturges' rule: `ceil(log2 n) + 1`.
pub(crate) fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

/// Price distribution. `bins` defaults to Sturges' rule.
pub fn price_histogram(
    series: &ObservationSeries,
    bins: Option<usize>,
) -> Result<Histogram, PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::insufficient("price distribution", 1, 0));
    }
    let bins = bins.unwrap_or_else(|| sturges_bins(series.len()));
    if bins == 0 {
        return Err(ValidationError::ZeroBins.into());
    }

    let (low, high) = series
        .prices()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), price| {
            (lo.min(price), hi.max(price))
        });
    let width = (high - low) / bins as f64;

    if width == 0.0 {
        return Ok(Histogram {
            bins: vec![HistogramBin {
                lower: low,
                upper: high,
                count: series.len(),
            }],
            total: series.len(),
        });
    }

    let mut counts = vec![0_usize; bins];
    for price in series.prices() {
        let index = (((price - low) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| HistogramBin {
            lower: low + width * index as f64,
            upper: low + width * (index + 1) as f64,
            count,
        })
        .collect();

    Ok(Histogram {
        bins,
        total: series.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(rows: &[(i32, u8, u8, f64)]) -> ObservationSeries {
        let observations = rows
            .iter()
            .map(|(y, m, d, p)| {
                Observation::new(CalendarDate::from_ymd(*y, *m, *d).expect("date"), *p)
                    .expect("observation")
            })
            .collect();
        ObservationSeries::new("USD", observations).expect("series")
    }

    #[test]
    fn one_row_per_distinct_month_in_order() {
        let s = series(&[
            (2020, 1, 2, 10.0),
            (2020, 1, 3, 20.0),
            (2020, 2, 3, 30.0),
            (2020, 4, 1, 40.0),
            (2021, 1, 5, 50.0),
        ]);
        let months = monthly_means(&s).expect("must aggregate");
        assert_eq!(months.len(), 4);
        assert_eq!(months[0].mean, 15.0);
        assert_eq!(months[0].count, 2);
        assert_eq!(months[0].period_end.format_iso(), "2020-01-31");
        assert_eq!((months[2].year, months[2].month), (2020, 4));
        assert_eq!((months[3].year, months[3].month), (2021, 1));
    }

    #[test]
    fn extrema_pick_one_row_per_year_with_first_tie() {
        let s = series(&[
            (2019, 3, 1, 60.0),
            (2019, 6, 1, 70.0),
            (2019, 9, 1, 70.0),
            (2019, 12, 1, 55.0),
            (2020, 1, 1, 65.0),
        ]);
        let extrema = yearly_extrema(&s).expect("must compute");
        assert_eq!(extrema.max.len(), 2);
        assert_eq!(extrema.min.len(), 2);
        assert_eq!(extrema.max[0].date.format_iso(), "2019-06-01");
        assert_eq!(extrema.min[0].price, 55.0);
        assert_eq!(extrema.max[1].date, extrema.min[1].date);
        for (max, min) in extrema.max.iter().zip(&extrema.min) {
            assert!(max.price >= min.price);
        }
    }

    #[test]
    fn empty_series_is_insufficient_data() {
        let empty = ObservationSeries::empty("USD").expect("series");
        assert!(matches!(
            monthly_means(&empty),
            Err(PipelineError::InsufficientData { .. })
        ));
        assert!(matches!(
            yearly_extrema(&empty),
            Err(PipelineError::InsufficientData { .. })
        ));
        assert!(matches!(
            price_histogram(&empty, None),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn histogram_counts_every_observation() {
        let s = series(&[
            (2020, 1, 1, 10.0),
            (2020, 1, 2, 12.0),
            (2020, 1, 3, 15.0),
            (2020, 1, 4, 20.0),
        ]);
        let histogram = price_histogram(&s, Some(2)).expect("must bin");
        let counts: Vec<usize> = histogram.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2]);
        assert_eq!(histogram.bins[1].upper, 20.0);
        assert_eq!(histogram.total, 4);
    }

    #[test]
    fn constant_prices_fall_in_a_single_bin() {
        let s = series(&[(2020, 1, 1, 10.0), (2020, 1, 2, 10.0)]);
        let histogram = price_histogram(&s, None).expect("must bin");
        assert_eq!(histogram.bins.len(), 1);
        assert_eq!(histogram.bins[0].count, 2);
    }

    #[test]
    fn zero_bins_is_rejected() {
        let s = series(&[(2020, 1, 1, 10.0)]);
        assert_eq!(
            price_histogram(&s, Some(0)),
            Err(PipelineError::Validation(ValidationError::ZeroBins))
        );
    }

    #[test]
    fn sturges_rule() {
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(8), 4);
        assert_eq!(sturges_bins(1000), 11);
    }
}
