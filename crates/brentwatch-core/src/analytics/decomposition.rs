use serde::{Deserialize, Serialize};

use super::MonthlyMean;
use crate::{CalendarDate, PipelineError, ValidationError};

/// One month of an additive decomposition `observed = trend + seasonal + residual`.
///
/// `trend` and `residual` are `None` within half a period of either end, where
/// the centred moving average is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecompositionPoint {
    pub period_end: CalendarDate,
    pub observed: f64,
    pub trend: Option<f64>,
    pub seasonal: f64,
    pub residual: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub period: usize,
    pub points: Vec<DecompositionPoint>,
}

/// Classical additive decomposition of consecutive monthly means.
///
/// Even periods use a 2×`period` centred moving average for the trend, odd
/// periods a plain centred window. Seasonal offsets are the mean detrended
/// value at each position within the period, shifted to sum to zero.
pub fn seasonal_decomposition(
    months: &[MonthlyMean],
    period: usize,
) -> Result<Decomposition, PipelineError> {
    if period < 2 {
        return Err(ValidationError::InvalidPeriod.into());
    }
    let n = months.len();
    if n < 2 * period {
        return Err(PipelineError::insufficient("decomposition", 2 * period, n));
    }

    let observed: Vec<f64> = months.iter().map(|month| month.mean).collect();
    let trend = centred_moving_average(&observed, period);

    let mut sums = vec![0.0_f64; period];
    let mut counts = vec![0_usize; period];
    for (index, (value, level)) in observed.iter().zip(&trend).enumerate() {
        if let Some(level) = level {
            sums[index % period] += value - level;
            counts[index % period] += 1;
        }
    }
    let mut seasonal: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, count)| if *count > 0 { sum / *count as f64 } else { 0.0 })
        .collect();
    let offset = seasonal.iter().sum::<f64>() / period as f64;
    for value in &mut seasonal {
        *value -= offset;
    }

    let points = months
        .iter()
        .zip(&trend)
        .enumerate()
        .map(|(index, (month, level))| {
            let seasonal = seasonal[index % period];
            DecompositionPoint {
                period_end: month.period_end,
                observed: month.mean,
                trend: *level,
                seasonal,
                residual: level.map(|level| month.mean - level - seasonal),
            }
        })
        .collect();

    Ok(Decomposition { period, points })
}

fn centred_moving_average(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = data.len();
    let half = period / 2;
    let mut trend = vec![None; n];
    for i in half..n.saturating_sub(half) {
        let value = if period % 2 == 0 {
            let inner: f64 = data[i - half + 1..i + half].iter().sum();
            (0.5 * data[i - half] + inner + 0.5 * data[i + half]) / period as f64
        } else {
            data[i - half..=i + half].iter().sum::<f64>() / period as f64
        };
        trend[i] = Some(value);
    }
    trend
}
