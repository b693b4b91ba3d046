//! Forecasting seam.
//!
//! The dashboard treats the model as a black box behind [`Forecaster`]. The
//! bundled [`TrendSeasonalForecaster`] fits `y = a + b·t + s[month]` where `t`
//! is days since the first observation and `s` are additive month-of-year
//! offsets, then extrapolates one point per day over the horizon.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    CalendarDate, ForecastPoint, ForecastSeries, ObservationSeries, PipelineError,
    ValidationError,
};

/// Days extrapolated past the last observation unless configured otherwise.
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Longest accepted horizon, ten years of daily points.
pub const MAX_HORIZON_DAYS: u32 = 3650;

/// Rejects horizons above [`MAX_HORIZON_DAYS`].
pub fn check_horizon(horizon_days: u32) -> Result<u32, ValidationError> {
    if horizon_days > MAX_HORIZON_DAYS {
        return Err(ValidationError::HorizonTooLong {
            value: horizon_days,
            max: MAX_HORIZON_DAYS,
        });
    }
    Ok(horizon_days)
}

/// Width of the uncertainty interval.
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.80;

/// Forecast plus in-sample residuals (`y - yhat` for every observation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub series: ForecastSeries,
    pub residuals: Vec<f64>,
}

/// Produces a [`Forecast`] covering the observed range plus `horizon_days`.
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &'static str;

    fn forecast(
        &self,
        series: &ObservationSeries,
        horizon_days: u32,
    ) -> Result<Forecast, PipelineError>;
}

/// Linear trend with additive monthly seasonality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSeasonalForecaster {
    interval_width: f64,
}

impl Default for TrendSeasonalForecaster {
    fn default() -> Self {
        Self {
            interval_width: DEFAULT_INTERVAL_WIDTH,
        }
    }
}

impl TrendSeasonalForecaster {
    pub fn with_interval_width(interval_width: f64) -> Result<Self, ValidationError> {
        if !interval_width.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "interval_width",
            });
        }
        if interval_width <= 0.0 || interval_width >= 1.0 {
            return Err(ValidationError::InvalidConfig {
                key: "interval_width",
                value: interval_width.to_string(),
            });
        }
        Ok(Self { interval_width })
    }

    pub const fn interval_width(&self) -> f64 {
        self.interval_width
    }
}

/// Fitted coefficients.
#[derive(Debug, Clone, Copy)]
struct Fit {
    origin: CalendarDate,
    intercept: f64,
    slope: f64,
    seasonal: [f64; 12],
    sigma: f64,
}

impl Fit {
    fn estimate(&self, date: CalendarDate) -> f64 {
        let t = date.days_since(self.origin) as f64;
        self.intercept + self.slope * t + self.seasonal[usize::from(date.month() - 1)]
    }
}

fn fit(series: &ObservationSeries) -> Fit {
    let observations = series.observations();
    let n = observations.len() as f64;
    let origin = observations[0].date;

    let t: Vec<f64> = observations
        .iter()
        .map(|o| o.date.days_since(origin) as f64)
        .collect();
    let y: Vec<f64> = series.prices().collect();

    let t_mean = t.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let covariance: f64 = t
        .iter()
        .zip(&y)
        .map(|(ti, yi)| (ti - t_mean) * (yi - y_mean))
        .sum();
    let variance: f64 = t.iter().map(|ti| (ti - t_mean).powi(2)).sum();
    let slope = if variance > 0.0 { covariance / variance } else { 0.0 };
    let intercept = y_mean - slope * t_mean;

    let mut sums = [0.0_f64; 12];
    let mut counts = [0_usize; 12];
    for ((observation, ti), yi) in observations.iter().zip(&t).zip(&y) {
        let month = usize::from(observation.date.month() - 1);
        sums[month] += yi - (intercept + slope * ti);
        counts[month] += 1;
    }
    let mut seasonal = [0.0_f64; 12];
    for month in 0..12 {
        if counts[month] > 0 {
            seasonal[month] = sums[month] / counts[month] as f64;
        }
    }

    let mut model = Fit {
        origin,
        intercept,
        slope,
        seasonal,
        sigma: 0.0,
    };
    let squared: f64 = observations
        .iter()
        .map(|o| (o.price - model.estimate(o.date)).powi(2))
        .sum();
    model.sigma = (squared / n).sqrt();
    model
}

/// Two-sided normal quantile for common interval widths.
fn z_score(interval_width: f64) -> f64 {
    match interval_width {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        x if x >= 0.80 => 1.2816,
        x if x >= 0.50 => 0.6745,
        _ => 0.2533,
    }
}

impl Forecaster for TrendSeasonalForecaster {
    fn name(&self) -> &'static str {
        "trend_seasonal"
    }

    fn forecast(
        &self,
        series: &ObservationSeries,
        horizon_days: u32,
    ) -> Result<Forecast, PipelineError> {
        check_horizon(horizon_days)?;
        if series.len() < 2 {
            return Err(PipelineError::insufficient("forecast", 2, series.len()));
        }

        let model = fit(series);
        let z = z_score(self.interval_width);
        let n = series.len() as f64;
        let band = |steps_ahead: f64| z * model.sigma * (1.0 + steps_ahead / n).sqrt();

        let mut points = Vec::with_capacity(series.len() + horizon_days as usize);
        let mut residuals = Vec::with_capacity(series.len());
        for observation in series.observations() {
            let estimate = model.estimate(observation.date);
            residuals.push(observation.price - estimate);
            let width = band(0.0);
            points.push(ForecastPoint {
                date: observation.date,
                estimate,
                lower: estimate - width,
                upper: estimate + width,
            });
        }

        let mut date = series.observations()[series.len() - 1].date;
        for step in 1..=horizon_days {
            date = date.next_day().ok_or_else(|| ValidationError::InvalidDate {
                value: format!("{date} + 1 day"),
            })?;
            let estimate = model.estimate(date);
            let width = band(f64::from(step));
            points.push(ForecastPoint {
                date,
                estimate,
                lower: estimate - width,
                upper: estimate + width,
            });
        }

        debug!(
            model = self.name(),
            slope_per_day = model.slope,
            sigma = model.sigma,
            points = points.len(),
            "fitted forecast"
        );
        Ok(Forecast {
            series: ForecastSeries {
                model: self.name().to_owned(),
                horizon_days,
                interval_width: self.interval_width,
                points,
            },
            residuals,
        })
    }
}
