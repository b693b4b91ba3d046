use serde::{Deserialize, Serialize};

use crate::forecast::Forecast;
use crate::PipelineError;

/// In-sample residual summary of a fitted forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastDiagnostics {
    pub residuals: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub mae: f64,
    pub rmse: f64,
    /// `None` with fewer than two residuals or zero residual variance.
    pub lag1_autocorrelation: Option<f64>,
}

pub fn forecast_diagnostics(forecast: &Forecast) -> Result<ForecastDiagnostics, PipelineError> {
    let residuals = &forecast.residuals;
    if residuals.is_empty() {
        return Err(PipelineError::insufficient("diagnostics", 1, 0));
    }

    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let variance = residuals.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
    let mae = residuals.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (residuals.iter().map(|e| e * e).sum::<f64>() / n).sqrt();

    let lag1_autocorrelation = if residuals.len() >= 2 && variance > 0.0 {
        let lagged: f64 = residuals
            .windows(2)
            .map(|pair| (pair[0] - mean) * (pair[1] - mean))
            .sum();
        Some(lagged / (variance * n))
    } else {
        None
    };

    Ok(ForecastDiagnostics {
        residuals: residuals.len(),
        mean,
        std_dev: variance.sqrt(),
        mae,
        rmse,
        lag1_autocorrelation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForecastSeries;

    fn forecast(residuals: Vec<f64>) -> Forecast {
        Forecast {
            series: ForecastSeries {
                model: String::from("test"),
                horizon_days: 0,
                interval_width: 0.8,
                points: Vec::new(),
            },
            residuals,
        }
    }

    #[test]
    fn summarises_residuals() {
        let diagnostics = forecast_diagnostics(&forecast(vec![1.0, -1.0, 1.0, -1.0]))
            .expect("must summarise");
        assert_eq!(diagnostics.residuals, 4);
        assert_eq!(diagnostics.mean, 0.0);
        assert_eq!(diagnostics.mae, 1.0);
        assert_eq!(diagnostics.rmse, 1.0);
        assert_eq!(diagnostics.std_dev, 1.0);
        assert_eq!(diagnostics.lag1_autocorrelation, Some(-0.75));
    }

    #[test]
    fn perfect_fit_has_no_autocorrelation() {
        let diagnostics =
            forecast_diagnostics(&forecast(vec![0.0; 5])).expect("must summarise");
        assert_eq!(diagnostics.rmse, 0.0);
        assert_eq!(diagnostics.lag1_autocorrelation, None);
    }

    #[test]
    fn empty_residuals_are_insufficient_data() {
        assert!(matches!(
            forecast_diagnostics(&forecast(Vec::new())),
            Err(PipelineError::InsufficientData { .. })
        ));
    }
}
