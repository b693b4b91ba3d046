use brentwatch_core::{CacheMode, DashboardSession, EnvelopeError, ForecastPoint};
use serde::Serialize;

use crate::cli::ForecastArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ForecastResponseData<'a> {
    model: &'a str,
    horizon_days: u32,
    interval_width: f64,
    points: &'a [ForecastPoint],
}

pub async fn run(
    args: &ForecastArgs,
    session: &DashboardSession,
) -> Result<CommandResult, CliError> {
    let outcome = session.load(CacheMode::Use).await;
    let mut errors = outcome.errors;
    let horizon_days = args.horizon.unwrap_or(session.config().horizon_days);

    let data = match session.forecast(&outcome.series, Some(horizon_days)) {
        Ok(forecast) => {
            let points = match (args.future_only, outcome.series.last()) {
                (true, Some(last)) => forecast.series.after(last.date),
                _ => forecast.series.points.as_slice(),
            };
            serde_json::to_value(ForecastResponseData {
                model: &forecast.series.model,
                horizon_days,
                interval_width: forecast.series.interval_width,
                points,
            })?
        }
        Err(error) => {
            errors.push(EnvelopeError::from_pipeline(&error).with_stage("forecast"));
            serde_json::to_value(ForecastResponseData {
                model: session.forecaster().name(),
                horizon_days,
                interval_width: 0.0,
                points: &[],
            })?
        }
    };

    Ok(CommandResult::ok(data)
        .with_errors(errors)
        .with_warnings(outcome.warnings)
        .with_latency(outcome.latency_ms)
        .with_cache_hit(outcome.cache_hit))
}
