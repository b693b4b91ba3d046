//! Export the cleaned series and forecast to CSV.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use brentwatch_core::{
    CacheMode, DashboardSession, EnvelopeError, ForecastPoint, Observation, ObservationSeries,
};

use crate::cli::ExportArgs;
use crate::error::CliError;

use super::CommandResult;

pub const OBSERVATIONS_FILE: &str = "observations.csv";
pub const FORECAST_FILE: &str = "forecast.csv";

pub async fn run(args: &ExportArgs, session: &DashboardSession) -> Result<CommandResult, CliError> {
    let outcome = session.load(CacheMode::Use).await;
    let mut errors = outcome.errors;

    if outcome.series.is_empty() {
        return Ok(CommandResult::ok(serde_json::json!({
            "output_dir": args.output_dir.display().to_string(),
            "exported": false,
        }))
        .with_errors(errors)
        .with_warnings(outcome.warnings)
        .with_latency(outcome.latency_ms)
        .with_cache_hit(outcome.cache_hit));
    }

    fs::create_dir_all(&args.output_dir)?;
    let observations_path = args.output_dir.join(OBSERVATIONS_FILE);
    write_observations(&observations_path, outcome.series.observations())?;

    let forecast_rows = match session.forecast(&outcome.series, args.horizon) {
        Ok(forecast) => {
            write_forecast(&args.output_dir.join(FORECAST_FILE), &forecast.series.points)?;
            Some(forecast.series.points.len())
        }
        Err(error) => {
            errors.push(EnvelopeError::from_pipeline(&error).with_stage("forecast"));
            None
        }
    };

    Ok(CommandResult::ok(summary(args, &outcome.series, forecast_rows))
        .with_errors(errors)
        .with_warnings(outcome.warnings)
        .with_latency(outcome.latency_ms)
        .with_cache_hit(outcome.cache_hit))
}

fn summary(
    args: &ExportArgs,
    series: &ObservationSeries,
    forecast_rows: Option<usize>,
) -> serde_json::Value {
    serde_json::json!({
        "output_dir": args.output_dir.display().to_string(),
        "exported": true,
        "files": {
            OBSERVATIONS_FILE: series.len(),
            FORECAST_FILE: forecast_rows,
        },
    })
}

fn write_observations(path: &Path, observations: &[Observation]) -> Result<(), CliError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "ds,y")?;
    for observation in observations {
        writeln!(writer, "{},{}", observation.date, observation.price)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_forecast(path: &Path, points: &[ForecastPoint]) -> Result<(), CliError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "ds,yhat,yhat_lower,yhat_upper")?;
    for point in points {
        writeln!(
            writer,
            "{},{},{},{}",
            point.date, point.estimate, point.lower, point.upper
        )?;
    }
    writer.flush()?;
    Ok(())
}
