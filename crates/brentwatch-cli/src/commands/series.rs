use brentwatch_core::{CacheMode, DashboardSession, DateRange, Observation};
use serde::Serialize;

use crate::cli::SeriesArgs;
use crate::error::CliError;

use super::{to_range, CommandResult};

#[derive(Debug, Serialize)]
struct SeriesResponseData<'a> {
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<DateRange>,
    observations: &'a [Observation],
}

pub async fn run(args: &SeriesArgs, session: &DashboardSession) -> Result<CommandResult, CliError> {
    let outcome = session.load(CacheMode::Use).await;

    let range = outcome
        .series
        .bounds()
        .map(|bounds| to_range(&args.range).map_or(bounds, |range| range.clamp_to(&bounds)));
    let selected = match &range {
        Some(range) => outcome.series.filter(range),
        None => outcome.series.clone(),
    };

    let data = serde_json::to_value(SeriesResponseData {
        currency: selected.currency(),
        range,
        observations: selected.observations(),
    })?;

    Ok(CommandResult::ok(data)
        .with_errors(outcome.errors)
        .with_warnings(outcome.warnings)
        .with_latency(outcome.latency_ms)
        .with_cache_hit(outcome.cache_hit))
}
