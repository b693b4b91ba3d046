use brentwatch_core::{CacheMode, DashboardSession, PanelRequest};

use crate::cli::DashboardArgs;
use crate::error::CliError;

use super::{to_range, CommandResult};

pub async fn run(
    args: &DashboardArgs,
    session: &DashboardSession,
) -> Result<CommandResult, CliError> {
    let outcome = session.load(CacheMode::Use).await;
    let request = PanelRequest {
        range: to_range(&args.range),
        horizon_days: args.horizon,
        panels: args.panels.clone(),
    };
    let mut dashboard = session.build(&outcome, &request);

    // Load errors are already on the dashboard; the envelope carries them once.
    let errors = std::mem::take(&mut dashboard.errors);
    let data = serde_json::to_value(&dashboard)?;

    Ok(CommandResult::ok(data)
        .with_errors(errors)
        .with_warnings(outcome.warnings)
        .with_latency(outcome.latency_ms)
        .with_cache_hit(outcome.cache_hit))
}
