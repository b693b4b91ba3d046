mod dashboard;
mod export;
mod forecast;
mod series;

use std::sync::Arc;

use brentwatch_core::{
    DashboardConfig, DashboardSession, DateRange, Envelope, EnvelopeError, HttpClient,
    ReqwestHttpClient,
};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command, RangeArgs};
use crate::error::CliError;
use crate::metadata::Metadata;

pub const SCHEMA_VERSION: &str = "v1.0.0";

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            cache_hit: false,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    run_with_client(cli, Arc::new(ReqwestHttpClient::new())).await
}

pub async fn run_with_client(
    cli: &Cli,
    client: Arc<dyn HttpClient>,
) -> Result<Envelope<Value>, CliError> {
    let config = resolve_config(cli)?;
    debug!(
        source = %config.source_url,
        selector = %config.table_selector,
        scale = %config.price_scale,
        "resolved configuration"
    );
    let session = DashboardSession::new(config, client)?;

    let command_result = match &cli.command {
        Command::Dashboard(args) => dashboard::run(args, &session).await?,
        Command::Series(args) => series::run(args, &session).await?,
        Command::Forecast(args) => forecast::run(args, &session).await?,
        Command::Export(args) => export::run(args, &session).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
        cache_hit,
    } = command_result;

    let mut metadata = Metadata::new(session.source_url(), latency_ms, cache_hit);
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let meta = metadata.into_envelope_meta(SCHEMA_VERSION)?;
    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

/// Environment layer first, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<DashboardConfig, CliError> {
    let mut config = DashboardConfig::from_env()?;
    if let Some(url) = &cli.source_url {
        config.source_url = url.clone();
    }
    if let Some(selector) = &cli.selector {
        config.table_selector = selector.clone();
    }
    if let Some(scale) = cli.price_scale {
        config.price_scale = scale;
    }
    config.validate()?;
    Ok(config)
}

/// `None` when neither picker is set; a single picker is completed with the
/// far end of the calendar and clamped later.
fn to_range(args: &RangeArgs) -> Option<DateRange> {
    match (args.start, args.end) {
        (None, None) => None,
        (start, end) => Some(DateRange::new(
            start.unwrap_or(brentwatch_core::CalendarDate::MIN),
            end.unwrap_or(brentwatch_core::CalendarDate::MAX),
        )),
    }
}
