//! One interactive dashboard session.
//!
//! [`DashboardSession::load`] runs fetch → extract → clean behind the
//! [`SeriesCache`] and never fails: any stage error degrades to an empty
//! series plus a reported error. [`DashboardSession::build`] derives the
//! panels from a [`LoadOutcome`] and a [`PanelRequest`].

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheMode, CachedSeries, SeriesCache};
use crate::clean::{Cleaned, Cleaner};
use crate::config::DashboardConfig;
use crate::extract::{extract_table, TableSelector};
use crate::fetcher::Fetcher;
use crate::forecast::{Forecaster, TrendSeasonalForecaster};
use crate::http_client::HttpClient;
use crate::panel::{self, Dashboard, Panel, PanelContent, PanelId, PanelInputs};
use crate::{DateRange, EnvelopeError, ObservationSeries, PipelineError, ValidationError};

/// Result of one load. `series` is empty whenever `errors` is not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadOutcome {
    pub series: ObservationSeries,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub cache_hit: bool,
    pub latency_ms: u64,
}

impl LoadOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// What to render. Defaults to every panel over the full observed range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelRequest {
    pub range: Option<DateRange>,
    /// Overrides [`DashboardConfig::horizon_days`].
    pub horizon_days: Option<u32>,
    /// Subset of panels; empty selects all. Display order is always fixed.
    pub panels: Vec<PanelId>,
}

impl PanelRequest {
    fn selected(&self) -> Vec<PanelId> {
        PanelId::ALL
            .into_iter()
            .filter(|id| self.panels.is_empty() || self.panels.contains(id))
            .collect()
    }
}

struct StageFailure {
    stage: &'static str,
    error: PipelineError,
}

impl StageFailure {
    fn at(stage: &'static str) -> impl FnOnce(PipelineError) -> Self {
        move |error| Self { stage, error }
    }
}

pub struct DashboardSession {
    config: DashboardConfig,
    fetcher: Fetcher,
    selector: TableSelector,
    cleaner: Cleaner,
    cache: SeriesCache,
    forecaster: Box<dyn Forecaster>,
    empty: ObservationSeries,
}

impl DashboardSession {
    pub fn new(
        config: DashboardConfig,
        client: Arc<dyn HttpClient>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let selector = TableSelector::parse(&config.table_selector)?;
        let cleaner = Cleaner::new(config.columns.clone(), config.price_scale, &config.currency)?;
        let empty = ObservationSeries::empty(cleaner.currency())?;
        Ok(Self {
            fetcher: Fetcher::new(client, config.source_url.clone()),
            config,
            selector,
            cleaner,
            cache: SeriesCache::new(),
            forecaster: Box::new(TrendSeasonalForecaster::default()),
            empty,
        })
    }

    pub fn with_forecaster(mut self, forecaster: Box<dyn Forecaster>) -> Self {
        self.forecaster = forecaster;
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn source_url(&self) -> &str {
        self.fetcher.url()
    }

    pub fn forecaster(&self) -> &dyn Forecaster {
        self.forecaster.as_ref()
    }

    /// Loads the series, from the memo unless `mode` is [`CacheMode::Reload`].
    pub async fn load(&self, mode: CacheMode) -> LoadOutcome {
        let started = Instant::now();
        match mode {
            CacheMode::Reload => {
                info!("reload requested; dropping memoized series");
                self.cache.invalidate().await;
            }
            CacheMode::Use => {
                if let Some(cached) = self.cache.get().await {
                    debug!(rows = cached.series.len(), "series cache hit");
                    return LoadOutcome {
                        series: cached.series,
                        errors: Vec::new(),
                        warnings: cached.warnings,
                        cache_hit: true,
                        latency_ms: elapsed_ms(started),
                    };
                }
            }
        }

        match self.fetch_and_clean().await {
            Ok(loaded) => {
                self.cache.put(loaded.clone()).await;
                info!(rows = loaded.series.len(), "series loaded");
                LoadOutcome {
                    series: loaded.series,
                    errors: Vec::new(),
                    warnings: loaded.warnings,
                    cache_hit: false,
                    latency_ms: elapsed_ms(started),
                }
            }
            Err(failure) => {
                warn!(
                    stage = failure.stage,
                    code = failure.error.code(),
                    error = %failure.error,
                    "load degraded to an empty series"
                );
                LoadOutcome {
                    series: self.empty.clone(),
                    errors: vec![
                        EnvelopeError::from_pipeline(&failure.error).with_stage(failure.stage)
                    ],
                    warnings: Vec::new(),
                    cache_hit: false,
                    latency_ms: elapsed_ms(started),
                }
            }
        }
    }

    async fn fetch_and_clean(&self) -> Result<CachedSeries, StageFailure> {
        let page = self.fetcher.fetch().await.map_err(StageFailure::at("fetch"))?;
        let table = extract_table(&page.body, &self.selector).map_err(StageFailure::at("extract"))?;
        debug!(rows = table.len(), "extracted table");
        let cleaned = self.cleaner.clean(&table).map_err(StageFailure::at("clean"))?;
        Ok(cached_with_warnings(cleaned))
    }

    /// Extract + clean over an already fetched page.
    pub fn prepare(&self, html: &str) -> Result<Cleaned, PipelineError> {
        let table = extract_table(html, &self.selector)?;
        self.cleaner.clean(&table)
    }

    /// Derives the requested panels. Panel failures render as
    /// [`PanelContent::Unavailable`] and are appended to the dashboard errors.
    pub fn build(&self, outcome: &LoadOutcome, request: &PanelRequest) -> Dashboard {
        let series = &outcome.series;
        let range = series
            .bounds()
            .map(|bounds| request.range.map_or(bounds, |range| range.clamp_to(&bounds)));
        let selected = request.selected();

        let horizon = request.horizon_days.unwrap_or(self.config.horizon_days);
        let forecast = selected
            .iter()
            .any(|id| id.needs_forecast())
            .then(|| self.forecaster.forecast(series, horizon));

        let inputs = PanelInputs {
            series,
            forecast: forecast.as_ref(),
            range,
            config: &self.config,
        };

        let mut errors = outcome.errors.clone();
        let panels = selected
            .into_iter()
            .map(|id| {
                let content = panel::compute(id, &inputs).unwrap_or_else(|error| {
                    debug!(panel = id.as_str(), code = error.code(), "panel unavailable");
                    errors.push(EnvelopeError::from_pipeline(&error).with_stage(id.as_str()));
                    PanelContent::Unavailable {
                        code: error.code().to_owned(),
                        message: error.to_string(),
                    }
                });
                Panel {
                    id,
                    title: id.title(),
                    content,
                }
            })
            .collect();

        Dashboard {
            range,
            panels,
            errors,
        }
    }

    /// Runs the forecaster alone over `series`.
    pub fn forecast(
        &self,
        series: &ObservationSeries,
        horizon_days: Option<u32>,
    ) -> Result<crate::forecast::Forecast, PipelineError> {
        self.forecaster
            .forecast(series, horizon_days.unwrap_or(self.config.horizon_days))
    }
}

fn cached_with_warnings(cleaned: Cleaned) -> CachedSeries {
    let mut warnings = Vec::new();
    if cleaned.report.duplicates_dropped > 0 {
        warnings.push(format!(
            "dropped {} rows with duplicate dates",
            cleaned.report.duplicates_dropped
        ));
    }
    if cleaned.series.is_empty() {
        warnings.push(String::from("source table has no data rows"));
    }
    CachedSeries {
        series: cleaned.series,
        warnings,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
