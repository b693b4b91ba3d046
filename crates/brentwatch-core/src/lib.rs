//! Core contracts for brentwatch.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The fetch → extract → clean pipeline and its error taxonomy
//! - Forecasting and analytics over the cleaned series
//! - The dashboard session, panels and response envelope

pub mod analytics;
pub mod cache;
pub mod clean;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod forecast;
pub mod http_client;
pub mod indicators;
pub mod panel;
pub mod session;

pub use cache::{CacheMode, CachedSeries, SeriesCache};
pub use clean::{CleanReport, Cleaned, Cleaner, ColumnMatch, ColumnSchema, PriceScale};
pub use config::DashboardConfig;
pub use domain::{
    validate_currency_code, CalendarDate, DateRange, Dated, ForecastPoint, ForecastSeries,
    Observation, ObservationSeries, UtcDateTime,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{PipelineError, PipelineErrorKind, ValidationError};
pub use extract::{extract_table, RawTable, TableSelector};
pub use fetcher::{FetchedPage, Fetcher};
pub use forecast::{Forecast, Forecaster, TrendSeasonalForecaster, MAX_HORIZON_DAYS};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient,
};
pub use indicators::{IndicatorRow, IndicatorTable};
pub use panel::{Dashboard, Panel, PanelContent, PanelId};
pub use session::{DashboardSession, LoadOutcome, PanelRequest};
