//! Dashboard configuration.
//!
//! Defaults point at the IPEA Brent series. [`DashboardConfig::from_env`]
//! overlays `BRENTWATCH_*` environment variables; the CLI applies its flags on
//! top of that.

use serde::{Deserialize, Serialize};

use crate::clean::{ColumnSchema, PriceScale};
use crate::extract::{TableSelector, DEFAULT_TABLE_SELECTOR};
use crate::forecast::{check_horizon, DEFAULT_HORIZON_DAYS};
use crate::{validate_currency_code, ValidationError};

/// Daily Brent spot price (FOB), USD per barrel.
pub const DEFAULT_SOURCE_URL: &str =
    "http://www.ipeadata.gov.br/ExibeSerie.aspx?module=m&serid=1650971490&oper=view";

pub const ENV_SOURCE_URL: &str = "BRENTWATCH_SOURCE_URL";
pub const ENV_TABLE_SELECTOR: &str = "BRENTWATCH_TABLE_SELECTOR";
pub const ENV_HORIZON_DAYS: &str = "BRENTWATCH_HORIZON_DAYS";
pub const ENV_PRICE_SCALE: &str = "BRENTWATCH_PRICE_SCALE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub source_url: String,
    pub table_selector: String,
    pub columns: ColumnSchema,
    pub price_scale: PriceScale,
    pub currency: String,
    pub horizon_days: u32,
    pub indicator_seed: u64,
    pub indicator_max_periods: usize,
    /// `None` selects Sturges' rule.
    pub histogram_bins: Option<usize>,
    pub decomposition_period: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_url: String::from(DEFAULT_SOURCE_URL),
            table_selector: String::from(DEFAULT_TABLE_SELECTOR),
            columns: ColumnSchema::default(),
            price_scale: PriceScale::default(),
            currency: String::from("USD"),
            horizon_days: DEFAULT_HORIZON_DAYS,
            indicator_seed: 0,
            indicator_max_periods: 400,
            histogram_bins: None,
            decomposition_period: 12,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each `BRENTWATCH_*`
    /// key. Blank values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(url) = read(ENV_SOURCE_URL) {
            config.source_url = url;
        }
        if let Some(selector) = read(ENV_TABLE_SELECTOR) {
            config.table_selector = selector;
        }
        if let Some(horizon) = read(ENV_HORIZON_DAYS) {
            config.horizon_days = parse_horizon(&horizon)?;
        }
        if let Some(scale) = read(ENV_PRICE_SCALE) {
            config.price_scale = scale.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks fields that would otherwise fail deep inside the pipeline.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.source_url.starts_with("http://") && !self.source_url.starts_with("https://") {
            return Err(ValidationError::InvalidConfig {
                key: "source_url",
                value: self.source_url.clone(),
            });
        }
        TableSelector::parse(&self.table_selector)?;
        validate_currency_code(&self.currency)?;
        check_horizon(self.horizon_days)?;
        if self.histogram_bins == Some(0) {
            return Err(ValidationError::ZeroBins);
        }
        if self.decomposition_period < 2 {
            return Err(ValidationError::InvalidPeriod);
        }
        Ok(())
    }
}

/// Horizon in days, at most [`MAX_HORIZON_DAYS`](crate::forecast::MAX_HORIZON_DAYS).
/// Zero is allowed and yields an in-sample-only forecast.
pub fn parse_horizon(value: &str) -> Result<u32, ValidationError> {
    let days = value
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidConfig {
            key: "horizon_days",
            value: value.to_owned(),
        })?;
    check_horizon(days)
}
