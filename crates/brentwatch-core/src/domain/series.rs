use serde::{Deserialize, Serialize};

use crate::{CalendarDate, DateRange, ValidationError};

/// Anything positioned on the calendar, so range filters work over any series.
pub trait Dated {
    fn date(&self) -> CalendarDate;
}

/// One cleaned `(ds, y)` row of the historical price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "ds")]
    pub date: CalendarDate,
    #[serde(rename = "y")]
    pub price: f64,
}

impl Observation {
    pub fn new(date: CalendarDate, price: f64) -> Result<Self, ValidationError> {
        validate_positive("y", price)?;
        Ok(Self { date, price })
    }
}

impl Dated for Observation {
    fn date(&self) -> CalendarDate {
        self.date
    }
}

/// Cleaned historical series: strictly increasing dates, positive finite prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSeries {
    currency: String,
    observations: Vec<Observation>,
}

impl ObservationSeries {
    /// Column labels handed to forecasters and charts.
    pub const COLUMNS: [&'static str; 2] = ["ds", "y"];

    pub fn new(
        currency: impl AsRef<str>,
        observations: Vec<Observation>,
    ) -> Result<Self, ValidationError> {
        let currency = validate_currency_code(currency.as_ref())?;
        for observation in &observations {
            validate_positive("y", observation.price)?;
        }
        if let Some(index) = observations
            .windows(2)
            .position(|pair| pair[0].date >= pair[1].date)
        {
            return Err(ValidationError::UnorderedSeries { index: index + 1 });
        }

        Ok(Self {
            currency,
            observations,
        })
    }

    /// Empty series used when fetching or extraction degrades.
    pub fn empty(currency: impl AsRef<str>) -> Result<Self, ValidationError> {
        Self::new(currency, Vec::new())
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|observation| observation.price)
    }

    /// Observed min/max dates, the bounds offered to date pickers.
    pub fn bounds(&self) -> Option<DateRange> {
        DateRange::bounds_of(&self.observations)
    }

    pub fn price_on(&self, date: CalendarDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |observation| observation.date)
            .ok()
            .map(|index| self.observations[index].price)
    }

    /// Sub-series within `range`; empty when the range is inverted.
    pub fn filter(&self, range: &DateRange) -> Self {
        Self {
            currency: self.currency.clone(),
            observations: crate::analytics::filter_range(&self.observations, range),
        }
    }
}

/// One `(ds, yhat, yhat_lower, yhat_upper)` forecast row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "ds")]
    pub date: CalendarDate,
    #[serde(rename = "yhat")]
    pub estimate: f64,
    #[serde(rename = "yhat_lower")]
    pub lower: f64,
    #[serde(rename = "yhat_upper")]
    pub upper: f64,
}

impl Dated for ForecastPoint {
    fn date(&self) -> CalendarDate {
        self.date
    }
}

/// Model output spanning the observed range plus the requested horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub model: String,
    pub horizon_days: u32,
    pub interval_width: f64,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points strictly after `date`, i.e. the extrapolated part.
    pub fn after(&self, date: CalendarDate) -> &[ForecastPoint] {
        let start = self.points.partition_point(|point| point.date <= date);
        &self.points[start..]
    }
}

/// Validate and normalize currency to uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveValue { field });
    }
    Ok(())
}
