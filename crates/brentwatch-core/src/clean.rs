//! Table → [`ObservationSeries`] cleaning.
//!
//! Steps, in order:
//! 1. the first row becomes the header and is dropped from the body;
//! 2. the date and value columns are bound through a [`ColumnSchema`];
//! 3. price text is converted to currency units through a [`PriceScale`];
//! 4. date text is parsed as `DD/MM/YYYY`;
//! 5. rows are sorted by date and duplicate dates keep their first occurrence.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::RawTable;
use crate::{CalendarDate, Observation, ObservationSeries, PipelineError, ValidationError};

/// How a column is located in the promoted header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMatch {
    /// Zero-based column index.
    Position(usize),
    /// First column whose lowercased header contains any of these keywords.
    Keyword(Vec<String>),
}

impl ColumnMatch {
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keyword(keywords.into_iter().map(Into::into).collect())
    }

    fn resolve(&self, header: &[String], exclude: Option<usize>) -> Option<usize> {
        match self {
            Self::Position(index) => {
                (*index < header.len() && Some(*index) != exclude).then_some(*index)
            }
            Self::Keyword(keywords) => header.iter().enumerate().find_map(|(index, label)| {
                let label = label.to_lowercase();
                let hit = Some(index) != exclude
                    && keywords
                        .iter()
                        .any(|keyword| label.contains(&keyword.to_lowercase()));
                hit.then_some(index)
            }),
        }
    }
}

impl Display for ColumnMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position(index) => write!(f, "column #{index}"),
            Self::Keyword(keywords) => write!(f, "header containing one of {keywords:?}"),
        }
    }
}

/// Binding of the `ds` (date) and `y` (value) columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub date: ColumnMatch,
    pub value: ColumnMatch,
}

impl ColumnSchema {
    pub fn positional(date: usize, value: usize) -> Self {
        Self {
            date: ColumnMatch::Position(date),
            value: ColumnMatch::Position(value),
        }
    }

    /// Returns `(date_index, value_index)` for `header`.
    pub fn resolve(&self, header: &[String]) -> Result<(usize, usize), PipelineError> {
        let date = self.date.resolve(header, None).ok_or_else(|| {
            PipelineError::Schema(format!(
                "date column ({}) not found in header {header:?}",
                self.date
            ))
        })?;
        let value = self.value.resolve(header, Some(date)).ok_or_else(|| {
            PipelineError::Schema(format!(
                "value column ({}) not found in header {header:?}",
                self.value
            ))
        })?;
        Ok((date, value))
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            date: ColumnMatch::keywords(["data", "date"]),
            value: ColumnMatch::keywords(["preço", "preco", "price"]),
        }
    }
}

/// Unit in which the provider transmits prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceScale {
    /// Separators are stripped and the integer is divided by 100
    /// (`"83,53"` and `"8353"` both become `83.53`).
    #[default]
    Cents,
    /// Text already holds currency units; the last `.` or `,` is the decimal point.
    Units,
}

impl PriceScale {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cents => "cents",
            Self::Units => "units",
        }
    }

    /// Parses a price cell. The error is a human-readable reason.
    pub fn parse_price(self, text: &str) -> Result<f64, String> {
        let compact: String = text
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect();
        let (negative, magnitude) = match compact.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, compact.as_str()),
        };
        if magnitude.is_empty() {
            return Err(String::from("empty value"));
        }
        if !magnitude
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ',')
        {
            return Err(String::from("not a number"));
        }

        let value = match self {
            Self::Cents => {
                let digits: String = magnitude.chars().filter(char::is_ascii_digit).collect();
                let cents = digits
                    .parse::<i64>()
                    .map_err(|_| String::from("not a number"))?;
                cents as f64 / 100.0
            }
            Self::Units => parse_decimal(magnitude).ok_or_else(|| String::from("not a number"))?,
        };
        let value = if negative { -value } else { value };

        if !value.is_finite() {
            return Err(String::from("not finite"));
        }
        if value <= 0.0 {
            return Err(String::from("price must be positive"));
        }
        Ok(value)
    }
}

fn parse_decimal(magnitude: &str) -> Option<f64> {
    let normalized = match magnitude.rfind(['.', ',']) {
        Some(split) => {
            let (whole, fraction) = magnitude.split_at(split);
            let whole: String = whole.chars().filter(char::is_ascii_digit).collect();
            format!("{whole}.{}", &fraction[1..])
        }
        None => magnitude.to_owned(),
    };
    if normalized.starts_with('.') || normalized.ends_with('.') {
        return None;
    }
    normalized.parse::<f64>().ok()
}

impl Display for PriceScale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceScale {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cents" => Ok(Self::Cents),
            "units" => Ok(Self::Units),
            other => Err(ValidationError::InvalidPriceScale {
                value: other.to_owned(),
            }),
        }
    }
}

/// Counters describing one cleaning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CleanReport {
    /// Data rows after header promotion.
    pub rows_in: usize,
    pub duplicates_dropped: usize,
}

/// Cleaner output.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub series: ObservationSeries,
    pub report: CleanReport,
}

/// Converts an extracted table into an [`ObservationSeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaner {
    schema: ColumnSchema,
    scale: PriceScale,
    currency: String,
}

impl Cleaner {
    pub fn new(
        schema: ColumnSchema,
        scale: PriceScale,
        currency: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            schema,
            scale,
            currency: crate::validate_currency_code(currency.as_ref())?,
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn clean(&self, table: &RawTable) -> Result<Cleaned, PipelineError> {
        let Some((header, body)) = table.rows().split_first() else {
            return Err(PipelineError::Extraction(String::from(
                "table has no header row",
            )));
        };
        let (date_index, value_index) = self.schema.resolve(header)?;
        let width = date_index.max(value_index) + 1;

        let mut observations = Vec::with_capacity(body.len());
        for (offset, row) in body.iter().enumerate() {
            let row_number = offset + 1;
            if row.len() < width {
                return Err(PipelineError::Schema(format!(
                    "row {row_number} has {} cells, expected at least {width}",
                    row.len()
                )));
            }

            let date_text = &row[date_index];
            let date = CalendarDate::parse_dmy(date_text).map_err(|_| PipelineError::DateParse {
                row: row_number,
                value: date_text.clone(),
            })?;

            let price_text = &row[value_index];
            let price = self
                .scale
                .parse_price(price_text)
                .map_err(|reason| PipelineError::InvalidPrice {
                    row: row_number,
                    value: price_text.clone(),
                    reason,
                })?;

            observations.push(Observation { date, price });
        }

        // Stable sort keeps source order among equal dates, so dedup keeps the first.
        observations.sort_by_key(|observation| observation.date);
        let before = observations.len();
        observations.dedup_by_key(|observation| observation.date);
        let duplicates_dropped = before - observations.len();
        if duplicates_dropped > 0 {
            warn!(duplicates_dropped, "dropped duplicate dates");
        }

        let series = ObservationSeries::new(&self.currency, observations)?;
        debug!(rows = series.len(), "cleaned series");
        Ok(Cleaned {
            series,
            report: CleanReport {
                rows_in: body.len(),
                duplicates_dropped,
            },
        })
    }
}
