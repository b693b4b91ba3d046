//! # Domain Models
//!
//! Canonical types for the Brent price pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observation`] | One cleaned `(ds, y)` row |
//! | [`ObservationSeries`] | Ordered, unique-by-date, positive-price history |
//! | [`ForecastPoint`] | One `(ds, yhat, yhat_lower, yhat_upper)` row |
//! | [`ForecastSeries`] | History plus horizon produced by a forecaster |
//! | [`DateRange`] | Inclusive picker selection |
//! | [`CalendarDate`] | Day-precision date, `YYYY-MM-DD` on the wire |
//! | [`UtcDateTime`] | UTC instant for metadata |
//!
//! Invariants are enforced at construction:
//!
//! ```rust,ignore
//! use brentwatch_core::{CalendarDate, Observation, ObservationSeries};
//!
//! let day = CalendarDate::parse_dmy("01/01/2020")?;
//! let series = ObservationSeries::new("USD", vec![Observation::new(day, 50.0)?])?;
//! assert_eq!(series.len(), 1);
//! ```

mod calendar_date;
mod range;
mod series;
mod timestamp;

pub use calendar_date::CalendarDate;
pub use range::DateRange;
pub use series::{
    validate_currency_code, Dated, ForecastPoint, ForecastSeries, Observation, ObservationSeries,
};
pub use timestamp::UtcDateTime;
