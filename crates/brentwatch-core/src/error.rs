use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation and contract errors exposed by `brentwatch-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid calendar date '{value}'")]
    InvalidDate { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be positive")]
    NonPositiveValue { field: &'static str },

    #[error("series dates must be strictly increasing (index {index})")]
    UnorderedSeries { index: usize },

    #[error("invalid table selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("invalid price scale '{value}', expected one of cents, units")]
    InvalidPriceScale { value: String },
    #[error("invalid panel '{value}'")]
    InvalidPanel { value: String },
    #[error("invalid value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },

    #[error("horizon of {value} days exceeds the maximum of {max}")]
    HorizonTooLong { value: u32, max: u32 },

    #[error("histogram needs at least one bin")]
    ZeroBins,
    #[error("decomposition period must be at least 2")]
    InvalidPeriod,
    #[error("indicator row {index} has {found} values, expected {expected}")]
    IndicatorWidth {
        index: usize,
        found: usize,
        expected: usize,
    },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("trace_id must be 32 hex characters")]
    InvalidTraceId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("source cannot be empty")]
    EmptySource,

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Pipeline stage failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineErrorKind {
    Transport,
    Extraction,
    Schema,
    DateParse,
    InvalidPrice,
    InsufficientData,
    Validation,
}

/// Errors raised by the fetch → extract → clean → analyse pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("transport error fetching {url}: {message}")]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("row {row}: cannot parse date '{value}', expected DD/MM/YYYY")]
    DateParse { row: usize, value: String },

    #[error("row {row}: invalid price '{value}': {reason}")]
    InvalidPrice {
        row: usize,
        value: String,
        reason: String,
    },

    #[error("insufficient data for {stage}: need at least {required} rows, found {available}")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        available: usize,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PipelineError {
    pub fn insufficient(stage: &'static str, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            stage,
            required,
            available,
        }
    }

    pub const fn kind(&self) -> PipelineErrorKind {
        match self {
            Self::Transport { .. } => PipelineErrorKind::Transport,
            Self::Extraction(_) => PipelineErrorKind::Extraction,
            Self::Schema(_) => PipelineErrorKind::Schema,
            Self::DateParse { .. } => PipelineErrorKind::DateParse,
            Self::InvalidPrice { .. } => PipelineErrorKind::InvalidPrice,
            Self::InsufficientData { .. } => PipelineErrorKind::InsufficientData,
            Self::Validation(_) => PipelineErrorKind::Validation,
        }
    }

    /// Stable machine-readable code used in envelopes and stream events.
    pub const fn code(&self) -> &'static str {
        match self.kind() {
            PipelineErrorKind::Transport => "transport_error",
            PipelineErrorKind::Extraction => "extraction_error",
            PipelineErrorKind::Schema => "schema_error",
            PipelineErrorKind::DateParse => "date_parse_error",
            PipelineErrorKind::InvalidPrice => "invalid_price",
            PipelineErrorKind::InsufficientData => "insufficient_data",
            PipelineErrorKind::Validation => "validation_error",
        }
    }

    /// Only a user-initiated reload can recover from these.
    pub const fn is_reloadable(&self) -> bool {
        matches!(self.kind(), PipelineErrorKind::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_snake_case() {
        let error = PipelineError::Transport {
            url: String::from("http://example.test"),
            status: Some(404),
            message: String::from("HTTP 404"),
        };
        assert_eq!(error.code(), "transport_error");
        assert!(error.is_reloadable());

        let error = PipelineError::insufficient("correlation", 2, 0);
        assert_eq!(error.kind(), PipelineErrorKind::InsufficientData);
        assert_eq!(error.code(), "insufficient_data");
        assert!(!error.is_reloadable());
    }

    #[test]
    fn validation_errors_convert_transparently() {
        let error = PipelineError::from(ValidationError::ZeroBins);
        assert_eq!(error.kind(), PipelineErrorKind::Validation);
        assert_eq!(error.to_string(), "histogram needs at least one bin");
    }
}
