//! Dashboard panels.
//!
//! Each panel is computed by a pure function over explicit inputs (the
//! cleaned series, the shared forecast, the selected range) so no panel
//! depends on another having run first.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analytics::{
    self, CorrelationMatrix, Decomposition, ForecastDiagnostics, Histogram, MonthlyMean,
    YearlyExtrema,
};
use crate::config::DashboardConfig;
use crate::forecast::Forecast;
use crate::indicators::IndicatorTable;
use crate::{
    DateRange, EnvelopeError, ForecastPoint, ForecastSeries, Observation, ObservationSeries,
    PipelineError, ValidationError,
};

/// Panels in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelId {
    Observed,
    Forecast,
    Overview,
    Trend,
    Seasonality,
    Distribution,
    Correlation,
    YearlyExtrema,
    Decomposition,
    Diagnostics,
}

impl PanelId {
    pub const ALL: [Self; 10] = [
        Self::Observed,
        Self::Forecast,
        Self::Overview,
        Self::Trend,
        Self::Seasonality,
        Self::Distribution,
        Self::Correlation,
        Self::YearlyExtrema,
        Self::Decomposition,
        Self::Diagnostics,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Forecast => "forecast",
            Self::Overview => "overview",
            Self::Trend => "trend",
            Self::Seasonality => "seasonality",
            Self::Distribution => "distribution",
            Self::Correlation => "correlation",
            Self::YearlyExtrema => "yearly_extrema",
            Self::Decomposition => "decomposition",
            Self::Diagnostics => "diagnostics",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Observed => "Brent spot price (USD/bbl)",
            Self::Forecast => "Price forecast",
            Self::Overview => "Observed vs forecast",
            Self::Trend => "Price trend over the selected range",
            Self::Seasonality => "Monthly mean price",
            Self::Distribution => "Price distribution over the selected range",
            Self::Correlation => "Correlation with indicators",
            Self::YearlyExtrema => "Yearly maximum and minimum",
            Self::Decomposition => "Seasonal decomposition of monthly means",
            Self::Diagnostics => "Forecast residual diagnostics",
        }
    }

    /// Panels that read the shared forecast.
    pub const fn needs_forecast(self) -> bool {
        matches!(self, Self::Forecast | Self::Overview | Self::Diagnostics)
    }
}

impl Display for PanelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidPanel {
                value: value.to_owned(),
            })
    }
}

/// Chart-ready payload of one panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelContent {
    Observations {
        observations: Vec<Observation>,
    },
    Forecast(ForecastSeries),
    Overview {
        observed: Vec<Observation>,
        forecast: Vec<ForecastPoint>,
    },
    Monthly {
        months: Vec<MonthlyMean>,
    },
    Histogram(Histogram),
    Correlation {
        synthetic: bool,
        matrix: CorrelationMatrix,
    },
    Extrema(YearlyExtrema),
    Decomposition(Decomposition),
    Diagnostics(ForecastDiagnostics),
    /// The panel's stage failed; the error is also listed on the dashboard.
    Unavailable {
        code: String,
        message: String,
    },
}

impl PanelContent {
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub id: PanelId,
    pub title: &'static str,
    pub content: PanelContent,
}

/// Everything a render needs: the effective range, the panels in display
/// order, and every error raised while loading or computing them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// `None` when there is no data to bound the pickers.
    pub range: Option<DateRange>,
    pub panels: Vec<Panel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl Dashboard {
    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|panel| panel.id == id)
    }
}

/// Inputs shared by every panel of one build.
pub(crate) struct PanelInputs<'a> {
    pub series: &'a ObservationSeries,
    pub forecast: Option<&'a Result<Forecast, PipelineError>>,
    pub range: Option<DateRange>,
    pub config: &'a DashboardConfig,
}

impl PanelInputs<'_> {
    fn forecast(&self) -> Result<&Forecast, PipelineError> {
        match self.forecast {
            Some(Ok(forecast)) => Ok(forecast),
            Some(Err(error)) => Err(error.clone()),
            None => Err(PipelineError::insufficient("forecast", 2, self.series.len())),
        }
    }

    fn selected(&self) -> ObservationSeries {
        match &self.range {
            Some(range) => self.series.filter(range),
            None => self.series.clone(),
        }
    }
}

pub(crate) fn compute(
    id: PanelId,
    inputs: &PanelInputs<'_>,
) -> Result<PanelContent, PipelineError> {
    match id {
        PanelId::Observed => observed(inputs.series),
        PanelId::Forecast => Ok(PanelContent::Forecast(inputs.forecast()?.series.clone())),
        PanelId::Overview => {
            let forecast = inputs.forecast()?;
            Ok(PanelContent::Overview {
                observed: inputs.series.observations().to_vec(),
                forecast: forecast.series.points.clone(),
            })
        }
        PanelId::Trend => Ok(PanelContent::Observations {
            observations: inputs.selected().observations().to_vec(),
        }),
        PanelId::Seasonality => Ok(PanelContent::Monthly {
            months: analytics::monthly_means(inputs.series)?,
        }),
        PanelId::Distribution => Ok(PanelContent::Histogram(analytics::price_histogram(
            &inputs.selected(),
            inputs.config.histogram_bins,
        )?)),
        PanelId::Correlation => correlation(inputs.series, inputs.config),
        PanelId::YearlyExtrema => Ok(PanelContent::Extrema(analytics::yearly_extrema(
            inputs.series,
        )?)),
        PanelId::Decomposition => {
            let months = analytics::monthly_means(inputs.series)?;
            Ok(PanelContent::Decomposition(analytics::seasonal_decomposition(
                &months,
                inputs.config.decomposition_period,
            )?))
        }
        PanelId::Diagnostics => Ok(PanelContent::Diagnostics(analytics::forecast_diagnostics(
            inputs.forecast()?,
        )?)),
    }
}

fn observed(series: &ObservationSeries) -> Result<PanelContent, PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::insufficient("observed", 1, 0));
    }
    Ok(PanelContent::Observations {
        observations: series.observations().to_vec(),
    })
}

fn correlation(
    series: &ObservationSeries,
    config: &DashboardConfig,
) -> Result<PanelContent, PipelineError> {
    let Some(first) = series.first() else {
        return Err(PipelineError::insufficient("correlation", 2, 0));
    };
    let periods = series.len().min(config.indicator_max_periods);
    let indicators = IndicatorTable::synthetic(first.date, periods, config.indicator_seed);
    let matrix = analytics::correlation_matrix(series, &indicators)?;
    Ok(PanelContent::Correlation {
        synthetic: indicators.is_synthetic(),
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_their_names() {
        for id in PanelId::ALL {
            assert_eq!(id.as_str().parse::<PanelId>().expect("known panel"), id);
        }
        assert_eq!(
            "Yearly-Extrema".parse::<PanelId>().expect("normalized"),
            PanelId::YearlyExtrema
        );
        assert!(matches!(
            "heatmap".parse::<PanelId>(),
            Err(ValidationError::InvalidPanel { .. })
        ));
    }

    #[test]
    fn display_order_matches_declaration_order() {
        let mut sorted = PanelId::ALL;
        sorted.sort();
        assert_eq!(sorted, PanelId::ALL);
    }

    #[test]
    fn unavailable_content_is_tagged() {
        let content = PanelContent::Unavailable {
            code: String::from("insufficient_data"),
            message: String::from("no rows"),
        };
        let json = serde_json::to_value(&content).expect("serializes");
        assert_eq!(json["kind"], "unavailable");
        assert!(!content.is_available());
    }
}
