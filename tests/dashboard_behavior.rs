//! Behavior-driven tests for the dashboard session
//!
//! These tests verify what a user sees across interactions: the fixed panel
//! order, memoization across range changes, reload, and range clamping.

use brentwatch_core::{IndicatorTable, Observation, ObservationSeries};
use brentwatch_tests::*;

fn two_years_page() -> String {
    brent_page(&daily_rows(date(2018, 1, 1), 730))
}

// =============================================================================
// Dashboard: Panels
// =============================================================================

#[tokio::test]
async fn when_data_loads_panels_render_in_fixed_order() {
    // Given: Two years of daily prices
    let session = session_with(client_serving(two_years_page()));
    let outcome = session.load(CacheMode::Use).await;

    // When: The full dashboard is built
    let dashboard = session.build(&outcome, &PanelRequest::default());

    // Then: Every panel is present, in display order, and available
    let ids: Vec<&str> = dashboard.panels.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "observed",
            "forecast",
            "overview",
            "trend",
            "seasonality",
            "distribution",
            "correlation",
            "yearly_extrema",
            "decomposition",
            "diagnostics",
        ]
    );
    for panel in &dashboard.panels {
        assert!(panel.content.is_available(), "panel {} unavailable", panel.id);
    }
    assert!(dashboard.errors.is_empty());
}

#[tokio::test]
async fn when_forecast_is_built_it_extends_past_the_last_observation() {
    // Given: Two years of daily prices and a 30-day horizon
    let session = session_with(client_serving(two_years_page()));
    let outcome = session.load(CacheMode::Use).await;
    let request = PanelRequest {
        horizon_days: Some(30),
        panels: vec![PanelId::Forecast],
        ..PanelRequest::default()
    };

    // When: The forecast panel is built
    let dashboard = session.build(&outcome, &request);

    // Then: History plus 30 days, ending 30 days after the last observation
    let Some(PanelContent::Forecast(forecast)) =
        dashboard.panel(PanelId::Forecast).map(|p| &p.content)
    else {
        panic!("forecast panel missing");
    };
    assert_eq!(forecast.points.len(), 730 + 30);
    let last_observed = outcome.series.last().expect("observations").date;
    assert_eq!(forecast.after(last_observed).len(), 30);
}

#[tokio::test]
async fn when_correlation_renders_it_is_flagged_synthetic() {
    // Given: Loaded data
    let session = session_with(client_serving(two_years_page()));
    let outcome = session.load(CacheMode::Use).await;

    // When: Only the correlation panel is requested
    let request = PanelRequest {
        panels: vec![PanelId::Correlation],
        ..PanelRequest::default()
    };
    let dashboard = session.build(&outcome, &request);

    // Then: The matrix covers y plus both indicators and says it is synthetic
    let json = serde_json::to_value(&dashboard).expect("serializes");
    assert_eq!(json["panels"][0]["content"]["kind"], "correlation");
    assert_eq!(json["panels"][0]["content"]["synthetic"], true);
    assert_eq!(
        json["panels"][0]["content"]["matrix"]["columns"],
        serde_json::json!(["y", "indicator_1", "indicator_2"])
    );
}

#[test]
fn when_indicator_dates_never_match_correlation_reports_insufficient_data() {
    // Given: Ten daily observations and an indicator table with no rows
    let series = {
        let observations = (1..=10)
            .map(|d| Observation::new(date(2020, 1, d), 50.0 + f64::from(d)).expect("valid"))
            .collect();
        ObservationSeries::new("USD", observations).expect("valid series")
    };
    let indicators = IndicatorTable::synthetic(date(2020, 1, 1), 0, 0);

    // When: The correlation matrix is computed
    let result = brentwatch_core::analytics::correlation_matrix(&series, &indicators);

    // Then: insufficient data, not an empty matrix
    assert_eq!(result, Err(PipelineError::insufficient("correlation", 2, 0)));
}

// =============================================================================
// Dashboard: Memoization and reload
// =============================================================================

#[tokio::test]
async fn when_range_changes_the_source_is_not_fetched_again() {
    // Given: A session that already loaded once
    let client = client_serving(two_years_page());
    let session = session_with(client.clone());
    session.load(CacheMode::Use).await;

    // When: The user changes the range twice
    let ranges = [
        (date(2018, 3, 1), date(2018, 6, 30)),
        (date(2019, 1, 1), date(2019, 2, 1)),
    ];
    for (start, end) in ranges {
        let outcome = session.load(CacheMode::Use).await;
        assert!(outcome.cache_hit);
        let request = PanelRequest {
            range: Some(DateRange::new(start, end)),
            panels: vec![PanelId::Trend],
            ..PanelRequest::default()
        };
        session.build(&outcome, &request);
    }

    // Then: Exactly one network call was made
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn when_user_reloads_the_source_is_fetched_again() {
    // Given: A session with a memoized series
    let client = client_serving(two_years_page());
    let session = session_with(client.clone());
    session.load(CacheMode::Use).await;

    // When: The user presses reload
    let outcome = session.load(CacheMode::Reload).await;

    // Then: A second fetch happens and the result is fresh
    assert!(!outcome.cache_hit);
    assert_eq!(client.calls(), 2);
}

// =============================================================================
// Dashboard: Range selection
// =============================================================================

#[tokio::test]
async fn when_range_exceeds_observed_bounds_it_is_clamped() {
    // Given: Data covering 2018-2019
    let session = session_with(client_serving(two_years_page()));
    let outcome = session.load(CacheMode::Use).await;

    // When: The user picks a range reaching far outside it
    let request = PanelRequest {
        range: Some(DateRange::new(date(1990, 1, 1), date(2018, 1, 10))),
        panels: vec![PanelId::Trend],
        ..PanelRequest::default()
    };
    let dashboard = session.build(&outcome, &request);

    // Then: The effective range starts at the first observation
    let range = dashboard.range.expect("range");
    assert_eq!(range.start, date(2018, 1, 1));
    assert_eq!(range.end, date(2018, 1, 10));
    let Some(PanelContent::Observations { observations }) =
        dashboard.panel(PanelId::Trend).map(|p| &p.content)
    else {
        panic!("trend panel missing");
    };
    assert_eq!(observations.len(), 10);
}

#[tokio::test]
async fn when_range_misses_the_data_entirely_trend_is_empty() {
    // Given: Data covering 2018-2019
    let session = session_with(client_serving(two_years_page()));
    let outcome = session.load(CacheMode::Use).await;

    // When: The user picks a range after the last observation
    let request = PanelRequest {
        range: Some(DateRange::new(date(2020, 6, 1), date(2021, 1, 1))),
        panels: vec![PanelId::Trend, PanelId::Distribution],
        ..PanelRequest::default()
    };
    let dashboard = session.build(&outcome, &request);

    // Then: No boundary row leaks in and the range is reported as requested
    assert_eq!(
        dashboard.range,
        Some(DateRange::new(date(2020, 6, 1), date(2021, 1, 1)))
    );
    let Some(PanelContent::Observations { observations }) =
        dashboard.panel(PanelId::Trend).map(|p| &p.content)
    else {
        panic!("trend panel missing");
    };
    assert!(observations.is_empty());
    assert!(!dashboard
        .panel(PanelId::Distribution)
        .expect("distribution panel")
        .content
        .is_available());
}

#[tokio::test]
async fn when_start_is_after_end_trend_is_empty_not_an_error() {
    // Given: Loaded data
    let session = session_with(client_serving(two_years_page()));
    let outcome = session.load(CacheMode::Use).await;

    // When: The pickers are inverted
    let request = PanelRequest {
        range: Some(DateRange::new(date(2019, 6, 1), date(2019, 1, 1))),
        panels: vec![PanelId::Trend],
        ..PanelRequest::default()
    };
    let dashboard = session.build(&outcome, &request);

    // Then: The trend panel is available and empty
    let Some(PanelContent::Observations { observations }) =
        dashboard.panel(PanelId::Trend).map(|p| &p.content)
    else {
        panic!("trend panel missing");
    };
    assert!(observations.is_empty());
    assert!(dashboard.errors.is_empty());
}
