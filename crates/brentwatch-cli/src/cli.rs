//! CLI argument definitions for brentwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dashboard` | Every panel over the selected range |
//! | `series` | Cleaned observation series |
//! | `forecast` | Forecast over history plus horizon |
//! | `export` | Write observations and forecast as CSV |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings and errors as failures |
//! | `--stream` | `false` | Enable NDJSON event streaming |
//! | `--source-url` | IPEA Brent page | Page to scrape |
//! | `--selector` | `table.dxgvControl table.dxgvTable` | CSS selector of the data table |
//! | `--price-scale` | `cents` | How price cells are scaled |
//! | `--verbose` | `false` | Debug-level logs on stderr |
//!
//! # Examples
//!
//! ```bash
//! brentwatch dashboard --start 2020-01-01 --end 2020-12-31 --pretty
//! brentwatch dashboard --panel correlation --panel decomposition
//! brentwatch forecast --horizon 90 --future-only
//! brentwatch export --output-dir ./out
//! ```

use std::path::PathBuf;

use brentwatch_core::{CalendarDate, PanelId, PriceScale};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Brent crude price dashboard: scrape, clean, forecast, analyse.
#[derive(Debug, Parser)]
#[command(name = "brentwatch", author, version, about)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - json: Single JSON object (default)
    /// - ndjson: One JSON object per line
    /// - table: Human-readable summary
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Emit start / progress / chunk / error / end events as NDJSON.
    #[arg(long, global = true, default_value_t = false)]
    pub stream: bool,

    /// Page to scrape. Overrides BRENTWATCH_SOURCE_URL.
    #[arg(long, global = true)]
    pub source_url: Option<String>,

    /// CSS selector of the data table. Overrides BRENTWATCH_TABLE_SELECTOR.
    #[arg(long, global = true)]
    pub selector: Option<String>,

    /// Price cell scaling. Overrides BRENTWATCH_PRICE_SCALE.
    #[arg(long, global = true, value_parser = parse_price_scale)]
    pub price_scale: Option<PriceScale>,

    /// Log at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Ndjson,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the dashboard panels.
    ///
    /// # Examples
    ///
    ///   brentwatch dashboard
    ///   brentwatch dashboard --start 01/01/2015 --end 31/12/2019
    ///   brentwatch dashboard --panel trend --panel distribution
    Dashboard(DashboardArgs),

    /// Print the cleaned observation series.
    Series(SeriesArgs),

    /// Print the forecast series.
    Forecast(ForecastArgs),

    /// Write observations.csv and forecast.csv.
    Export(ExportArgs),
}

/// Date pickers shared by the range-aware commands.
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    /// First day of the range (YYYY-MM-DD or DD/MM/YYYY).
    #[arg(long, value_parser = parse_date)]
    pub start: Option<CalendarDate>,

    /// Last day of the range, inclusive.
    #[arg(long, value_parser = parse_date)]
    pub end: Option<CalendarDate>,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Forecast horizon in days (at most 3650).
    #[arg(long, value_parser = parse_horizon)]
    pub horizon: Option<u32>,

    /// Render only these panels (repeatable). Order is always fixed.
    #[arg(long = "panel", value_parser = parse_panel)]
    pub panels: Vec<PanelId>,
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub range: RangeArgs,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Forecast horizon in days (at most 3650).
    #[arg(long, value_parser = parse_horizon)]
    pub horizon: Option<u32>,

    /// Only emit points after the last observation.
    #[arg(long, default_value_t = false)]
    pub future_only: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Directory receiving observations.csv and forecast.csv.
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Forecast horizon in days (at most 3650).
    #[arg(long, value_parser = parse_horizon)]
    pub horizon: Option<u32>,
}

fn parse_date(value: &str) -> Result<CalendarDate, String> {
    CalendarDate::parse(value).map_err(|error| error.to_string())
}

fn parse_horizon(value: &str) -> Result<u32, String> {
    brentwatch_core::config::parse_horizon(value).map_err(|error| error.to_string())
}

fn parse_panel(value: &str) -> Result<PanelId, String> {
    value.parse().map_err(|error: brentwatch_core::ValidationError| {
        let known: Vec<&str> = PanelId::ALL.iter().map(|id| id.as_str()).collect();
        format!("{error}; expected one of {}", known.join(", "))
    })
}

fn parse_price_scale(value: &str) -> Result<PriceScale, String> {
    value.parse().map_err(|error: brentwatch_core::ValidationError| error.to_string())
}
