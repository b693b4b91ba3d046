//! HTML table extraction.
//!
//! The provider renders the series inside a DevExpress grid: an outer
//! `table.dxgvControl` wrapping the data table `table.dxgvTable`. The default
//! [`TableSelector`] names that inner table explicitly and extraction insists
//! on exactly one match, so a layout change fails loudly instead of binding
//! some other table by position.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{PipelineError, ValidationError};

/// Selector for the provider's data grid.
pub const DEFAULT_TABLE_SELECTOR: &str = "table.dxgvControl table.dxgvTable";

/// Validated CSS selector that must resolve to exactly one `<table>`.
#[derive(Debug, Clone)]
pub struct TableSelector {
    css: String,
    selector: Selector,
}

impl TableSelector {
    pub fn parse(css: &str) -> Result<Self, ValidationError> {
        let selector = Selector::parse(css).map_err(|error| ValidationError::InvalidSelector {
            selector: css.to_owned(),
            reason: error.to_string(),
        })?;
        Ok(Self {
            css: css.to_owned(),
            selector,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.css
    }
}

/// Cell text of every row of the matched table, header row included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Locates the single table matching `selector` and returns its rows.
pub fn extract_table(html: &str, selector: &TableSelector) -> Result<RawTable, PipelineError> {
    let document = Html::parse_document(html);
    let matches: Vec<ElementRef<'_>> = document.select(&selector.selector).collect();

    let table = match matches.as_slice() {
        [] => {
            return Err(PipelineError::Extraction(format!(
                "no table matches selector '{}'",
                selector.as_str()
            )))
        }
        [single] => *single,
        many => {
            return Err(PipelineError::Extraction(format!(
                "selector '{}' is ambiguous: {} tables match",
                selector.as_str(),
                many.len()
            )))
        }
    };

    if table.value().name() != "table" {
        return Err(PipelineError::Extraction(format!(
            "selector '{}' matched <{}>, not a table",
            selector.as_str(),
            table.value().name()
        )));
    }

    let rows: Vec<Vec<String>> = table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "tr" && owning_table_is(element, &table))
        .map(|row| row_cells(&row))
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .collect();

    if rows.is_empty() {
        return Err(PipelineError::Extraction(format!(
            "table matched by '{}' has no rows",
            selector.as_str()
        )));
    }

    debug!(selector = selector.as_str(), rows = rows.len(), "extracted table");
    Ok(RawTable { rows })
}

/// True when the nearest enclosing `<table>` of `row` is `table`, so rows of
/// nested tables are not mixed in.
fn owning_table_is<'a>(row: &ElementRef<'a>, table: &ElementRef<'a>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "table")
        .is_some_and(|owner| owner == *table)
}

fn row_cells(row: &ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| normalize_text(cell.text()))
        .collect()
}

fn normalize_text<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    let joined = fragments.collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="layout"><tr><td>menu</td></tr></table>
            <table class="dxgvControl" id="grd"><tr><td>
              <table class="dxgvTable" id="grd_DXMainTable">{rows}</table>
            </td></tr></table>
            </body></html>"#
        )
    }

    fn default_selector() -> TableSelector {
        TableSelector::parse(DEFAULT_TABLE_SELECTOR).expect("valid selector")
    }

    #[test]
    fn extracts_rows_of_the_data_table_only() {
        let html = grid(
            "<tr><td>Data</td><td>Preço - petróleo bruto - Brent (FOB)</td></tr>\
             <tr><td>20/05/1987</td><td> 18,63 </td></tr>\
             <tr><td>21/05/1987</td><td>18,45</td></tr>",
        );
        let table = extract_table(&html, &default_selector()).expect("must extract");
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[1], vec!["20/05/1987", "18,63"]);
    }

    #[test]
    fn missing_table_is_an_extraction_error() {
        let html = "<html><table><tr><td>x</td></tr></table></html>";
        let err = extract_table(html, &default_selector()).expect_err("must fail");
        assert!(matches!(err, PipelineError::Extraction(message) if message.contains("no table")));
    }

    #[test]
    fn ambiguous_selector_is_rejected() {
        let html = "<table class=\"t\"><tr><td>a</td></tr></table>\
                    <table class=\"t\"><tr><td>b</td></tr></table>";
        let selector = TableSelector::parse("table.t").expect("valid");
        let err = extract_table(html, &selector).expect_err("must fail");
        assert!(matches!(err, PipelineError::Extraction(message) if message.contains("ambiguous")));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let html = grid("<tr><td>Data</td><td>Preço</td></tr><tr><td> </td><td>&nbsp;</td></tr>");
        let table = extract_table(&html, &default_selector()).expect("must extract");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn invalid_css_is_a_validation_error() {
        assert!(matches!(
            TableSelector::parse("table[["),
            Err(ValidationError::InvalidSelector { .. })
        ));
    }
}
