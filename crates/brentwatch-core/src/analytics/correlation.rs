use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorTable;
use crate::{ObservationSeries, PipelineError};

/// Square Pearson matrix over the price column `y` and every indicator column.
///
/// `values[i][j]` is `None` when either column has zero variance over the
/// joined rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
    /// Rows that survived the inner join on date.
    pub observations: usize,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.columns.iter().position(|name| name == row)?;
        let j = self.columns.iter().position(|name| name == column)?;
        self.values[i][j]
    }
}

/// Pearson correlation coefficient. `None` for mismatched lengths, fewer than
/// two points, or a constant input.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut x_var = 0.0;
    let mut y_var = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        covariance += dx * dy;
        x_var += dx * dx;
        y_var += dy * dy;
    }
    if x_var == 0.0 || y_var == 0.0 {
        return None;
    }
    Some((covariance / (x_var.sqrt() * y_var.sqrt())).clamp(-1.0, 1.0))
}

/// Inner-joins `series` with `indicators` on date and correlates every pair of
/// columns.
pub fn correlation_matrix(
    series: &ObservationSeries,
    indicators: &IndicatorTable,
) -> Result<CorrelationMatrix, PipelineError> {
    let width = indicators.columns().len() + 1;
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); width];

    for row in indicators.rows() {
        let Some(price) = series.price_on(row.date) else {
            continue;
        };
        columns[0].push(price);
        for (column, value) in columns[1..].iter_mut().zip(&row.values) {
            column.push(*value);
        }
    }

    let joined = columns[0].len();
    if joined < 2 {
        return Err(PipelineError::insufficient("correlation", 2, joined));
    }

    let values = (0..width)
        .map(|i| {
            (0..width)
                .map(|j| pearson(&columns[i], &columns[j]))
                .collect()
        })
        .collect();

    let mut names = Vec::with_capacity(width);
    names.push(String::from(ObservationSeries::COLUMNS[1]));
    names.extend(indicators.columns().iter().cloned());

    Ok(CorrelationMatrix {
        columns: names,
        values,
        observations: joined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorRow;
    use crate::{CalendarDate, Observation};

    fn month_end(month: u8) -> CalendarDate {
        CalendarDate::from_ymd(2020, month, 1)
            .expect("date")
            .month_end()
    }

    fn series(prices: &[f64]) -> ObservationSeries {
        let observations = prices
            .iter()
            .zip(1_u8..)
            .map(|(price, month)| Observation::new(month_end(month), *price).expect("observation"))
            .collect();
        ObservationSeries::new("USD", observations).expect("series")
    }

    fn indicators(values: &[f64]) -> IndicatorTable {
        let rows = values
            .iter()
            .zip(1_u8..)
            .map(|(value, month)| IndicatorRow {
                date: month_end(month),
                values: vec![*value],
            })
            .collect();
        IndicatorTable::new(vec![String::from("indicator_1")], rows).expect("table")
    }

    #[test]
    fn pearson_of_perfect_linear_relations() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &up).expect("defined") - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).expect("defined") + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(pearson(&x[..1], &up[..1]), None);
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let matrix = correlation_matrix(
            &series(&[10.0, 12.0, 11.0, 15.0, 14.0]),
            &indicators(&[1.0, 3.0, 2.0, 2.5, 4.0]),
        )
        .expect("must correlate");

        assert_eq!(matrix.columns, vec!["y", "indicator_1"]);
        assert_eq!(matrix.observations, 5);
        for i in 0..2 {
            assert!((matrix.values[i][i].expect("defined") - 1.0).abs() < 1e-12);
            for j in 0..2 {
                assert_eq!(matrix.values[i][j], matrix.values[j][i]);
                let r = matrix.values[i][j].expect("defined");
                assert!((-1.0..=1.0).contains(&r));
            }
        }
        assert_eq!(matrix.get("y", "indicator_1"), matrix.values[0][1]);
    }

    #[test]
    fn join_keeps_only_shared_dates() {
        let matrix = correlation_matrix(
            &series(&[10.0, 12.0, 11.0]),
            &indicators(&[1.0, 3.0, 2.0, 2.5, 4.0, 5.0]),
        )
        .expect("must correlate");
        assert_eq!(matrix.observations, 3);
    }

    #[test]
    fn empty_join_is_insufficient_data() {
        let empty = IndicatorTable::new(vec![String::from("indicator_1")], Vec::new())
            .expect("table");
        let err = correlation_matrix(&series(&[1.0; 10]), &empty).expect_err("must fail");
        assert_eq!(err, PipelineError::insufficient("correlation", 2, 0));
    }

    #[test]
    fn constant_column_yields_null_entries() {
        let matrix = correlation_matrix(
            &series(&[10.0, 10.0, 10.0]),
            &indicators(&[1.0, 2.0, 3.0]),
        )
        .expect("must correlate");
        assert_eq!(matrix.get("y", "indicator_1"), None);
        assert_eq!(matrix.get("y", "y"), None);
        assert!(matrix.get("indicator_1", "indicator_1").is_some());
    }
}
