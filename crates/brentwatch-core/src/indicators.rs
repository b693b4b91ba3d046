//! Auxiliary indicator tables for the correlation panel.
//!
//! No real macro indicators are wired in yet, so the dashboard correlates the
//! price against a seeded synthetic table. Panels carry `synthetic: true` so
//! the placeholder is never mistaken for data.

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, ValidationError};

/// One dated row of indicator values, aligned with [`IndicatorTable::columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: CalendarDate,
    pub values: Vec<f64>,
}

/// Date-indexed numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    columns: Vec<String>,
    rows: Vec<IndicatorRow>,
    synthetic: bool,
}

impl IndicatorTable {
    pub fn new(columns: Vec<String>, rows: Vec<IndicatorRow>) -> Result<Self, ValidationError> {
        for (index, row) in rows.iter().enumerate() {
            if row.values.len() != columns.len() {
                return Err(ValidationError::IndicatorWidth {
                    index,
                    found: row.values.len(),
                    expected: columns.len(),
                });
            }
        }
        if let Some(index) = rows.windows(2).position(|pair| pair[0].date >= pair[1].date) {
            return Err(ValidationError::UnorderedSeries { index: index + 1 });
        }
        Ok(Self {
            columns,
            rows,
            synthetic: false,
        })
    }

    /// `periods` month-end rows starting at the first month end on or after
    /// `start`, with columns `indicator_1` and `indicator_2` drawn from a
    /// standard normal distribution seeded by `seed`.
    pub fn synthetic(start: CalendarDate, periods: usize, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let columns = vec![String::from("indicator_1"), String::from("indicator_2")];

        let mut rows = Vec::with_capacity(periods);
        let mut date = Some(start.month_end());
        while rows.len() < periods {
            let Some(current) = date else { break };
            rows.push(IndicatorRow {
                date: current,
                values: columns.iter().map(|_| standard_normal(&mut rng)).collect(),
            });
            date = current.next_day().map(CalendarDate::month_end);
        }

        Self {
            columns,
            rows,
            synthetic: true,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub const fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

/// Box–Muller transform over two uniform draws.
fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u8, d: u8) -> CalendarDate {
        CalendarDate::from_ymd(y, m, d).expect("valid date")
    }

    #[test]
    fn synthetic_rows_land_on_month_ends() {
        let table = IndicatorTable::synthetic(date(1987, 5, 20), 3, 0);
        let dates: Vec<String> = table.rows().iter().map(|r| r.date.format_iso()).collect();
        assert_eq!(dates, vec!["1987-05-31", "1987-06-30", "1987-07-31"]);
        assert!(table.is_synthetic());
        assert_eq!(table.columns(), ["indicator_1", "indicator_2"]);
    }

    #[test]
    fn same_seed_same_table() {
        let a = IndicatorTable::synthetic(date(2000, 1, 1), 12, 0);
        let b = IndicatorTable::synthetic(date(2000, 1, 1), 12, 0);
        let c = IndicatorTable::synthetic(date(2000, 1, 1), 12, 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn draws_are_finite_and_roughly_standard() {
        let table = IndicatorTable::synthetic(date(1900, 1, 1), 400, 0);
        let values: Vec<f64> = table.rows().iter().map(|r| r.values[0]).collect();
        assert!(values.iter().all(|v| v.is_finite()));
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!(mean.abs() < 0.3, "mean {mean} too far from zero");
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = IndicatorTable::new(
            vec![String::from("a"), String::from("b")],
            vec![IndicatorRow {
                date: date(2020, 1, 31),
                values: vec![1.0],
            }],
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::IndicatorWidth { index: 0, found: 1, expected: 2 }));
    }
}
