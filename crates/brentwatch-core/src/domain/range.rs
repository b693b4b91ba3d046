use serde::{Deserialize, Serialize};

use crate::{CalendarDate, Dated};

/// Inclusive `[start, end]` selection coming from the date pickers.
///
/// Construction never fails; an inverted range simply selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: CalendarDate,
    pub end: CalendarDate,
}

impl DateRange {
    pub const fn new(start: CalendarDate, end: CalendarDate) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// First and last dates of a chronologically ordered series.
    pub fn bounds_of<T: Dated>(items: &[T]) -> Option<Self> {
        let first = items.first()?.date();
        let last = items.last()?.date();
        Some(Self::new(first, last))
    }

    /// Pulls both ends inside `bounds`, the way the pickers are limited to the
    /// observed series. Inverted ranges and ranges sharing no day with
    /// `bounds` come back unchanged so they still select nothing.
    pub fn clamp_to(&self, bounds: &DateRange) -> Self {
        if !self.is_ordered() || self.end < bounds.start || self.start > bounds.end {
            return *self;
        }
        Self::new(
            self.start.max(bounds.start).min(bounds.end),
            self.end.min(bounds.end).max(bounds.start),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u8, d: u8) -> CalendarDate {
        CalendarDate::from_ymd(y, m, d).expect("valid date")
    }

    #[test]
    fn clamps_to_observed_bounds() {
        let bounds = DateRange::new(date(2000, 1, 1), date(2010, 12, 31));
        let wide = DateRange::new(date(1990, 1, 1), date(2020, 1, 1));
        assert_eq!(wide.clamp_to(&bounds), bounds);

        let inner = DateRange::new(date(2005, 1, 1), date(2006, 1, 1));
        assert_eq!(inner.clamp_to(&bounds), inner);
    }

    #[test]
    fn inverted_range_stays_inverted_after_clamp() {
        let bounds = DateRange::new(date(2000, 1, 1), date(2010, 12, 31));
        let inverted = DateRange::new(date(2008, 1, 1), date(2002, 1, 1));
        assert!(!inverted.clamp_to(&bounds).is_ordered());

        let inverted_past_end = DateRange::new(date(2020, 1, 1), date(2015, 1, 1));
        assert_eq!(inverted_past_end.clamp_to(&bounds), inverted_past_end);
    }

    #[test]
    fn disjoint_range_is_not_pulled_onto_a_boundary() {
        let bounds = DateRange::new(date(2018, 1, 1), date(2019, 12, 31));
        let after = DateRange::new(date(2020, 6, 1), date(2021, 1, 1));
        let before = DateRange::new(date(2010, 1, 1), date(2017, 12, 31));

        assert_eq!(after.clamp_to(&bounds), after);
        assert_eq!(before.clamp_to(&bounds), before);
    }
}
