use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month};

use crate::ValidationError;

/// Calendar day without a time component, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(Date);

impl CalendarDate {
    pub const MIN: Self = Self(Date::MIN);
    pub const MAX: Self = Self(Date::MAX);

    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: format!("{year:04}-{month:02}-{day:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|_| invalid())
    }

    /// Parses `DD/MM/YYYY` as published by the data provider.
    ///
    /// Day and month may be one or two digits; the year must have four.
    pub fn parse_dmy(input: &str) -> Result<Self, ValidationError> {
        let [day, month, year] = split_fields(input, '/')?;
        Self::from_fields(input, year, month, day)
    }

    /// Parses ISO-8601 `YYYY-MM-DD`.
    pub fn parse_iso(input: &str) -> Result<Self, ValidationError> {
        let [year, month, day] = split_fields(input, '-')?;
        Self::from_fields(input, year, month, day)
    }

    /// Accepts either `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.contains('/') {
            Self::parse_dmy(input)
        } else {
            Self::parse_iso(input)
        }
    }

    fn from_fields(
        input: &str,
        year: &str,
        month: &str,
        day: &str,
    ) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: input.to_owned(),
        };
        if year.len() != 4 || month.len() > 2 || day.len() > 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u8>().map_err(|_| invalid())?;
        let day = day.parse::<u8>().map_err(|_| invalid())?;
        Self::from_ymd(year, month, day).map_err(|_| invalid())
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u8 {
        u8::from(self.0.month())
    }

    pub fn day(self) -> u8 {
        self.0.day()
    }

    pub fn next_day(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    /// Whole days from `origin` to `self` (negative when `self` is earlier).
    pub fn days_since(self, origin: Self) -> i64 {
        (self.0 - origin.0).whole_days()
    }

    /// Last day of this date's month.
    pub fn month_end(self) -> Self {
        let (year, month) = (self.0.year(), self.0.month());
        let last = time::util::days_in_year_month(year, month);
        Self(Date::from_calendar_date(year, month, last).unwrap_or(self.0))
    }

    pub fn format_iso(self) -> String {
        format!("{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }
}

fn split_fields(input: &str, separator: char) -> Result<[&str; 3], ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        value: input.to_owned(),
    };
    let mut parts = input.trim().split(separator);
    let fields = [
        parts.next().ok_or_else(invalid)?,
        parts.next().ok_or_else(invalid)?,
        parts.next().ok_or_else(invalid)?,
    ];
    if parts.next().is_some() {
        return Err(invalid());
    }
    let all_digits = fields
        .iter()
        .all(|field| !field.is_empty() && field.chars().all(|ch| ch.is_ascii_digit()));
    if !all_digits {
        return Err(invalid());
    }
    Ok(fields)
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl FromStr for CalendarDate {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse_iso(&value).map_err(D::Error::custom)
    }
}
