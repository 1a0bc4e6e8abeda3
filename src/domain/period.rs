//! Calendar-month period keys.
//!
//! The dataset is monthly, so every date is truncated to its month and
//! forecasts advance one calendar month per step.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Build a period; `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Shift by a signed number of months.
    pub fn offset(self, months: i64) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month - 1) + months;
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(self, earlier: Period) -> i64 {
        (i64::from(self.year) - i64::from(earlier.year)) * 12
            + (i64::from(self.month) - i64::from(earlier.month))
    }

    /// Long label, e.g. `December 2023`.
    pub fn long_label(self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    /// Parse a date-like cell from the dataset.
    ///
    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `MM/DD/YYYY` and `YYYY-MM`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
                return Some(Self::from_date(date));
            }
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(Self::from_date(dt.date()));
        }

        let (year, month) = raw.split_once('-')?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Period::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid period '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_layouts() {
        let dec = Period::new(2023, 12).unwrap();
        assert_eq!(Period::parse("2023-12-31"), Some(dec));
        assert_eq!(Period::parse("2023-12-31 00:00:00"), Some(dec));
        assert_eq!(Period::parse("12/31/2023"), Some(dec));
        assert_eq!(Period::parse("2023-12"), Some(dec));
        assert_eq!(Period::parse(" 2023-1 "), Period::new(2023, 1));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Period::parse(""), None);
        assert_eq!(Period::parse("yesterday"), None);
        assert_eq!(Period::parse("2023-13"), None);
        assert_eq!(Period::parse("23-01"), None);
    }

    #[test]
    fn next_rolls_over_the_year() {
        let dec = Period::new(2023, 12).unwrap();
        assert_eq!(dec.next(), Period::new(2024, 1).unwrap());
        assert_eq!(dec.next().next().to_string(), "2024-02");
        assert!(dec < dec.next());
    }

    #[test]
    fn months_since_counts_calendar_months() {
        let start = Period::new(2018, 1).unwrap();
        let end = Period::new(2023, 12).unwrap();
        assert_eq!(end.months_since(start), 71);
        assert_eq!(start.months_since(end), -71);
        assert_eq!(end.months_since(end), 0);
    }

    #[test]
    fn labels() {
        let p = Period::new(2024, 3).unwrap();
        assert_eq!(p.to_string(), "2024-03");
        assert_eq!(p.long_label(), "March 2024");
    }

    #[test]
    fn offset_moves_across_years() {
        let p = Period::new(2024, 3).unwrap();
        assert_eq!(p.offset(0), p);
        assert_eq!(p.offset(10), Period::new(2025, 1).unwrap());
        assert_eq!(p.offset(-3), Period::new(2023, 12).unwrap());
        assert_eq!(p.offset(-27), Period::new(2021, 12).unwrap());
        assert_eq!(p.offset(1), p.next());
    }

    #[test]
    fn serde_uses_the_short_label() {
        let p = Period::new(2024, 1).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"2024-01\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
