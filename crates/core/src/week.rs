//! ISO-8601 calendar week assignment.
//!
//! Weeks start on Monday and week 1 is the week containing January 4, so the
//! ISO year can differ from the calendar year around year boundaries. Both
//! arrival and treated timestamps are attributed through [`WeekId::of`]; using
//! a single algorithm keeps "arrived in week W" and "treated in week W"
//! comparable.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Identifier of one ISO calendar week.
///
/// Ordering is chronological: ISO year first, then week number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekId {
    iso_year: i32,
    week: u32,
}

impl WeekId {
    /// Build a week identifier from raw parts, rejecting week numbers that do
    /// not exist in the given ISO year (0, or 53 in a 52-week year).
    pub fn new(iso_year: i32, week: u32) -> DomainResult<Self> {
        if week == 0 || week > weeks_in_iso_year(iso_year) {
            return Err(DomainError::invalid_week(format!(
                "week {week} does not exist in ISO year {iso_year}"
            )));
        }
        Ok(Self { iso_year, week })
    }

    /// The ISO week containing `timestamp`.
    pub fn of(timestamp: DateTime<Utc>) -> Self {
        let iso = timestamp.date_naive().iso_week();
        Self {
            iso_year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn iso_year(self) -> i32 {
        self.iso_year
    }

    pub fn week(self) -> u32 {
        self.week
    }

    /// Monday of this week.
    pub fn start(self) -> NaiveDate {
        // A `WeekId` obtained through `new`/`of` is always a valid ISO week;
        // clamp anyway so rows deserialized from external storage cannot
        // produce a nonsensical date.
        let week = self.week.clamp(1, weeks_in_iso_year(self.iso_year));
        NaiveDate::from_isoywd_opt(self.iso_year, week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Sunday of this week.
    pub fn end(self) -> NaiveDate {
        self.start() + Duration::days(6)
    }
}

impl core::fmt::Display for WeekId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-W{:02}", self.iso_year, self.week)
    }
}

/// 52 or 53 depending on the ISO year.
fn weeks_in_iso_year(iso_year: i32) -> u32 {
    if NaiveDate::from_isoywd_opt(iso_year, 53, Weekday::Mon).is_some() {
        53
    } else {
        52
    }
}
