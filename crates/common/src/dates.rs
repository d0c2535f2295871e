//! Inclusive date ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Error returned when a date range is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeError {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl std::fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "End date must be after start date ({} to {})",
            self.start_date, self.end_date
        )
    }
}

impl std::error::Error for DateRangeError {}

/// A stay from `start_date` to `end_date`, both days included.
///
/// `end_date` is always strictly after `start_date`, including for ranges
/// read back through serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDateRange")]
pub struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DateRangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start_date, raw.end_date)
    }
}

impl DateRange {
    /// Creates a range, rejecting `end_date <= start_date`.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, DateRangeError> {
        if end_date <= start_date {
            return Err(DateRangeError {
                start_date,
                end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Returns true if the two ranges share at least one day.
    ///
    /// Both ends are inclusive: a stay ending on the 7th collides with one
    /// starting on the 7th.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start_date <= other.end_date && self.end_date >= other.start_date
    }

    /// Number of nights covered by the range.
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start_date, self.end_date)
    }
}
