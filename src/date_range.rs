//! Inclusive date ranges and date parsing for request parameters.

use serde::Serialize;
use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

use crate::Error;

/// A date range where either end may be left open.
///
/// Both bounds are inclusive: a date equal to `start` or `end` is inside the range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// The first day in the range, or `None` for no lower bound.
    pub start: Option<Date>,
    /// The last day in the range, or `None` for no upper bound.
    pub end: Option<Date>,
}

impl DateRange {
    /// Create a range with optional bounds.
    ///
    /// A range whose `end` comes before its `start` is allowed and contains no dates.
    pub fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    /// Create a range with both bounds set.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDateRange] if `end` comes before `start`.
    pub fn bounded(start: Date, end: Date) -> Result<Self, Error> {
        if end < start {
            return Err(Error::InvalidDateRange { start, end });
        }

        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// A range that contains every date.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether `date` falls inside the range, including both bounds.
    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|start| start <= date) && self.end.is_none_or(|end| date <= end)
    }

    /// Parse a range from optional query string values.
    ///
    /// Empty strings are treated the same as a missing value.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDate] if either value is not a valid date, or
    /// [Error::InvalidDateRange] if both are given and the end comes before the start.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, Error> {
        match (parse_optional_date(start)?, parse_optional_date(end)?) {
            (Some(start), Some(end)) => Self::bounded(start, end),
            (start, end) => Ok(Self::new(start, end)),
        }
    }
}

/// Parse a date from either `YYYY-MM-DD` or an RFC 3339 date-time.
///
/// Only the date part of a date-time is kept, e.g. `2025-10-01T10:00:00Z`
/// becomes `2025-10-01`.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if `text` is in neither format.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    let text = text.trim();

    if let Ok(date) = Date::parse(text, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }

    OffsetDateTime::parse(text, &Rfc3339)
        .map(|date_time| date_time.date())
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// Parse an optional date, treating an empty string as no date.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if `text` is not empty and not a valid date.
pub fn parse_optional_date(text: Option<&str>) -> Result<Option<Date>, Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text).map(Some),
    }
}
