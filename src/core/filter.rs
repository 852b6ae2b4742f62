use chrono::NaiveDate;

use crate::core::error::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Inclusive range over entry dates. A missing bound leaves that side open.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> DateRange {
        DateRange::default()
    }

    /// Builds a range from optional query values. Blank values count as absent.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<DateRange, ValidationError> {
        let range = DateRange { from: parse_bound(from)?, to: parse_bound(to)? };

        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from > to {
                return Err(ValidationError::InvertedRange {
                    from: from.format(DATE_FORMAT).to_string(),
                    to: to.format(DATE_FORMAT).to_string(),
                });
            }
        }
        Ok(range)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether a stored date string falls into the range. Unreadable dates
    /// only match an unbounded range.
    pub fn contains(&self, date: &str) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = parse_date(date) else {
            return false;
        };
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

fn parse_bound(bound: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match bound.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text)
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidDate(text.to_owned())),
    }
}
