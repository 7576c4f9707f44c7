//! Calendar dates as stored on service records.
//!
//! Service dates are persisted as fixed-width `MM - DD - YYYY` strings with no
//! time zone or time-of-day component.
use std::{fmt, str::FromStr};

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Result, ServiceLogError};

/// A calendar date in the `MM - DD - YYYY` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceDate(NaiveDate);

impl ServiceDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parses the exact `MM - DD - YYYY` layout.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = |message: &str| ServiceLogError::InvalidDate {
            value: value.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<&str> = value.split(" - ").collect();
        if parts.len() != 3 {
            return Err(invalid("expected three fields separated by ' - '"));
        }

        let (month, day, year) = (parts[0], parts[1], parts[2]);
        if month.len() != 2 || day.len() != 2 || year.len() != 4 {
            return Err(invalid("expected MM - DD - YYYY"));
        }
        if !parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
            return Err(invalid("fields must be digits"));
        }

        let month: u32 = month.parse().map_err(|_| invalid("bad month"))?;
        let day: u32 = day.parse().map_err(|_| invalid("bad day"))?;
        let year: i32 = year.parse().map_err(|_| invalid("bad year"))?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| invalid("not a calendar date"))
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// Whether the date falls in the same month and year as `other`.
    pub fn same_month(&self, other: NaiveDate) -> bool {
        self.0.year() == other.year() && self.0.month() == other.month()
    }
}

impl fmt::Display for ServiceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02} - {:02} - {:04}",
            self.0.month(),
            self.0.day(),
            self.0.year()
        )
    }
}

impl FromStr for ServiceDate {
    type Err = ServiceLogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServiceDate {
    type Error = ServiceLogError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ServiceDate> for String {
    fn from(date: ServiceDate) -> Self {
        date.to_string()
    }
}

impl From<NaiveDate> for ServiceDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// The device-local calendar day.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
