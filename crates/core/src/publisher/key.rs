//! Timestamp-derived object keys.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use super::error::PublishError;

/// Object key of the form `{year}/{month:02}/{day:02}/{hour:02}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicationKey {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    name: String,
}

impl PublicationKey {
    /// Builds the key for `name` published at `timestamp`.
    pub fn new(timestamp: DateTime<Utc>, name: impl Into<String>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
            day: timestamp.day(),
            hour: timestamp.hour(),
            name: name.into(),
        }
    }

    /// Key prefix for a timestamp, e.g. `2024/03/01/09`.
    pub fn prefix_for(timestamp: DateTime<Utc>) -> String {
        timestamp.format("%Y/%m/%d/%H").to_string()
    }

    /// Keys for `count` consecutive hourly slots starting at `timestamp`.
    pub fn replicated(timestamp: DateTime<Utc>, count: u32, name: &str) -> Vec<Self> {
        (0..count)
            .map(|i| Self::new(timestamp + Duration::hours(i64::from(i)), name))
            .collect()
    }

    /// Parses a key back into its components.
    pub fn parse(key: &str) -> Result<Self, PublishError> {
        let mut parts = key.splitn(5, '/');
        let mut next = |what: &str| {
            parts
                .next()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| PublishError::invalid_key(key, format!("missing {}", what)))
        };

        let year = next("year")?;
        let month = next("month")?;
        let day = next("day")?;
        let hour = next("hour")?;
        let name = next("name")?;

        if year.len() != 4 {
            return Err(PublishError::invalid_key(key, "year must have four digits"));
        }
        for (field, value) in [("month", month), ("day", day), ("hour", hour)] {
            if value.len() != 2 || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PublishError::invalid_key(
                    key,
                    format!("{} must be two digits", field),
                ));
            }
        }

        let parse_num = |value: &str| {
            value
                .parse::<u32>()
                .map_err(|e| PublishError::invalid_key(key, e.to_string()))
        };
        let year = year
            .parse::<i32>()
            .map_err(|e| PublishError::invalid_key(key, e.to_string()))?;
        let month = parse_num(month)?;
        let day = parse_num(day)?;
        let hour = parse_num(hour)?;

        if NaiveDate::from_ymd_opt(year, month, day).is_none() || hour > 23 {
            return Err(PublishError::invalid_key(key, "not a valid date and hour"));
        }

        Ok(Self {
            year,
            month,
            day,
            hour,
            name: name.to_string(),
        })
    }

    /// `(year, month, day, hour)` of the key.
    pub fn components(&self) -> (i32, u32, u32, u32) {
        (self.year, self.month, self.day, self.hour)
    }

    /// The timestamp the key was built from, truncated to the hour.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?;
        let naive = date.and_hms_opt(self.hour, 0, 0)?;
        Some(Utc.from_utc_datetime(&naive))
    }

    pub fn prefix(&self) -> String {
        format!(
            "{:04}/{:02}/{:02}/{:02}",
            self.year, self.month, self.day, self.hour
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PublicationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix(), self.name)
    }
}

impl Serialize for PublicationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
