//! Types for the schedule module.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while resolving a release or its offsets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The requested release hour is not one of the published cycles.
    #[error("Invalid release hour '{0}', expected one of: 00, 12")]
    InvalidReleaseHour(String),

    /// A forecast offset outside the published step grid.
    #[error("Invalid forecast offset {0}h: must be a multiple of 3 no greater than {max}h", max = ForecastOffset::MAX)]
    InvalidOffset(u16),

    /// The offset range is empty or malformed.
    #[error("Invalid offset range: {reason}")]
    InvalidRange { reason: String },
}

/// One of the daily forecast cycles.
///
/// Variants are declared in publication order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReleaseHour {
    /// The 00 UTC run, published at 07:05 UTC.
    #[serde(rename = "00")]
    Midnight,
    /// The 12 UTC run, published at 19:05 UTC.
    #[serde(rename = "12")]
    Noon,
}

impl ReleaseHour {
    /// All release hours, earliest publication first.
    pub const ALL: [ReleaseHour; 2] = [ReleaseHour::Midnight, ReleaseHour::Noon];

    /// Hour of day (UTC) the model run starts from.
    pub fn hour(self) -> u32 {
        match self {
            ReleaseHour::Midnight => 0,
            ReleaseHour::Noon => 12,
        }
    }

    /// Two-digit code used in source URLs and on the command line.
    pub fn code(self) -> &'static str {
        match self {
            ReleaseHour::Midnight => "00",
            ReleaseHour::Noon => "12",
        }
    }

    /// Time of day (UTC) after which the run's files can be downloaded.
    pub fn publication_time(self) -> NaiveTime {
        let minutes = match self {
            ReleaseHour::Midnight => 7 * 60 + 5,
            ReleaseHour::Noon => 19 * 60 + 5,
        };
        NaiveTime::default() + Duration::minutes(minutes)
    }

    /// The release published last in a day.
    pub fn latest() -> Self {
        ReleaseHour::Noon
    }
}

impl fmt::Display for ReleaseHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReleaseHour {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "00" => Ok(ReleaseHour::Midnight),
            "12" => Ok(ReleaseHour::Noon),
            other => Err(ScheduleError::InvalidReleaseHour(other.to_string())),
        }
    }
}

/// A single forecast issuance: a release hour on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseWindow {
    pub hour: ReleaseHour,
    pub date: NaiveDate,
}

impl ReleaseWindow {
    pub fn new(hour: ReleaseHour, date: NaiveDate) -> Self {
        Self { hour, date }
    }

    /// The model run's reference instant (date at the release hour).
    pub fn run_time(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(NaiveTime::default()))
            + Duration::hours(i64::from(self.hour.hour()))
    }

    /// Instant from which the release's files are downloadable.
    pub fn available_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(self.hour.publication_time()))
    }

    /// Whether the release can be downloaded at `now`.
    ///
    /// Past dates are always available, today's release only once its
    /// publication time has passed, future dates never.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        now >= self.available_at()
    }

    /// Timestamp a forecast offset of this release is valid for.
    pub fn forecast_timestamp(&self, offset: ForecastOffset) -> DateTime<Utc> {
        self.run_time() + Duration::hours(i64::from(offset.hours()))
    }
}

impl fmt::Display for ReleaseWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}z", self.date.format("%Y-%m-%d"), self.hour.code())
    }
}

/// Hours ahead of the model run, restricted to the 3-hourly step grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ForecastOffset(u16);

impl ForecastOffset {
    /// Largest step published for the operational run.
    pub const MAX: u16 = 360;

    pub fn new(hours: u16) -> Result<Self, ScheduleError> {
        if hours % 3 != 0 || hours > Self::MAX {
            return Err(ScheduleError::InvalidOffset(hours));
        }
        Ok(Self(hours))
    }

    pub fn hours(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ForecastOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}

/// Inclusive range of forecast offsets fetched per release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRange {
    #[serde(default = "default_start")]
    pub start: u16,
    #[serde(default = "default_end")]
    pub end: u16,
    #[serde(default = "default_stride")]
    pub stride: u16,
}

// 9h to 18h covers the gap until the next release is published.
fn default_start() -> u16 {
    9
}

fn default_end() -> u16 {
    18
}

fn default_stride() -> u16 {
    3
}

impl Default for OffsetRange {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            stride: default_stride(),
        }
    }
}

impl OffsetRange {
    pub fn new(start: u16, end: u16, stride: u16) -> Self {
        Self { start, end, stride }
    }

    /// Expands the range into validated offsets.
    pub fn offsets(&self) -> Result<Vec<ForecastOffset>, ScheduleError> {
        if self.stride == 0 {
            return Err(ScheduleError::InvalidRange {
                reason: "stride cannot be 0".to_string(),
            });
        }
        if self.start > self.end {
            return Err(ScheduleError::InvalidRange {
                reason: format!("start {} is after end {}", self.start, self.end),
            });
        }

        (self.start..=self.end)
            .step_by(usize::from(self.stride))
            .map(ForecastOffset::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_release_hour_parse() {
        assert_eq!("00".parse::<ReleaseHour>(), Ok(ReleaseHour::Midnight));
        assert_eq!("12".parse::<ReleaseHour>(), Ok(ReleaseHour::Noon));
        assert_eq!(
            "06".parse::<ReleaseHour>(),
            Err(ScheduleError::InvalidReleaseHour("06".to_string()))
        );
        assert!("".parse::<ReleaseHour>().is_err());
    }

    #[test]
    fn test_publication_times() {
        let midnight = ReleaseHour::Midnight.publication_time();
        assert_eq!((midnight.hour(), midnight.minute()), (7, 5));
        let noon = ReleaseHour::Noon.publication_time();
        assert_eq!((noon.hour(), noon.minute()), (19, 5));
    }

    #[test]
    fn test_release_hour_serde_uses_codes() {
        let json = serde_json::to_string(&ReleaseHour::Noon).unwrap();
        assert_eq!(json, "\"12\"");
        let parsed: ReleaseHour = serde_json::from_str("\"00\"").unwrap();
        assert_eq!(parsed, ReleaseHour::Midnight);
    }

    #[test]
    fn test_window_availability_today() {
        let window = ReleaseWindow::new(ReleaseHour::Noon, date(2024, 3, 1));
        assert!(!window.is_available(at(2024, 3, 1, 19, 4)));
        assert!(window.is_available(at(2024, 3, 1, 19, 5)));
        assert!(window.is_available(at(2024, 3, 1, 23, 59)));
    }

    #[test]
    fn test_window_availability_past_and_future() {
        let past = ReleaseWindow::new(ReleaseHour::Noon, date(2024, 2, 29));
        assert!(past.is_available(at(2024, 3, 1, 0, 0)));

        let future = ReleaseWindow::new(ReleaseHour::Midnight, date(2024, 3, 2));
        assert!(!future.is_available(at(2024, 3, 1, 23, 0)));
    }

    #[test]
    fn test_forecast_timestamp_adds_release_hour_and_offset() {
        let window = ReleaseWindow::new(ReleaseHour::Noon, date(2024, 3, 1));
        let ts = window.forecast_timestamp(ForecastOffset::new(9).unwrap());
        assert_eq!(ts, at(2024, 3, 1, 21, 0));

        let ts = window.forecast_timestamp(ForecastOffset::new(18).unwrap());
        assert_eq!(ts, at(2024, 3, 2, 6, 0));
    }

    #[test]
    fn test_forecast_offset_validation() {
        assert!(ForecastOffset::new(0).is_ok());
        assert!(ForecastOffset::new(360).is_ok());
        assert_eq!(ForecastOffset::new(7), Err(ScheduleError::InvalidOffset(7)));
        assert_eq!(
            ForecastOffset::new(363),
            Err(ScheduleError::InvalidOffset(363))
        );
    }

    #[test]
    fn test_default_offset_range() {
        let offsets: Vec<u16> = OffsetRange::default()
            .offsets()
            .unwrap()
            .into_iter()
            .map(ForecastOffset::hours)
            .collect();
        assert_eq!(offsets, vec![9, 12, 15, 18]);
    }

    #[test]
    fn test_offset_range_errors() {
        assert!(matches!(
            OffsetRange::new(9, 18, 0).offsets(),
            Err(ScheduleError::InvalidRange { .. })
        ));
        assert!(matches!(
            OffsetRange::new(18, 9, 3).offsets(),
            Err(ScheduleError::InvalidRange { .. })
        ));
        assert_eq!(
            OffsetRange::new(9, 12, 2).offsets(),
            Err(ScheduleError::InvalidOffset(11))
        );
    }

    #[test]
    fn test_window_display() {
        let window = ReleaseWindow::new(ReleaseHour::Midnight, date(2024, 3, 1));
        assert_eq!(window.to_string(), "2024-03-01 00z");
    }
}
