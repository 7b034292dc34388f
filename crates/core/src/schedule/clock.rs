//! Release selection.

use chrono::{DateTime, NaiveDate, Utc};

use super::types::{ReleaseHour, ReleaseWindow, ScheduleError};

/// Resolves the release to process at `now`.
///
/// An explicit `requested` hour must parse as a [`ReleaseHour`]; its date is
/// `date` when given, otherwise today (UTC). Without a requested hour the most
/// recently published release is picked, restricted to `date` when one is
/// supplied.
pub fn resolve_release(
    now: DateTime<Utc>,
    requested: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<ReleaseWindow, ScheduleError> {
    let requested = requested.map(str::parse::<ReleaseHour>).transpose()?;

    let window = match (requested, date) {
        (Some(hour), Some(date)) => ReleaseWindow::new(hour, date),
        (Some(hour), None) => ReleaseWindow::new(hour, now.date_naive()),
        (None, Some(date)) => latest_published_on(now, date)
            .unwrap_or_else(|| ReleaseWindow::new(ReleaseHour::latest(), date)),
        (None, None) => latest_published(now),
    };

    Ok(window)
}

/// The release whose publication most recently passed at `now`.
///
/// Before the first publication of the day this is the previous day's last
/// release.
pub fn latest_published(now: DateTime<Utc>) -> ReleaseWindow {
    let today = now.date_naive();
    latest_published_on(now, today).unwrap_or_else(|| {
        let yesterday = today.pred_opt().unwrap_or(today);
        ReleaseWindow::new(ReleaseHour::latest(), yesterday)
    })
}

fn latest_published_on(now: DateTime<Utc>, date: NaiveDate) -> Option<ReleaseWindow> {
    ReleaseHour::ALL
        .iter()
        .rev()
        .map(|hour| ReleaseWindow::new(*hour, date))
        .find(|window| window.is_available(now))
}
