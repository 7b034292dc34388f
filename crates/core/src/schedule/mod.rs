//! Release scheduling.
//!
//! Decides which forecast release should be processed for a given instant and
//! enumerates the forecast offsets fetched for it. Every function here takes
//! the current instant as an argument; nothing reads the wall clock.

mod clock;
mod types;

pub use clock::{latest_published, resolve_release};
pub use types::{ForecastOffset, OffsetRange, ReleaseHour, ReleaseWindow, ScheduleError};
