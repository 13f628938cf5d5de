//! Reporting periods and their window boundaries.
//!
//! Day and month windows are calendar-aligned in the configured time zone;
//! the week window is the rolling seven days ending now.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity of the DST-gap search when local midnight does not exist.
const GAP_SEARCH_STEP_MINUTES: i64 = 15;

/// A reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Since local midnight today
    #[value(alias = "today")]
    Day,
    /// The last 7 × 24 hours
    Week,
    /// Since local midnight on the 1st of this month
    Month,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Heading used when displaying stats for this period.
    pub fn heading(self) -> &'static str {
        match self {
            Period::Day => "Today",
            Period::Week => "Last 7 days",
            Period::Month => "This month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "today" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(format!(
                "unknown period '{other}' (expected day, week or month)"
            )),
        }
    }
}

/// Start of the window for `period`, as seen at `now` in time zone `tz`.
pub fn period_start(now: DateTime<Utc>, period: Period, tz: Tz) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    match period {
        Period::Day => local_day_start(tz, today),
        Period::Week => now - Duration::days(7),
        Period::Month => {
            let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
            local_day_start(tz, first)
        }
    }
}

/// First instant of `date` in `tz`.
///
/// If midnight falls in a DST gap, the earliest valid local time that day is used.
pub fn local_day_start(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let steps = 24 * 60 / GAP_SEARCH_STEP_MINUTES;

    (0..steps)
        .map(|i| midnight + Duration::minutes(i * GAP_SEARCH_STEP_MINUTES))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}
