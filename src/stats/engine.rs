//! Period filtering, clipping and per-state totals.
//!
//! These functions are the only place totals are computed. The ongoing
//! session is clipped into the window here, so callers must not add the
//! current elapsed time on top.

use super::period::{period_start, Period};
use crate::session::{DeskState, Session};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Accumulated seconds per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_standing: u64,
    pub total_sitting: u64,
}

impl Stats {
    pub fn total(&self) -> u64 {
        self.total_standing.saturating_add(self.total_sitting)
    }

    pub fn for_state(&self, state: DeskState) -> u64 {
        match state {
            DeskState::Standing => self.total_standing,
            DeskState::Sitting => self.total_sitting,
        }
    }

    fn add(&mut self, state: DeskState, secs: u64) {
        let slot = match state {
            DeskState::Standing => &mut self.total_standing,
            DeskState::Sitting => &mut self.total_sitting,
        };
        *slot = slot.saturating_add(secs);
    }
}

/// Totals for one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub period: Period,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: Stats,
}

impl PeriodStats {
    pub fn total(&self) -> u64 {
        self.stats.total()
    }

    /// Share of tracked time spent standing, or `None` if nothing was tracked.
    pub fn standing_ratio(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.stats.total_standing as f64 / total as f64)
    }
}

/// Duration statistics for the sessions of one state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub count: usize,
    pub mean_secs: f64,
    pub std_dev_secs: f64,
    pub longest_secs: u64,
}

/// Keep the sessions overlapping `[window_start, window_end]`, clipped to it.
///
/// Closed sessions are cut at both ends. The ongoing session keeps an open
/// end so [`calculate_stats`] counts it up to `window_end`; pass the same
/// instant there.
pub fn clip_to_window(
    sessions: &[Session],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<Session> {
    sessions
        .iter()
        .filter(|s| s.start_time < window_end && s.effective_end(window_end) > window_start)
        .map(|s| Session {
            state: s.state,
            start_time: s.start_time.max(window_start),
            end_time: s.end_time.map(|end| end.min(window_end)),
        })
        .collect()
}

/// Sessions overlapping `period` as of `now`, clipped to its window.
pub fn sessions_for_period(
    sessions: &[Session],
    period: Period,
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<Session> {
    clip_to_window(sessions, period_start(now, period, tz), now)
}

/// Sum `(end ?? now) - start` per state. Negative spans count as zero.
pub fn calculate_stats(sessions: &[Session], now: DateTime<Utc>) -> Stats {
    sessions.iter().fold(Stats::default(), |mut stats, s| {
        stats.add(s.state, s.duration_secs(now));
        stats
    })
}

/// Filter, clip and total `sessions` for `period` in one step.
pub fn period_stats(
    sessions: &[Session],
    period: Period,
    now: DateTime<Utc>,
    tz: Tz,
) -> PeriodStats {
    let window_start = period_start(now, period, tz);
    let clipped = clip_to_window(sessions, window_start, now);
    PeriodStats {
        period,
        window_start,
        window_end: now,
        stats: calculate_stats(&clipped, now),
    }
}

/// Count, mean, standard deviation and maximum of one state's session lengths.
pub fn summarize(sessions: &[Session], state: DeskState, now: DateTime<Utc>) -> DurationSummary {
    let secs: Vec<u64> = sessions
        .iter()
        .filter(|s| s.state == state)
        .map(|s| s.duration_secs(now))
        .collect();

    if secs.is_empty() {
        return DurationSummary::default();
    }

    let values: Vec<f64> = secs.iter().map(|&s| s as f64).collect();
    let std_dev = values.iter().std_dev();

    DurationSummary {
        count: secs.len(),
        mean_secs: values.iter().mean(),
        // Sample deviation is undefined for a single session.
        std_dev_secs: if std_dev.is_nan() { 0.0 } else { std_dev },
        longest_secs: secs.iter().copied().max().unwrap_or(0),
    }
}
