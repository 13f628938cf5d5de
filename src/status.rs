//! The snapshot a display polls on each refresh.
//!
//! Elapsed time and totals are derived from session timestamps at capture
//! time, so the refresh interval has no effect on their accuracy.

use crate::format::format_duration;
use crate::session::{state_label, state_symbol, DeskState, SessionStore};
use crate::stats::{period_stats, Period, PeriodStats};
use crate::storage::{KeyValueStore, PersistenceError};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Everything needed to render the tracker at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub state: Option<DeskState>,
    pub elapsed_secs: u64,
    pub today: PeriodStats,
    pub captured_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Read current state, elapsed time and today's totals from `store`.
    pub async fn capture<S: KeyValueStore>(
        store: &SessionStore<S>,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Result<Self, PersistenceError> {
        let sessions = store.sessions().await?;
        let current = sessions.iter().rev().find(|s| s.is_ongoing());

        Ok(Self {
            state: current.map(|s| s.state),
            elapsed_secs: current.map(|s| s.duration_secs(now)).unwrap_or(0),
            today: period_stats(&sessions, Period::Day, now, tz),
            captured_at: now,
        })
    }

    /// Compact title such as `"↑ 1h 5m"` or `"— Not Tracking"`.
    pub fn title(&self) -> String {
        match self.state {
            Some(state) => format!("{} {}", state.symbol(), format_duration(self.elapsed_secs)),
            None => format!("{} {}", state_symbol(None), state_label(None)),
        }
    }

    /// Multi-line report: current status followed by today's totals.
    pub fn report(&self) -> String {
        let current = match self.state {
            Some(state) => format!(
                "{} {} (elapsed: {})",
                state.symbol(),
                state.label(),
                format_duration(self.elapsed_secs)
            ),
            None => format!("{} {}", state_symbol(None), state_label(None)),
        };

        format!(
            "Current Status:\n\
             \x20 {current}\n\
             \n\
             {heading}'s Stats:\n\
             \x20 Standing: {standing}\n\
             \x20 Sitting:  {sitting}\n\
             \x20 Total:    {total}",
            heading = self.today.period.heading(),
            standing = format_duration(self.today.stats.total_standing),
            sitting = format_duration(self.today.stats.total_sitting),
            total = format_duration(self.today.total()),
        )
    }
}
