//! Aggregate standing and sitting time over reporting periods.

pub mod engine;
pub mod period;

pub use engine::{
    calculate_stats, clip_to_window, period_stats, sessions_for_period, summarize,
    DurationSummary, PeriodStats, Stats,
};
pub use period::{local_day_start, period_start, Period};
