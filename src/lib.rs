//! Standing Desk Tracker - record standing and sitting sessions.
//!
//! The tracker keeps an append-only log of posture sessions in a key-value
//! store and derives standing vs. sitting totals for the current day, the
//! last week or the current month.
//!
//! # Guarantees
//!
//! - **One open session**: at most one session lacks an end time
//! - **No gaps on toggle**: a switch closes the old session and opens the new
//!   one at the same instant, in a single write
//! - **No silent loss**: a log that cannot be decoded is an error, never an
//!   empty or partial result
//! - **Single source of totals**: period stats already include the ongoing
//!   session, clipped to now
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Standing Desk Tracker                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Storage   │◀──│  Sessions   │──▶│    Stats    │       │
//! │  │ (key/value) │   │ (log+toggle)│   │ (periods)   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                            │                 │              │
//! │                            ▼                 ▼              │
//! │                     ┌─────────────────────────────┐        │
//! │                     │     Status snapshot / CLI    │        │
//! │                     └─────────────────────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use standing_desk_tracker::{DeskState, FileStore, SessionStore};
//!
//! # async fn run() -> Result<(), standing_desk_tracker::SessionError> {
//! let store = SessionStore::new(FileStore::new("/tmp/desk"));
//! store.toggle(DeskState::Standing, Utc::now()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod format;
pub mod session;
pub mod stats;
pub mod status;
pub mod storage;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use format::format_duration;
pub use session::{DeskState, Session, SessionError, SessionStore, Toggle};
pub use stats::{
    calculate_stats, period_stats, sessions_for_period, DurationSummary, Period, PeriodStats,
    Stats,
};
pub use status::StatusSnapshot;
pub use storage::{FileStore, KeyValueStore, MemoryStore, PersistenceError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
