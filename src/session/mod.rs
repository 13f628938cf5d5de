//! Session tracking.
//!
//! This module contains:
//! - The posture state and session record types
//! - The session store that persists the log and enforces the single
//!   ongoing session

pub mod store;
pub mod types;

pub use store::{SessionError, SessionStore, Toggle, SESSIONS_KEY};
pub use types::{state_label, state_symbol, to_millis, DeskState, Session};
