//! The persisted session log and the operations that mutate it.
//!
//! The whole log lives under a single key as a JSON array. The ongoing
//! session is the one without an end time; there is no separate pointer.
//! Every mutation loads the log, edits it in memory and writes it back once,
//! serialized by an async mutex so two toggles in the same process cannot
//! interleave.

use super::types::{to_millis, DeskState, Session};
use crate::storage::{KeyValueStore, PersistenceError};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Key under which the session log is stored.
pub const SESSIONS_KEY: &str = "standing-desk-sessions";

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A new session was requested while another one is still open.
    #[error("already tracking {0}; end the current session first")]
    AlreadyTracking(DeskState),

    /// An operation needed an ongoing session but there is none.
    #[error("not tracking; start standing or sitting first")]
    NotTracking,
}

/// Outcome of an atomic toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    /// The session that was closed, if one was ongoing
    pub closed: Option<Session>,
    /// The newly opened session
    pub started: Session,
}

/// Owns the session log in a [`KeyValueStore`].
pub struct SessionStore<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying key-value store.
    pub fn backend(&self) -> &S {
        &self.store
    }

    /// All sessions, ordered by start time ascending.
    ///
    /// A log that cannot be decoded is an error; sessions are never dropped
    /// silently.
    pub async fn sessions(&self) -> Result<Vec<Session>, PersistenceError> {
        let Some(raw) = self.store.get(SESSIONS_KEY).await? else {
            return Ok(Vec::new());
        };

        let mut sessions: Vec<Session> =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Malformed {
                key: SESSIONS_KEY.to_string(),
                source,
            })?;
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }

    /// The ongoing session, if any.
    pub async fn current_session(&self) -> Result<Option<Session>, PersistenceError> {
        let sessions = self.sessions().await?;
        Ok(ongoing(&sessions).map(|i| sessions[i].clone()))
    }

    /// State of the ongoing session, or `None` when not tracking.
    pub async fn current_state(&self) -> Result<Option<DeskState>, PersistenceError> {
        Ok(self.current_session().await?.map(|s| s.state))
    }

    /// Seconds since the ongoing session started, or `0` when not tracking.
    pub async fn current_session_elapsed(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, PersistenceError> {
        Ok(self
            .current_session()
            .await?
            .map(|s| s.duration_secs(now))
            .unwrap_or(0))
    }

    /// Open a new session in `state` starting at `timestamp`.
    ///
    /// Fails with [`SessionError::AlreadyTracking`] if a session is still
    /// open; use [`SessionStore::toggle`] to switch states.
    pub async fn set_state(
        &self,
        state: DeskState,
        timestamp: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.sessions().await?;

        if let Some(i) = ongoing(&sessions) {
            return Err(SessionError::AlreadyTracking(sessions[i].state));
        }

        let started = append_session(&mut sessions, state, timestamp);
        self.save(&sessions).await?;
        info!(state = %state, start = %started.start_time, "started session");
        Ok(started)
    }

    /// Close the ongoing session at `timestamp` (default: now).
    ///
    /// Returns the closed session, or `None` if nothing was ongoing.
    pub async fn end_current_session(
        &self,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Option<Session>, SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.sessions().await?;

        let timestamp = timestamp.unwrap_or_else(Utc::now);
        let Some(closed) = close_ongoing(&mut sessions, timestamp) else {
            debug!("no ongoing session to end");
            return Ok(None);
        };

        self.save(&sessions).await?;
        info!(state = %closed.state, end = ?closed.end_time, "ended session");
        Ok(Some(closed))
    }

    /// Close the ongoing session and open one in `state`, both at `now`.
    ///
    /// The log is written once, so the change is all-or-nothing. Asking for
    /// the state already in progress fails with [`SessionError::AlreadyTracking`]
    /// and leaves the ongoing session intact.
    pub async fn toggle(
        &self,
        state: DeskState,
        now: DateTime<Utc>,
    ) -> Result<Toggle, SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.sessions().await?;

        if let Some(i) = ongoing(&sessions) {
            if sessions[i].state == state {
                return Err(SessionError::AlreadyTracking(state));
            }
        }

        let closed = close_ongoing(&mut sessions, now);
        let started = append_session(&mut sessions, state, now);
        self.save(&sessions).await?;

        info!(
            from = ?closed.as_ref().map(|s| s.state),
            to = %state,
            at = %started.start_time,
            "toggled state"
        );
        Ok(Toggle { closed, started })
    }

    /// Toggle to the opposite of the current state.
    pub async fn switch(&self, now: DateTime<Utc>) -> Result<Toggle, SessionError> {
        let current = self.current_state().await?.ok_or(SessionError::NotTracking)?;
        self.toggle(current.opposite(), now).await
    }

    async fn save(&self, sessions: &[Session]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(sessions)?;
        self.store.set(SESSIONS_KEY, json).await
    }
}

/// Index of the ongoing session. Scans from the end since it is normally last.
fn ongoing(sessions: &[Session]) -> Option<usize> {
    sessions.iter().rposition(Session::is_ongoing)
}

/// Set the ongoing session's end time, clamped so it never precedes the start.
fn close_ongoing(sessions: &mut [Session], timestamp: DateTime<Utc>) -> Option<Session> {
    let i = ongoing(sessions)?;
    let session = &mut sessions[i];
    let mut end = to_millis(timestamp);
    if end < session.start_time {
        warn!(
            start = %session.start_time,
            requested_end = %end,
            "end time precedes start time; recording zero duration"
        );
        end = session.start_time;
    }
    session.end_time = Some(end);
    Some(session.clone())
}

/// Append an ongoing session, keeping the log free of overlaps.
fn append_session(
    sessions: &mut Vec<Session>,
    state: DeskState,
    timestamp: DateTime<Utc>,
) -> Session {
    let mut session = Session::start(state, timestamp);
    if let Some(last) = sessions.last() {
        let floor = last.end_time.unwrap_or(last.start_time);
        if session.start_time < floor {
            warn!(
                requested_start = %session.start_time,
                previous_end = %floor,
                "start time precedes previous session; clamping"
            );
            session.start_time = floor;
        }
    }
    sessions.push(session.clone());
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    fn store() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_empty_log() {
        let store = store();
        assert!(store.sessions().await.unwrap().is_empty());
        assert_eq!(store.current_state().await.unwrap(), None);
        assert_eq!(store.current_session_elapsed(t0()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_state_and_elapsed() {
        let store = store();
        store.set_state(DeskState::Standing, t0()).await.unwrap();

        assert_eq!(
            store.current_state().await.unwrap(),
            Some(DeskState::Standing)
        );
        let elapsed = store
            .current_session_elapsed(t0() + Duration::seconds(600))
            .await
            .unwrap();
        assert_eq!(elapsed, 600);
    }

    #[tokio::test]
    async fn test_set_state_refuses_second_open_session() {
        let store = store();
        store.set_state(DeskState::Standing, t0()).await.unwrap();

        let err = store
            .set_state(DeskState::Sitting, t0() + Duration::minutes(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyTracking(DeskState::Standing)));
        assert_eq!(store.sessions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_end_current_session_is_idempotent() {
        let store = store();
        store.set_state(DeskState::Sitting, t0()).await.unwrap();

        let t1 = t0() + Duration::minutes(30);
        let closed = store.end_current_session(Some(t1)).await.unwrap();
        assert_eq!(closed.unwrap().end_time, Some(t1));

        let before = store.sessions().await.unwrap();
        let second = store
            .end_current_session(Some(t1 + Duration::minutes(5)))
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(store.sessions().await.unwrap(), before);
        assert_eq!(store.current_state().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_end_before_start_clamps_to_zero() {
        let store = store();
        store.set_state(DeskState::Standing, t0()).await.unwrap();

        let closed = store
            .end_current_session(Some(t0() - Duration::minutes(10)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.end_time, Some(t0()));
        assert_eq!(closed.duration_secs(t0() + Duration::hours(1)), 0);
    }

    #[tokio::test]
    async fn test_toggle_closes_and_opens_at_same_instant() {
        let store = store();
        store.set_state(DeskState::Standing, t0()).await.unwrap();

        let t1 = t0() + Duration::minutes(45);
        let toggle = store.toggle(DeskState::Sitting, t1).await.unwrap();

        let closed = toggle.closed.unwrap();
        assert_eq!(closed.state, DeskState::Standing);
        assert_eq!(closed.end_time, Some(t1));
        assert_eq!(toggle.started.start_time, t1);
        assert_eq!(toggle.started.state, DeskState::Sitting);

        let sessions = store.sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].end_time, Some(sessions[1].start_time));
    }

    #[tokio::test]
    async fn test_toggle_into_current_state_keeps_session_whole() {
        let store = store();
        store.toggle(DeskState::Standing, t0()).await.unwrap();

        let err = store
            .toggle(DeskState::Standing, t0() + Duration::minutes(30))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyTracking(DeskState::Standing)));

        let sessions = store.sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_ongoing());
        assert_eq!(sessions[0].start_time, t0());

        let summary = crate::stats::summarize(
            &sessions,
            DeskState::Standing,
            t0() + Duration::hours(1),
        );
        assert_eq!(summary.count, 1);
        assert_eq!(summary.longest_secs, 3600);
    }

    #[tokio::test]
    async fn test_toggle_from_not_tracking() {
        let store = store();
        let toggle = store.toggle(DeskState::Sitting, t0()).await.unwrap();
        assert!(toggle.closed.is_none());
        assert_eq!(store.current_state().await.unwrap(), Some(DeskState::Sitting));
    }

    #[tokio::test]
    async fn test_switch_requires_tracking() {
        let store = store();
        let err = store.switch(t0()).await.unwrap_err();
        assert!(matches!(err, SessionError::NotTracking));

        store.set_state(DeskState::Sitting, t0()).await.unwrap();
        let toggle = store.switch(t0() + Duration::minutes(5)).await.unwrap();
        assert_eq!(toggle.started.state, DeskState::Standing);
    }

    #[tokio::test]
    async fn test_start_before_previous_end_is_clamped() {
        let store = store();
        store.set_state(DeskState::Standing, t0()).await.unwrap();
        let t1 = t0() + Duration::hours(1);
        store.end_current_session(Some(t1)).await.unwrap();

        let started = store
            .set_state(DeskState::Sitting, t1 - Duration::minutes(20))
            .await
            .unwrap();
        assert_eq!(started.start_time, t1);
    }

    #[tokio::test]
    async fn test_malformed_log_is_an_error() {
        let store = store();
        store
            .backend()
            .set(SESSIONS_KEY, "{not json".to_string())
            .await
            .unwrap();

        let err = store.sessions().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Malformed { .. }));
        assert!(store.current_state().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_store_propagates() {
        let store = store();
        store.backend().set_unreachable(true);

        let err = store.set_state(DeskState::Standing, t0()).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Persistence(PersistenceError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_toggle_leaves_log_untouched() {
        let store = store();
        store.set_state(DeskState::Standing, t0()).await.unwrap();
        let before = store.sessions().await.unwrap();

        store.backend().set_unreachable(true);
        assert!(store
            .toggle(DeskState::Sitting, t0() + Duration::minutes(1))
            .await
            .is_err());
        store.backend().set_unreachable(false);

        assert_eq!(store.sessions().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_sessions_sorted_by_start() {
        let store = store();
        let later = Session {
            state: DeskState::Sitting,
            start_time: t0() + Duration::hours(1),
            end_time: Some(t0() + Duration::hours(2)),
        };
        let earlier = Session {
            state: DeskState::Standing,
            start_time: t0(),
            end_time: Some(t0() + Duration::hours(1)),
        };
        let json = serde_json::to_string(&vec![later.clone(), earlier.clone()]).unwrap();
        store.backend().set(SESSIONS_KEY, json).await.unwrap();

        assert_eq!(store.sessions().await.unwrap(), vec![earlier, later]);
    }
}
