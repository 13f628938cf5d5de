//! Posture states and the persisted session record.

use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The posture being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeskState {
    Standing,
    Sitting,
}

impl DeskState {
    /// The state a toggle switches to.
    pub fn opposite(self) -> Self {
        match self {
            DeskState::Standing => DeskState::Sitting,
            DeskState::Sitting => DeskState::Standing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeskState::Standing => "Standing",
            DeskState::Sitting => "Sitting",
        }
    }

    /// Single-character marker used in compact titles.
    pub fn symbol(self) -> &'static str {
        match self {
            DeskState::Standing => "↑",
            DeskState::Sitting => "↓",
        }
    }
}

impl fmt::Display for DeskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standing" | "stand" => Ok(DeskState::Standing),
            "sitting" | "sit" => Ok(DeskState::Sitting),
            other => Err(format!("unknown desk state '{other}'")),
        }
    }
}

/// Label for an optional state, where `None` means not tracking.
pub fn state_label(state: Option<DeskState>) -> &'static str {
    state.map(DeskState::label).unwrap_or("Not Tracking")
}

/// Symbol for an optional state, where `None` means not tracking.
pub fn state_symbol(state: Option<DeskState>) -> &'static str {
    state.map(DeskState::symbol).unwrap_or("—")
}

/// Truncate an instant to the millisecond precision used on disk.
pub fn to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(3)
}

/// One contiguous interval spent in a single posture.
///
/// Serialized as `{"state": "standing", "startTime": <ms>, "endTime": <ms> | null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub state: DeskState,
    #[serde(with = "ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    /// `None` while the session is ongoing
    #[serde(default, with = "ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Session {
    /// Start a new ongoing session.
    pub fn start(state: DeskState, start_time: DateTime<Utc>) -> Self {
        Self {
            state,
            start_time: to_millis(start_time),
            end_time: None,
        }
    }

    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }

    /// End of the session as seen at `now`: the recorded end, or `now` if ongoing.
    pub fn effective_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end_time.unwrap_or(now)
    }

    /// Length in whole seconds, clamped at zero.
    pub fn duration_secs(&self, now: DateTime<Utc>) -> u64 {
        let secs = (self.effective_end(now) - self.start_time).num_seconds();
        secs.max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_opposite_state() {
        assert_eq!(DeskState::Standing.opposite(), DeskState::Sitting);
        assert_eq!(DeskState::Sitting.opposite(), DeskState::Standing);
    }

    #[test]
    fn test_labels_and_symbols() {
        assert_eq!(state_label(Some(DeskState::Standing)), "Standing");
        assert_eq!(state_label(None), "Not Tracking");
        assert_eq!(state_symbol(Some(DeskState::Sitting)), "↓");
        assert_eq!(state_symbol(None), "—");
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!("Standing".parse::<DeskState>(), Ok(DeskState::Standing));
        assert_eq!("sit".parse::<DeskState>(), Ok(DeskState::Sitting));
        assert!("lying".parse::<DeskState>().is_err());
    }

    #[test]
    fn test_wire_format() {
        let session = Session {
            state: DeskState::Standing,
            start_time: t(1_700_000_000_000),
            end_time: None,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "state": "standing",
                "startTime": 1_700_000_000_000_i64,
                "endTime": null,
            })
        );
    }

    #[test]
    fn test_missing_end_time_field_means_ongoing() {
        let session: Session =
            serde_json::from_str(r#"{"state":"sitting","startTime":1000}"#).unwrap();
        assert!(session.is_ongoing());
        assert_eq!(session.start_time, t(1000));
    }

    #[test]
    fn test_log_round_trip() {
        let log = vec![
            Session {
                state: DeskState::Sitting,
                start_time: t(1_000),
                end_time: Some(t(61_000)),
            },
            Session {
                state: DeskState::Standing,
                start_time: t(61_000),
                end_time: Some(t(121_500)),
            },
            Session {
                state: DeskState::Sitting,
                start_time: t(121_500),
                end_time: None,
            },
        ];

        let json = serde_json::to_string(&log).unwrap();
        let decoded: Vec<Session> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, log);
    }

    #[test]
    fn test_start_truncates_to_millis() {
        let precise = t(5_000) + Duration::nanoseconds(123_456);
        let session = Session::start(DeskState::Standing, precise);
        assert_eq!(session.start_time, t(5_000));
    }

    #[test]
    fn test_duration_clamps_negative() {
        let session = Session {
            state: DeskState::Standing,
            start_time: t(10_000),
            end_time: Some(t(5_000)),
        };
        assert_eq!(session.duration_secs(t(20_000)), 0);
    }

    #[test]
    fn test_ongoing_duration_uses_now() {
        let session = Session::start(DeskState::Sitting, t(0));
        assert_eq!(session.duration_secs(t(90_000)), 90);
    }
}
