//! The authenticated-session state machine.
//!
//! Holds the broker access token for the lifetime of the process. A session
//! is "authenticated" while a token is present and its expiry lies strictly
//! in the future; the expiry is the next occurrence of a fixed daily cutoff
//! (06:00 local by default), mirroring the broker's end-of-trading-day token
//! invalidation rather than a fixed TTL.

use chrono::{DateTime, Duration, Local};
use serde::Serialize;
use std::sync::RwLock;

pub mod error;

pub use error::{Error, Result};

#[derive(Debug, Default, Clone)]
struct SessionState {
    access_token: Option<String>,
    expires_at: Option<DateTime<Local>>,
    user_id: Option<String>,
}

/// A snapshot handed to callers that passed the authentication check.
#[derive(Debug, Clone)]
pub struct AuthorizedSession {
    pub access_token: String,
    pub user_id: Option<String>,
}

/// Connection status as reported by `/auth/status`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub connected: bool,
    pub expires_at: Option<DateTime<Local>>,
    pub user_id: Option<String>,
}

/// Process-wide session state behind a read/write lock, so a session
/// exchange or reset is atomic with respect to authentication checks.
pub struct SessionStore {
    cutoff_hour: u32,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(cutoff_hour: u32) -> Self {
        Self {
            cutoff_hour: cutoff_hour.min(23),
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Records a freshly exchanged session.
    pub fn connect(&self, access_token: String, user_id: String) {
        self.connect_at(access_token, user_id, Local::now());
    }

    fn connect_at(&self, access_token: String, user_id: String, now: DateTime<Local>) {
        let expires_at = next_cutoff(now, self.cutoff_hour);
        let mut state = self.state.write().expect("session lock poisoned");
        *state = SessionState {
            access_token: Some(access_token),
            expires_at: Some(expires_at),
            user_id: Some(user_id),
        };
    }

    /// True iff a token is present and its expiry is strictly in the future.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Local::now())
    }

    fn is_authenticated_at(&self, now: DateTime<Local>) -> bool {
        let state = self.state.read().expect("session lock poisoned");
        state.access_token.is_some() && state.expires_at.is_some_and(|expiry| expiry > now)
    }

    /// Fails with `Unauthenticated` unless a valid session exists.
    pub fn require_authenticated(&self) -> Result<AuthorizedSession> {
        let now = Local::now();
        let state = self.state.read().expect("session lock poisoned");
        match (&state.access_token, state.expires_at) {
            (Some(token), Some(expiry)) if expiry > now => Ok(AuthorizedSession {
                access_token: token.clone(),
                user_id: state.user_id.clone(),
            }),
            _ => Err(Error::Unauthenticated),
        }
    }

    /// Resets to the empty state (logout-equivalent, also used in teardown).
    pub fn clear(&self) {
        let mut state = self.state.write().expect("session lock poisoned");
        *state = SessionState::default();
    }

    pub fn status(&self) -> SessionStatus {
        let connected = self.is_authenticated();
        let state = self.state.read().expect("session lock poisoned");
        SessionStatus {
            connected,
            expires_at: state.expires_at,
            user_id: state.user_id.clone(),
        }
    }
}

/// The next occurrence of `cutoff_hour:00:00` local time strictly after `now`.
fn next_cutoff(now: DateTime<Local>, cutoff_hour: u32) -> DateTime<Local> {
    for offset in 0..2 {
        let date = now.date_naive() + Duration::days(offset);
        if let Some(candidate) = date
            .and_hms_opt(cutoff_hour, 0, 0)
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
            && candidate > now
        {
            return candidate;
        }
    }
    // Unreachable for a sane cutoff hour; keeps the function total.
    now + Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn expiry_is_next_morning_cutoff_for_daytime_exchange() {
        let now = local(2024, 3, 12, 10, 30);
        assert_eq!(next_cutoff(now, 6), local(2024, 3, 13, 6, 0));
    }

    #[test]
    fn expiry_is_same_day_cutoff_for_pre_dawn_exchange() {
        let now = local(2024, 3, 12, 4, 45);
        assert_eq!(next_cutoff(now, 6), local(2024, 3, 12, 6, 0));
    }

    #[test]
    fn cutoff_is_strictly_after_now() {
        // Exactly at the cutoff, the session must roll to the next day.
        let now = local(2024, 3, 12, 6, 0);
        assert_eq!(next_cutoff(now, 6), local(2024, 3, 13, 6, 0));
    }

    #[test]
    fn fresh_store_is_unauthenticated() {
        let store = SessionStore::new(6);
        assert!(!store.is_authenticated());
        assert!(store.require_authenticated().is_err());

        let status = store.status();
        assert!(!status.connected);
        assert!(status.expires_at.is_none());
    }

    #[test]
    fn connect_then_clear_round_trip() {
        let store = SessionStore::new(6);
        store.connect("tok".to_string(), "AB1234".to_string());
        assert!(store.is_authenticated());

        let session = store.require_authenticated().expect("authenticated");
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.user_id.as_deref(), Some("AB1234"));

        store.clear();
        assert!(!store.is_authenticated());
        assert!(store.require_authenticated().is_err());
    }

    #[test]
    fn expired_session_is_not_authenticated() {
        let store = SessionStore::new(6);
        store.connect_at(
            "tok".to_string(),
            "AB1234".to_string(),
            Local::now() - Duration::days(3),
        );
        assert!(!store.is_authenticated());
    }
}
