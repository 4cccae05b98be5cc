//! Session Entity
//!
//! Server-side session record. The presence of `session_user_id` is the only
//! signed-in predicate; the other fields are carried along with it.

use kernel::id::SessionId;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::value_object::UserId;

/// Stored session values, serialized as the record body in the session store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mobile: Option<bool>,
    /// Unix seconds
    #[serde(
        default,
        deserialize_with = "lenient_expiry",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry_time: Option<i64>,
}

/// Anything but an integer reads as "no expiry", which renewal skips
fn lenient_expiry<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_i64())
}

/// Expiry rules applied on every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub max_age_secs: i64,
    pub sliding_window: Option<SlidingWindow>,
}

/// Extend expiry to `now + duration` once fewer than `threshold` seconds remain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindow {
    pub duration_secs: i64,
    pub threshold_secs: i64,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    data: SessionData,
    is_new: bool,
}

impl Session {
    /// A fresh anonymous session, created during the current request
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            data: SessionData::default(),
            is_new: true,
        }
    }

    /// A session read back from the store
    pub fn existing(id: SessionId, data: SessionData) -> Self {
        Self {
            id,
            data,
            is_new: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Created during the current request; the browser does not know its id yet
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_signed_in(&self) -> bool {
        self.data.session_user_id.is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.data.session_user_id
    }

    /// Absent flag reads as `false`
    pub fn is_mobile(&self) -> bool {
        self.data.is_mobile.unwrap_or(false)
    }

    pub fn expiry_time(&self) -> Option<i64> {
        self.data.expiry_time
    }

    pub fn sign_in(&mut self, user_id: UserId, is_mobile: bool) {
        self.data.session_user_id = Some(user_id);
        self.data.is_mobile = Some(is_mobile);
    }

    pub fn sign_out(&mut self) {
        self.data.session_user_id = None;
    }

    /// Apply the expiry policy at `now` (Unix seconds).
    ///
    /// Returns `true` when the expiry changed and the session must be stored.
    /// A new session always gets `now + max_age`, with or without a sliding
    /// window. An existing session without an expiry is left alone.
    pub fn renew(&mut self, now: i64, policy: &ExpiryPolicy) -> bool {
        if self.is_new {
            self.data.expiry_time = Some(now.saturating_add(policy.max_age_secs));
            return true;
        }

        let Some(window) = policy.sliding_window else {
            return false;
        };
        let Some(expiry) = self.data.expiry_time else {
            return false;
        };

        if expiry.saturating_sub(now) <= window.threshold_secs {
            self.data.expiry_time = Some(now.saturating_add(window.duration_secs));
            true
        } else {
            false
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sliding() -> ExpiryPolicy {
        ExpiryPolicy {
            max_age_secs: 3600,
            sliding_window: Some(SlidingWindow {
                duration_secs: 1800,
                threshold_secs: 1200,
            }),
        }
    }

    #[test]
    fn test_new_session_gets_max_age() {
        let mut session = Session::new();
        assert!(session.renew(0, &sliding()));
        assert_eq!(session.expiry_time(), Some(3600));

        let fixed = ExpiryPolicy {
            max_age_secs: 3600,
            sliding_window: None,
        };
        let mut session = Session::new();
        assert!(session.renew(100, &fixed));
        assert_eq!(session.expiry_time(), Some(3700));
    }

    #[test]
    fn test_sliding_window_extends_near_expiry() {
        let mut session = Session::new();
        session.renew(0, &sliding());
        let mut session = Session::existing(session.id(), session.data().clone());

        // 1100s left, under the threshold
        assert!(session.renew(2500, &sliding()));
        assert_eq!(session.expiry_time(), Some(4300));
    }

    #[test]
    fn test_sliding_window_leaves_fresh_session() {
        let mut session = Session::new();
        session.renew(0, &sliding());
        let mut session = Session::existing(session.id(), session.data().clone());

        assert!(!session.renew(500, &sliding()));
        assert_eq!(session.expiry_time(), Some(3600));
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let mut session = Session::existing(
            SessionId::new(),
            SessionData {
                expiry_time: Some(2200),
                ..Default::default()
            },
        );
        assert!(session.renew(1000, &sliding()));
        assert_eq!(session.expiry_time(), Some(2800));
    }

    #[test]
    fn test_missing_expiry_is_skipped() {
        let mut session = Session::existing(SessionId::new(), SessionData::default());
        assert!(!session.renew(10_000, &sliding()));
        assert_eq!(session.expiry_time(), None);
    }

    #[test]
    fn test_extreme_values_saturate() {
        let policy = ExpiryPolicy {
            max_age_secs: i64::MAX,
            sliding_window: Some(SlidingWindow {
                duration_secs: i64::MAX,
                threshold_secs: 1200,
            }),
        };
        let mut session = Session::new();
        assert!(session.renew(1_700_000_000, &policy));
        assert_eq!(session.expiry_time(), Some(i64::MAX));

        let mut session = Session::existing(
            SessionId::new(),
            SessionData {
                expiry_time: Some(i64::MIN),
                ..Default::default()
            },
        );
        assert!(session.renew(1_700_000_000, &policy));
        assert_eq!(session.expiry_time(), Some(i64::MAX));
    }

    #[test]
    fn test_sign_in_and_out() {
        let mut session = Session::new();
        assert!(!session.is_signed_in());
        assert!(!session.is_mobile());

        session.sign_in(UserId::new(7), true);
        assert_eq!(session.user_id(), Some(UserId::new(7)));
        assert!(session.is_mobile());

        session.sign_out();
        session.sign_out();
        assert!(!session.is_signed_in());
    }

    #[test]
    fn test_data_json_layout() {
        let data = SessionData {
            session_user_id: Some(UserId::new(42)),
            is_mobile: Some(false),
            expiry_time: Some(1_700_000_000),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "session_user_id": 42,
                "is_mobile": false,
                "expiry_time": 1_700_000_000
            })
        );

        let empty: SessionData = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SessionData::default());
    }

    #[test]
    fn test_malformed_expiry_keeps_the_rest_of_the_record() {
        for raw in [
            r#"{"session_user_id":7,"is_mobile":true,"expiry_time":"soon"}"#,
            r#"{"session_user_id":7,"is_mobile":true,"expiry_time":1.5}"#,
            r#"{"session_user_id":7,"is_mobile":true,"expiry_time":null}"#,
        ] {
            let data: SessionData = serde_json::from_str(raw).unwrap();
            assert_eq!(data.session_user_id, Some(UserId::new(7)));
            assert_eq!(data.is_mobile, Some(true));
            assert_eq!(data.expiry_time, None);
        }
    }
}
