//! Session Lifecycle
//!
//! Creation, sign-in, sign-out and sliding-window renewal of server-side
//! sessions. The session id travels to the browser in an HMAC-signed cookie;
//! everything else stays in the session store.

use std::sync::Arc;

use axum::http::HeaderValue;
use kernel::id::SessionId;
use platform::crypto::verify_signed_value;

use crate::application::config::SessionConfig;
use crate::domain::entity::session::Session;
use crate::domain::repository::SessionStore;
use crate::domain::value_object::UserId;
use crate::error::{SsoError, SsoResult};

/// Result of [`SessionManager::attach`]
#[derive(Debug, Clone)]
pub struct AttachedSession {
    pub session: Session,
    /// The session is new or its expiry moved, so the cookie must be (re)sent
    pub issue_cookie: bool,
}

/// Session manager
pub struct SessionManager<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    store: Arc<S>,
    config: Arc<SessionConfig>,
}

impl<S> Clone for SessionManager<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> SessionManager<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: Arc<SessionConfig>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Session for a signed cookie value.
    ///
    /// A missing, forged or unknown cookie yields a fresh anonymous session
    /// with a new id. Store failures are returned as errors.
    pub async fn load(&self, cookie_token: Option<&str>) -> SsoResult<Session> {
        let Some(session_id) = cookie_token.and_then(|token| self.parse_token(token)) else {
            return Ok(Session::new());
        };

        match self.store.load(&session_id).await? {
            Some(data) => Ok(Session::existing(session_id, data)),
            None => Ok(Session::new()),
        }
    }

    /// Write the session to the store with a TTL of max-age
    pub async fn save(&self, session: &Session) -> SsoResult<()> {
        self.store
            .save(&session.id(), session.data(), self.config.max_age())
            .await
    }

    pub async fn sign_in(
        &self,
        session: &mut Session,
        user_id: UserId,
        is_mobile: bool,
    ) -> SsoResult<()> {
        session.sign_in(user_id, is_mobile);
        self.save(session).await?;

        tracing::info!(user_id = %user_id, is_mobile, "User signed in");
        Ok(())
    }

    /// Idempotent: signing out an anonymous session just rewrites it
    pub async fn sign_out(&self, session: &mut Session) -> SsoResult<()> {
        let previous = session.user_id();
        session.sign_out();
        self.save(session).await?;

        if let Some(user_id) = previous {
            tracing::info!(user_id = %user_id, "User signed out");
        }
        Ok(())
    }

    /// Fail-closed: a store error reads as "not signed in"
    pub async fn is_signed_in(&self, cookie_token: Option<&str>) -> bool {
        match self.load(cookie_token).await {
            Ok(session) => session.is_signed_in(),
            Err(e) => {
                tracing::warn!(error = %e, "Session read failed, treating as signed out");
                false
            }
        }
    }

    pub async fn user_id(&self, cookie_token: Option<&str>) -> SsoResult<UserId> {
        self.load(cookie_token)
            .await?
            .user_id()
            .ok_or(SsoError::NotSignedIn)
    }

    /// Absent flag reads as `false`
    pub async fn is_mobile(&self, cookie_token: Option<&str>) -> SsoResult<bool> {
        Ok(self.load(cookie_token).await?.is_mobile())
    }

    /// Apply sliding-window renewal at `now` (Unix seconds), persisting on change
    pub async fn renew(&self, session: &mut Session, now: i64) -> SsoResult<bool> {
        if !session.renew(now, &self.config.expiry_policy()) {
            return Ok(false);
        }

        self.save(session).await?;
        tracing::debug!(
            session_id = %session.id(),
            expiry_time = ?session.expiry_time(),
            "Session expiry updated"
        );
        Ok(true)
    }

    /// Per-request attach: load and renew, never failing.
    ///
    /// A store read error fabricates a new session (fail-open). A failed
    /// renewal write is only logged.
    pub async fn attach(&self, cookie_token: Option<&str>, now: i64) -> AttachedSession {
        let mut session = match self.load(cookie_token).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Session read failed, starting a new session");
                Session::new()
            }
        };

        let renewed = match self.renew(&mut session, now).await {
            Ok(renewed) => renewed,
            Err(e) => {
                tracing::warn!(error = %e, session_id = %session.id(), "Session renewal not saved");
                false
            }
        };

        AttachedSession {
            issue_cookie: session.is_new() || renewed,
            session,
        }
    }

    /// Signed `Set-Cookie` value carrying the session id
    pub fn set_cookie(&self, session: &Session) -> Option<HeaderValue> {
        self.config
            .cookie()
            .signed_header_value(self.config.secret(), &session.id().to_string())
    }

    fn parse_token(&self, token: &str) -> Option<SessionId> {
        verify_signed_value(self.config.secret(), token)?.parse().ok()
    }
}
