//! Auth Orchestrator
//!
//! Composes token validation, the backend repository and the session manager
//! into the callback flow and the identity queries used by handlers and host
//! applications.

use std::sync::Arc;

use crate::application::session_lifecycle::SessionManager;
use crate::application::token_validator::TokenValidator;
use crate::domain::entity::{session::Session, user::User};
use crate::domain::repository::{SessionStore, SsoRepository};
use crate::domain::value_object::UserId;
use crate::error::{SsoError, SsoResult};

/// Callback input
#[derive(Debug, Clone, Default)]
pub struct CallbackInput {
    /// Bearer token issued by the identity provider
    pub token: String,
    pub is_mobile: bool,
    /// Optional in-app destination passed back to the root URL
    pub endpoint: Option<String>,
}

/// Auth orchestrator
pub struct AuthOrchestrator<R, S>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    repo: Arc<R>,
    validator: TokenValidator<R>,
    sessions: SessionManager<S>,
}

impl<R, S> Clone for AuthOrchestrator<R, S>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            validator: self.validator.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<R, S> AuthOrchestrator<R, S>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, sessions: SessionManager<S>) -> Self {
        Self {
            validator: TokenValidator::new(repo.clone()),
            repo,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionManager<S> {
        &self.sessions
    }

    /// Validate the callback token and sign its user into `session`.
    ///
    /// A validation failure leaves the session untouched.
    pub async fn handle_callback(
        &self,
        input: &CallbackInput,
        session: &mut Session,
    ) -> SsoResult<UserId> {
        let user_id = self.validator.validate(&input.token).await?;
        self.sessions
            .sign_in(session, user_id, input.is_mobile)
            .await?;
        Ok(user_id)
    }

    /// Full user record for the signed-in session
    pub async fn user_for_session(&self, session: &Session) -> SsoResult<User> {
        let user_id = session.user_id().ok_or(SsoError::NotSignedIn)?;
        self.user_by_id(user_id).await
    }

    /// Full user record for a signed cookie value.
    ///
    /// A session store failure reads as "not signed in".
    pub async fn current_user(&self, cookie_token: Option<&str>) -> SsoResult<User> {
        let user_id = match self.sessions.user_id(cookie_token).await {
            Ok(user_id) => user_id,
            Err(SsoError::NotSignedIn) => return Err(SsoError::NotSignedIn),
            Err(e) => {
                tracing::warn!(error = %e, "Session read failed, treating as signed out");
                return Err(SsoError::NotSignedIn);
            }
        };
        self.user_by_id(user_id).await
    }

    /// Resolve a user id against the backend
    pub async fn user_by_id(&self, user_id: UserId) -> SsoResult<User> {
        self.repo
            .find_by_id(user_id)
            .await
            .map_err(|e| SsoError::UserLookupFailed(format!("user {user_id}: {e}")))
    }

    /// Never fails: absence and store errors both read as `false`
    pub async fn is_mobile(&self, cookie_token: Option<&str>) -> bool {
        self.sessions
            .is_mobile(cookie_token)
            .await
            .unwrap_or(false)
    }

    pub async fn is_signed_in(&self, cookie_token: Option<&str>) -> bool {
        self.sessions.is_signed_in(cookie_token).await
    }
}
