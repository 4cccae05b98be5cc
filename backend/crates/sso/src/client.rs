//! SSO Client Facade
//!
//! Entry point for host applications:
//!
//! ```ignore
//! let store = RedisSessionStore::connect(&config.redis_uri).await?;
//! let client = SsoClientBuilder::new(config, store)?
//!     .with_repository(PgSsoRepository::new(primary), secondary.map(PgSsoRepository::new));
//!
//! let app = Router::new()
//!     .nest("/auth", client.router())
//!     .layer(axum::middleware::from_fn_with_state(client.state(), sso::attach_session));
//! ```

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use platform::cookie::extract_cookie;

use crate::application::config::{ConfigError, SsoConfig};
use crate::application::orchestrator::AuthOrchestrator;
use crate::application::session_lifecycle::SessionManager;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionStore, SsoRepository};
use crate::domain::value_object::UserId;
use crate::error::SsoResult;
use crate::infra::failover::FailoverRepository;
use crate::presentation::handlers::SsoAppState;
use crate::presentation::router::sso_router;

/// Validated config and a session store, waiting for backends
pub struct SsoClientBuilder<S> {
    config: SsoConfig,
    store: S,
}

impl<S> SsoClientBuilder<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(config: SsoConfig, store: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, store })
    }

    /// Attach the primary backend and an optional standby
    pub fn with_repository<B>(self, primary: B, secondary: Option<B>) -> SsoClient<FailoverRepository<B>, S>
    where
        B: SsoRepository,
    {
        if secondary.is_none() {
            tracing::info!("No secondary backend configured; failover disabled");
        }

        let repo = Arc::new(FailoverRepository::new(primary, secondary));
        let config = Arc::new(self.config);
        let sessions = SessionManager::new(Arc::new(self.store), Arc::new(config.session.clone()));

        SsoClient {
            state: SsoAppState {
                orchestrator: AuthOrchestrator::new(repo, sessions),
                config,
            },
        }
    }
}

/// Ready-to-use SSO client
pub struct SsoClient<R, S>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    state: SsoAppState<R, S>,
}

impl<R, S> Clone for SsoClient<R, S>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<R, S> SsoClient<R, S>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    pub fn config(&self) -> &SsoConfig {
        &self.state.config
    }

    /// State for `axum::middleware::from_fn_with_state` with any of the
    /// middleware in [`crate::presentation::middleware`]
    pub fn state(&self) -> SsoAppState<R, S> {
        self.state.clone()
    }

    /// Sign-in, sign-out, callback, user, webhook and health routes
    pub fn router(&self) -> Router {
        sso_router(self.state.clone())
    }

    pub fn orchestrator(&self) -> &AuthOrchestrator<R, S> {
        &self.state.orchestrator
    }

    fn cookie_token(&self, headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, self.state.config.session.name())
    }

    /// Fail-closed sign-in check for the request carrying `headers`
    pub async fn is_user_signed_in(&self, headers: &HeaderMap) -> bool {
        let token = self.cookie_token(headers);
        self.state.orchestrator.is_signed_in(token.as_deref()).await
    }

    pub async fn user_id_from_session(&self, headers: &HeaderMap) -> SsoResult<UserId> {
        let token = self.cookie_token(headers);
        self.state
            .orchestrator
            .sessions()
            .user_id(token.as_deref())
            .await
    }

    pub async fn is_mobile(&self, headers: &HeaderMap) -> bool {
        let token = self.cookie_token(headers);
        self.state.orchestrator.is_mobile(token.as_deref()).await
    }

    pub async fn current_user(&self, headers: &HeaderMap) -> SsoResult<User> {
        let token = self.cookie_token(headers);
        self.state.orchestrator.current_user(token.as_deref()).await
    }

    pub async fn user_by_id(&self, user_id: UserId) -> SsoResult<User> {
        self.state.orchestrator.user_by_id(user_id).await
    }
}
