//! SSO Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::domain::repository::{SessionStore, SsoRepository};
use crate::presentation::handlers::{self, SsoAppState};
use crate::presentation::middleware::attach_session;

/// Create the SSO router.
///
/// Session routes run behind [`attach_session`]; the webhook and the health
/// check do not touch sessions.
pub fn sso_router<R, S>(state: SsoAppState<R, S>) -> Router
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    Router::new()
        .route("/signin", get(handlers::sign_in::<R, S>))
        .route("/signout", get(handlers::sign_out::<R, S>))
        .route("/callback", get(handlers::callback::<R, S>))
        .route("/user", get(handlers::user::<R, S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            attach_session::<R, S>,
        ))
        .route("/webhook/signout", post(handlers::webhook_sign_out))
        .route("/sso-health-check", get(handlers::health_check))
        .with_state(state)
}
