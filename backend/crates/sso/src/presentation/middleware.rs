//! SSO Middleware
//!
//! - [`attach_session`]: loads or creates the session for every request
//!   (fail-open) and applies sliding-window renewal.
//! - [`require_auth`]: rejects or redirects unauthenticated requests
//!   (fail-closed).
//! - [`set_user_id`], [`set_is_mobile`]: non-blocking helpers that expose
//!   session values to downstream handlers.
//!
//! All four are meant for `axum::middleware::from_fn_with_state` with an
//! [`SsoAppState`].

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use platform::cookie::extract_cookie;

use crate::application::config::GatePolicy;
use crate::domain::entity::session::Session;
use crate::domain::repository::{SessionStore, SsoRepository};
use crate::domain::value_object::UserId;
use crate::presentation::dto::ErrorBody;
use crate::presentation::handlers::{SsoAppState, found};

pub const IS_MOBILE_HEADER: HeaderName = HeaderName::from_static("is-mobile");

/// Session attached to the request by [`attach_session`]
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

/// Signed-in user, set by [`require_auth`] and [`set_user_id`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

/// Mobile-client flag, set by [`set_is_mobile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsMobile(pub bool);

/// Where a middleware finds the request's session
enum SessionSource {
    /// Put there by [`attach_session`]
    Attached(Session),
    /// Nothing attached; the session cookie value, if the request has one
    Cookie(Option<String>),
}

/// Owned so that nothing borrowed from the request is held across an await:
/// its body is not `Sync`.
fn session_source(req: &Request<Body>, cookie_name: &str) -> SessionSource {
    match req.extensions().get::<CurrentSession>() {
        Some(CurrentSession(session)) => SessionSource::Attached(session.clone()),
        None => SessionSource::Cookie(extract_cookie(req.headers(), cookie_name)),
    }
}

/// The attached session if any, else the one named by the cookie. `None` when
/// the store read fails.
async fn resolve_session<R, S>(
    state: &SsoAppState<R, S>,
    source: SessionSource,
) -> Option<Session>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    let token = match source {
        SessionSource::Attached(session) => return Some(session),
        SessionSource::Cookie(token) => token,
    };

    match state.orchestrator.sessions().load(token.as_deref()).await {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(error = %e, "Session read failed");
            None
        }
    }
}

/// Middleware that ensures every request carries a session.
///
/// Runs once per request: a request that already has a [`CurrentSession`]
/// passes straight through.
pub async fn attach_session<R, S>(
    State(state): State<SsoAppState<R, S>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    if req.extensions().get::<CurrentSession>().is_some() {
        return next.run(req).await;
    }

    let sessions = state.orchestrator.sessions();
    let token = extract_cookie(req.headers(), sessions.config().name());
    let attached = sessions
        .attach(token.as_deref(), Utc::now().timestamp())
        .await;

    let set_cookie = if attached.issue_cookie {
        sessions.set_cookie(&attached.session)
    } else {
        None
    };

    req.extensions_mut()
        .insert(CurrentSession(attached.session));

    let mut response = next.run(req).await;
    if let Some(cookie) = set_cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// Middleware that requires a signed-in session
pub async fn require_auth<R, S>(
    State(state): State<SsoAppState<R, S>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    let source = session_source(&req, state.orchestrator.sessions().config().name());
    let user_id = resolve_session(&state, source)
        .await
        .and_then(|session| session.user_id());

    let Some(user_id) = user_id else {
        return match state.config.gate_policy {
            GatePolicy::Reject => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody::new("Unauthorized")),
            )
                .into_response(),
            GatePolicy::Redirect => found(&state.config.sign_in_url),
        };
    };

    req.extensions_mut().insert(AuthenticatedUser(user_id));
    next.run(req).await
}

/// Middleware that exposes the signed-in user id when there is one
pub async fn set_user_id<R, S>(
    State(state): State<SsoAppState<R, S>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    let source = session_source(&req, state.orchestrator.sessions().config().name());
    if let Some(user_id) = resolve_session(&state, source)
        .await
        .and_then(|session| session.user_id())
    {
        req.extensions_mut().insert(AuthenticatedUser(user_id));
    }

    next.run(req).await
}

/// Middleware that exposes the mobile flag and echoes it as `Is-Mobile`.
///
/// When the session cannot be read at all, nothing is set.
pub async fn set_is_mobile<R, S>(
    State(state): State<SsoAppState<R, S>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    let source = session_source(&req, state.orchestrator.sessions().config().name());
    let Some(session) = resolve_session(&state, source).await else {
        return next.run(req).await;
    };

    let is_mobile = session.is_mobile();
    req.extensions_mut().insert(IsMobile(is_mobile));

    let mut response = next.run(req).await;
    response.headers_mut().insert(
        IS_MOBILE_HEADER,
        HeaderValue::from_static(if is_mobile { "true" } else { "false" }),
    );
    response
}
