//! HTTP Handlers
//!
//! Every handler expects [`CurrentSession`] in the request extensions; the
//! router installs [`attach_session`](crate::presentation::middleware::attach_session)
//! for that.

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::config::SsoConfig;
use crate::application::orchestrator::AuthOrchestrator;
use crate::domain::repository::{SessionStore, SsoRepository};
use crate::error::SsoResult;
use crate::presentation::dto::{CallbackQuery, ErrorBody, UserInfoResponse, WebhookResponse};
use crate::presentation::middleware::CurrentSession;

/// Shared state for SSO handlers and middleware
pub struct SsoAppState<R, S>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    pub orchestrator: AuthOrchestrator<R, S>,
    pub config: Arc<SsoConfig>,
}

impl<R, S> Clone for SsoAppState<R, S>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            config: self.config.clone(),
        }
    }
}

/// 302 to `location`
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Root URL, with `?endpoint=<escaped>` when the callback named one
fn landing_url(root_url: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{}?endpoint={}", root_url, urlencoding::encode(endpoint)),
        None => root_url.to_string(),
    }
}

// ============================================================================
// Sign In / Sign Out
// ============================================================================

/// GET /signin
pub async fn sign_in<R, S>(
    State(state): State<SsoAppState<R, S>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Response
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    if session.is_signed_in() {
        return found(&state.config.root_url);
    }

    tracing::debug!(sign_in_url = %state.config.sign_in_url, "Redirecting to identity provider");
    found(&state.config.sign_in_url)
}

/// GET /signout
pub async fn sign_out<R, S>(
    State(state): State<SsoAppState<R, S>>,
    Extension(CurrentSession(mut session)): Extension<CurrentSession>,
) -> Response
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    if let Err(e) = state.orchestrator.sessions().sign_out(&mut session).await {
        tracing::error!(error = %e, "Failed to sign out");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Failed to sign out")),
        )
            .into_response();
    }

    found(&state.config.sign_in_url)
}

// ============================================================================
// Callback
// ============================================================================

/// GET /callback
pub async fn callback<R, S>(
    State(state): State<SsoAppState<R, S>>,
    Extension(CurrentSession(mut session)): Extension<CurrentSession>,
    Query(query): Query<CallbackQuery>,
) -> SsoResult<Response>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    let using_py_token = query.py_id_token.as_deref().is_some_and(|t| !t.is_empty());
    let input = query.into_input();

    let user_id = state
        .orchestrator
        .handle_callback(&input, &mut session)
        .await?;

    tracing::info!(user_id = %user_id, using_py_token, "Callback accepted");

    Ok(found(&landing_url(
        &state.config.root_url,
        input.endpoint.as_deref(),
    )))
}

// ============================================================================
// User
// ============================================================================

/// GET /user
pub async fn user<R, S>(
    State(state): State<SsoAppState<R, S>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> SsoResult<Response>
where
    R: SsoRepository,
    S: SessionStore + Send + Sync + 'static,
{
    if !session.is_signed_in() {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("Not signed in")),
        )
            .into_response());
    }

    let user = state.orchestrator.user_for_session(&session).await?;
    Ok(Json(UserInfoResponse::from(user)).into_response())
}

// ============================================================================
// Webhook / Health
// ============================================================================

/// POST /webhook/signout
///
/// Acknowledges the identity provider's sign-out notification. Sessions are
/// left to expire on their own.
pub async fn webhook_sign_out() -> Json<WebhookResponse> {
    Json(WebhookResponse {
        status: "logout".to_string(),
    })
}

/// GET /sso-health-check
pub async fn health_check() -> &'static str {
    "OK"
}
