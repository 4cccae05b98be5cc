//! SSO Error Types
//!
//! SSO-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::sqlx_error_kind, kind::ErrorKind};
use thiserror::Error;

use crate::application::config::ConfigError;

pub type SsoResult<T> = Result<T, SsoError>;

#[derive(Debug, Error)]
pub enum SsoError {
    // ---- callback / token validation ----
    #[error("Bearer token not provided")]
    MissingToken,

    /// The active verification key could not be fetched or parsed
    #[error("Verification key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token verified but carries no string `jti` claim
    #[error("Token has no jti claim")]
    MissingTokenId,

    #[error("Token id is not granted to any user")]
    UnknownTokenId,

    // ---- identity queries ----
    #[error("Not signed in")]
    NotSignedIn,

    #[error("User lookup failed: {0}")]
    UserLookupFailed(String),

    // ---- session store ----
    #[error("Session store read failed: {0}")]
    StoreReadFailed(String),

    #[error("Session store write failed: {0}")]
    StoreWriteFailed(String),

    // ---- repository ----
    #[error("{0} not found")]
    RecordNotFound(&'static str),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SsoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SsoError::MissingToken => ErrorKind::BadRequest,
            SsoError::KeyUnavailable(_) => ErrorKind::ServiceUnavailable,
            SsoError::InvalidToken(_)
            | SsoError::MissingTokenId
            | SsoError::UnknownTokenId
            | SsoError::NotSignedIn => ErrorKind::Unauthorized,
            SsoError::UserLookupFailed(_) => ErrorKind::InternalServerError,
            SsoError::StoreReadFailed(_) | SsoError::StoreWriteFailed(_) => {
                ErrorKind::ServiceUnavailable
            }
            SsoError::RecordNotFound(_) => ErrorKind::NotFound,
            SsoError::BackendUnavailable(e) => sqlx_error_kind(e),
            SsoError::Config(_) => ErrorKind::InternalServerError,
        }
    }

    /// Render as the workspace-wide error type.
    ///
    /// Backend details never reach the client; the message is the generic
    /// one for the kind.
    pub fn to_app_error(&self) -> AppError {
        let kind = self.kind();
        let message = if kind.is_server_error() {
            kind.as_str().to_string()
        } else {
            self.to_string()
        };

        let err = AppError::new(kind, message);
        match self {
            SsoError::NotSignedIn | SsoError::InvalidToken(_) | SsoError::UnknownTokenId => {
                err.with_action("Sign in again")
            }
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            SsoError::BackendUnavailable(e) => {
                tracing::error!(error = %e, "SSO backend error");
            }
            SsoError::KeyUnavailable(msg) => {
                tracing::error!(message = %msg, "Verification key unavailable");
            }
            SsoError::StoreReadFailed(msg) | SsoError::StoreWriteFailed(msg) => {
                tracing::error!(message = %msg, "Session store error");
            }
            SsoError::UserLookupFailed(msg) => {
                tracing::error!(message = %msg, "User lookup failed");
            }
            SsoError::InvalidToken(_) | SsoError::MissingTokenId | SsoError::UnknownTokenId => {
                tracing::warn!(error = %self, "Rejected callback token");
            }
            _ => {
                tracing::debug!(error = %self, "SSO error");
            }
        }
    }
}

impl IntoResponse for SsoError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
