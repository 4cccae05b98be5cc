//! SSO Client
//!
//! Clean Architecture structure:
//! - `domain/` - Session, user and key entities, repository traits
//! - `application/` - Token validation, session lifecycle, callback flow
//! - `infra/` - PostgreSQL backends, primary/secondary failover, session stores
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Flow
//! - The identity provider redirects back to `/callback` with a signed token
//! - The token is verified against the newest stored RSA key and its `jti`
//!   is resolved to a user through the token grants
//! - The user id is stored in a server-side session; the browser only holds an
//!   HMAC-signed session id cookie
//!
//! ## Failure Model
//! - Reads and writes go to the primary backend, then once to the secondary
//! - Session attachment is fail-open, authentication checks are fail-closed

pub mod application;
pub mod client;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use application::config::{GatePolicy, SessionConfig, SsoConfig};
pub use client::{SsoClient, SsoClientBuilder};
pub use error::{SsoError, SsoResult};
pub use infra::{FailoverRepository, MemorySessionStore, PgSsoRepository, RedisSessionStore};
pub use presentation::middleware::{
    attach_session, require_auth, set_is_mobile, set_user_id,
};
pub use presentation::router::sso_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
