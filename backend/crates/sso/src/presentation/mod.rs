//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::SsoAppState;
pub use middleware::{
    AuthenticatedUser, CurrentSession, IsMobile, attach_session, require_auth, set_is_mobile,
    set_user_id,
};
pub use router::sso_router;
