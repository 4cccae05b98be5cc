//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    session::{ExpiryPolicy, Session, SessionData, SlidingWindow},
    token_grant::TokenGrant,
    user::{NewUser, User},
    verification_key::VerificationKey,
};
pub use repository::{
    SessionStore, SsoRepository, TokenGrantRepository, UserRepository, VerificationKeyRepository,
};
