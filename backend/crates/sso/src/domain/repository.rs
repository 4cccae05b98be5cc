//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infrastructure
//! layer.
//!
//! Lookups report a missing record as `Err(SsoError::RecordNotFound)` rather
//! than `Ok(None)`, so that the failover layer treats it like any other
//! primary failure.

use std::time::Duration;

use kernel::id::SessionId;

use crate::domain::entity::{
    session::SessionData,
    token_grant::TokenGrant,
    user::{NewUser, User},
    verification_key::VerificationKey,
};
use crate::domain::value_object::UserId;
use crate::error::SsoResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> SsoResult<User>;

    /// Find user by email
    async fn find_by_email(&self, email: &str) -> SsoResult<User>;

    /// Create a user, returning it with its assigned id
    async fn create(&self, user: &NewUser) -> SsoResult<User>;

    async fn update(&self, user: &User) -> SsoResult<()>;

    async fn delete(&self, user_id: UserId) -> SsoResult<()>;
}

/// Token grant (JTI -> user) repository trait
#[trait_variant::make(TokenGrantRepository: Send)]
pub trait LocalTokenGrantRepository {
    /// Resolve a token identifier to the user it was issued for
    async fn find_by_jti(&self, jti: &str) -> SsoResult<UserId>;

    async fn create_grant(&self, user_id: UserId, jti: &str) -> SsoResult<TokenGrant>;

    async fn delete_grant(&self, jti: &str) -> SsoResult<()>;
}

/// Verification key repository trait
#[trait_variant::make(VerificationKeyRepository: Send)]
pub trait LocalVerificationKeyRepository {
    /// The active key: highest id wins
    async fn last_verification_key(&self) -> SsoResult<VerificationKey>;

    async fn create_verification_key(&self, private_key_pem: &str) -> SsoResult<VerificationKey>;

    async fn delete_verification_key(&self, id: i64) -> SsoResult<()>;
}

/// External key-value store holding session records
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// `Ok(None)` when no record exists under `id`
    async fn load(&self, id: &SessionId) -> SsoResult<Option<SessionData>>;

    /// Write the record, replacing any previous one; it expires after `ttl`
    async fn save(&self, id: &SessionId, data: &SessionData, ttl: Duration) -> SsoResult<()>;
}

/// Everything the client reads from or writes to a relational backend
pub trait SsoRepository:
    UserRepository + TokenGrantRepository + VerificationKeyRepository + Send + Sync + 'static
{
}

impl<T> SsoRepository for T where
    T: UserRepository + TokenGrantRepository + VerificationKeyRepository + Send + Sync + 'static
{
}
