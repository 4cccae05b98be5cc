//! Primary/Secondary Failover
//!
//! [`FailoverRepository`] wraps two backends of the same kind. Every call goes
//! to the primary first; if it fails for any reason, including a missing
//! record, the identical call is made once against the secondary and that
//! result is final.
//!
//! This is a standby, not replication. A write that succeeds on the primary
//! is never copied to the secondary, and a write that fails on the primary
//! lands only on the secondary. While the primary is down every write goes to
//! the secondary alone, so the two backends drift apart until something
//! outside this crate reconciles them.

use std::future::Future;

use crate::domain::entity::{
    token_grant::TokenGrant,
    user::{NewUser, User},
    verification_key::VerificationKey,
};
use crate::domain::repository::{
    SsoRepository, TokenGrantRepository, UserRepository, VerificationKeyRepository,
};
use crate::domain::value_object::UserId;
use crate::error::SsoResult;

#[derive(Clone)]
pub struct FailoverRepository<B> {
    primary: B,
    secondary: Option<B>,
}

impl<B> FailoverRepository<B>
where
    B: SsoRepository,
{
    pub fn new(primary: B, secondary: Option<B>) -> Self {
        Self { primary, secondary }
    }

    /// Run `call` on the primary, then on the secondary if the primary failed
    async fn with_failover<'a, T, F, Fut>(&'a self, operation: &'static str, call: F) -> SsoResult<T>
    where
        F: Fn(&'a B) -> Fut,
        Fut: Future<Output = SsoResult<T>>,
    {
        let primary_err = match call(&self.primary).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let Some(secondary) = &self.secondary else {
            return Err(primary_err);
        };

        tracing::warn!(
            operation,
            error = %primary_err,
            "Primary backend failed, retrying on secondary"
        );

        let result = call(secondary).await;
        if let Err(e) = &result {
            tracing::error!(operation, error = %e, "Secondary backend failed");
        }
        result
    }
}

impl<B> UserRepository for FailoverRepository<B>
where
    B: SsoRepository,
{
    async fn find_by_id(&self, user_id: UserId) -> SsoResult<User> {
        self.with_failover("find_by_id", |b| b.find_by_id(user_id))
            .await
    }

    async fn find_by_email(&self, email: &str) -> SsoResult<User> {
        self.with_failover("find_by_email", |b| b.find_by_email(email))
            .await
    }

    async fn create(&self, user: &NewUser) -> SsoResult<User> {
        self.with_failover("create_user", |b| b.create(user)).await
    }

    async fn update(&self, user: &User) -> SsoResult<()> {
        self.with_failover("update_user", |b| b.update(user)).await
    }

    async fn delete(&self, user_id: UserId) -> SsoResult<()> {
        self.with_failover("delete_user", |b| b.delete(user_id))
            .await
    }
}

impl<B> TokenGrantRepository for FailoverRepository<B>
where
    B: SsoRepository,
{
    async fn find_by_jti(&self, jti: &str) -> SsoResult<UserId> {
        self.with_failover("find_by_jti", |b| b.find_by_jti(jti))
            .await
    }

    async fn create_grant(&self, user_id: UserId, jti: &str) -> SsoResult<TokenGrant> {
        self.with_failover("create_grant", |b| b.create_grant(user_id, jti))
            .await
    }

    async fn delete_grant(&self, jti: &str) -> SsoResult<()> {
        self.with_failover("delete_grant", |b| b.delete_grant(jti))
            .await
    }
}

impl<B> VerificationKeyRepository for FailoverRepository<B>
where
    B: SsoRepository,
{
    async fn last_verification_key(&self) -> SsoResult<VerificationKey> {
        self.with_failover("last_verification_key", |b| b.last_verification_key())
            .await
    }

    async fn create_verification_key(&self, private_key_pem: &str) -> SsoResult<VerificationKey> {
        self.with_failover("create_verification_key", |b| {
            b.create_verification_key(private_key_pem)
        })
        .await
    }

    async fn delete_verification_key(&self, id: i64) -> SsoResult<()> {
        self.with_failover("delete_verification_key", |b| {
            b.delete_verification_key(id)
        })
        .await
    }
}
