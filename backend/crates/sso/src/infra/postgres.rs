//! PostgreSQL Repository Implementations
//!
//! One [`PgSsoRepository`] per backend. Failover between backends lives in
//! [`crate::infra::failover`], not here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::{
    token_grant::TokenGrant,
    user::{NewUser, User},
    verification_key::VerificationKey,
};
use crate::domain::repository::{
    TokenGrantRepository, UserRepository, VerificationKeyRepository,
};
use crate::domain::value_object::UserId;
use crate::error::{SsoError, SsoResult};

/// PostgreSQL-backed SSO repository
#[derive(Clone)]
pub struct PgSsoRepository {
    pool: PgPool,
}

impl PgSsoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Error for a statement that was expected to touch exactly one row
fn expect_one(rows_affected: u64, entity: &'static str) -> SsoResult<()> {
    if rows_affected == 0 {
        Err(SsoError::RecordNotFound(entity))
    } else {
        Ok(())
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgSsoRepository {
    async fn find_by_id(&self, user_id: UserId) -> SsoResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(SsoError::RecordNotFound("user"))?.into_user()
    }

    async fn find_by_email(&self, email: &str) -> SsoResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(SsoError::RecordNotFound("user"))?.into_user()
    }

    async fn create(&self, user: &NewUser) -> SsoResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, name, created_at, updated_at)
            VALUES ($1, $2, now(), now())
            RETURNING id, email, name, created_at, updated_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await?;

        row.into_user()
    }

    async fn update(&self, user: &User) -> SsoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                name = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(user.id.to_db())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        expect_one(result.rows_affected(), "user")
    }

    async fn delete(&self, user_id: UserId) -> SsoResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.to_db())
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "user")
    }
}

// ============================================================================
// Token Grant Repository Implementation
// ============================================================================

impl TokenGrantRepository for PgSsoRepository {
    async fn find_by_jti(&self, jti: &str) -> SsoResult<UserId> {
        let user_id: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM user_access_tokens WHERE jti = $1")
                .bind(jti)
                .fetch_optional(&self.pool)
                .await?;

        let user_id = user_id.ok_or(SsoError::RecordNotFound("access token"))?;
        UserId::from_db(user_id).ok_or(SsoError::RecordNotFound("access token"))
    }

    async fn create_grant(&self, user_id: UserId, jti: &str) -> SsoResult<TokenGrant> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            INSERT INTO user_access_tokens (user_id, jti, created_at, updated_at)
            VALUES ($1, $2, now(), now())
            RETURNING id, user_id, jti, created_at, updated_at
            "#,
        )
        .bind(user_id.to_db())
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        row.into_grant()
    }

    async fn delete_grant(&self, jti: &str) -> SsoResult<()> {
        let result = sqlx::query("DELETE FROM user_access_tokens WHERE jti = $1")
            .bind(jti)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "access token")
    }
}

// ============================================================================
// Verification Key Repository Implementation
// ============================================================================

impl VerificationKeyRepository for PgSsoRepository {
    async fn last_verification_key(&self) -> SsoResult<VerificationKey> {
        let row = sqlx::query_as::<_, KeyRow>(
            r#"
            SELECT id, private_key, created_at, updated_at
            FROM ssh_keys
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.ok_or(SsoError::RecordNotFound("verification key"))?.into())
    }

    async fn create_verification_key(&self, private_key_pem: &str) -> SsoResult<VerificationKey> {
        let row = sqlx::query_as::<_, KeyRow>(
            r#"
            INSERT INTO ssh_keys (private_key, created_at, updated_at)
            VALUES ($1, now(), now())
            RETURNING id, private_key, created_at, updated_at
            "#,
        )
        .bind(private_key_pem)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete_verification_key(&self, id: i64) -> SsoResult<()> {
        let result = sqlx::query("DELETE FROM ssh_keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "verification key")
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> SsoResult<User> {
        let id = UserId::from_db(self.id).ok_or(SsoError::RecordNotFound("user"))?;

        Ok(User {
            id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GrantRow {
    id: i64,
    user_id: i64,
    jti: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GrantRow {
    fn into_grant(self) -> SsoResult<TokenGrant> {
        let user_id =
            UserId::from_db(self.user_id).ok_or(SsoError::RecordNotFound("access token"))?;

        Ok(TokenGrant {
            id: self.id,
            user_id,
            jti: self.jti,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct KeyRow {
    id: i64,
    private_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<KeyRow> for VerificationKey {
    fn from(row: KeyRow) -> Self {
        Self {
            id: row.id,
            private_key_pem: row.private_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
