//! Token Grant Entity
//!
//! Maps a token identifier (JTI) issued by the identity provider to the user
//! it was issued for. Grants are written by the issuer side and only looked up
//! here; `jti` is unique across all grants.

use chrono::{DateTime, Utc};

use crate::domain::value_object::UserId;

#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub id: i64,
    pub user_id: UserId,
    pub jti: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
