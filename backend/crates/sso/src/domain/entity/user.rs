//! User Entity
//!
//! Identity record owned by the backend. The SSO client only reads it, except
//! for create/update pass-through.

use chrono::{DateTime, Utc};

use crate::domain::value_object::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Unique across users
    pub email: String,
    /// Display name
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User fields supplied on creation; id and timestamps come from the backend.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
}
