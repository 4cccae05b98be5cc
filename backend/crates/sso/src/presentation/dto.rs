//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::orchestrator::CallbackInput;
use crate::domain::entity::user::User;

// ============================================================================
// Callback
// ============================================================================

/// Query string of `GET /callback`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub id_token: Option<String>,
    /// Token variant used by some clients; wins over `id_token` when non-empty
    #[serde(default)]
    pub py_id_token: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// `true` or `1` marks a mobile client
    #[serde(default)]
    pub is_mobile: Option<String>,
}

impl CallbackQuery {
    pub fn token(&self) -> &str {
        match self.py_id_token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => self.id_token.as_deref().unwrap_or_default(),
        }
    }

    pub fn is_mobile(&self) -> bool {
        matches!(
            self.is_mobile.as_deref().map(str::trim),
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true")
        )
    }

    pub fn into_input(self) -> CallbackInput {
        CallbackInput {
            token: self.token().to_string(),
            is_mobile: self.is_mobile(),
            endpoint: self.endpoint.filter(|e| !e.is_empty()),
        }
    }
}

// ============================================================================
// User
// ============================================================================

/// Response of `GET /user`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfoResponse {
    pub id: u64,
    pub email: String,
    pub name: String,
}

impl From<User> for UserInfoResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.get(),
            email: user.email,
            name: user.name,
        }
    }
}

// ============================================================================
// Misc
// ============================================================================

/// `{"error": "..."}` body used by the redirect-style endpoints and the gate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response of `POST /webhook/signout`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: String,
}
