//! Error Kind
//!
//! The HTTP classification every crate-specific error reduces to.

use serde::Serialize;

/// HTTP-facing classification of an error.
///
/// Serializes as a stable machine code (`"SERVICE_UNAVAILABLE"`), which the
/// problem-details body carries next to the status.
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::Unauthorized.status_code(), 401);
/// assert_eq!(ErrorKind::Unauthorized.to_string(), "Unauthorized");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Callback without a token, unparseable input
    BadRequest,
    /// No session, or a token that does not verify
    Unauthorized,
    NotFound,
    /// Unique or foreign key violation
    Conflict,
    InternalServerError,
    /// Database or session store unreachable
    ServiceUnavailable,
}

impl ErrorKind {
    const fn parts(&self) -> (u16, &'static str) {
        match self {
            ErrorKind::BadRequest => (400, "Bad Request"),
            ErrorKind::Unauthorized => (401, "Unauthorized"),
            ErrorKind::NotFound => (404, "Not Found"),
            ErrorKind::Conflict => (409, "Conflict"),
            ErrorKind::InternalServerError => (500, "Internal Server Error"),
            ErrorKind::ServiceUnavailable => (503, "Service Unavailable"),
        }
    }

    #[inline]
    pub const fn status_code(&self) -> u16 {
        self.parts().0
    }

    /// Reason phrase for the status
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.parts().1
    }

    /// Server-side failures; their details are logged, never rendered
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
