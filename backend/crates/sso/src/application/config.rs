//! Application Configuration
//!
//! Configuration for the SSO client. [`SessionConfig`] can only be built
//! through validating constructors, so a value in hand always satisfies the
//! bounds below.

use std::time::Duration;

use thiserror::Error;

use crate::domain::entity::session::{ExpiryPolicy, SlidingWindow};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;
use platform::cookie::CookieConfig;

/// Smallest accepted session max-age (5 minutes)
pub const MIN_MAX_AGE_SECS: u64 = 300;
/// Smallest accepted sliding-window extension (5 minutes)
pub const MIN_EXTENSION_DURATION_SECS: u64 = 300;
/// Smallest accepted sliding-window threshold (1 minute)
pub const MIN_EXTENSION_THRESHOLD_SECS: u64 = 60;
/// Largest accepted max-age or extension; also the ceiling Redis `EX` takes
pub const MAX_LIFETIME_SECS: u64 = i32::MAX as u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session max age must be at least {MIN_MAX_AGE_SECS}s, got {0}s")]
    MaxAgeTooShort(u64),

    #[error("session max age must be at most {MAX_LIFETIME_SECS}s, got {0}s")]
    MaxAgeTooLong(u64),

    #[error("session extension duration must be at least {MIN_EXTENSION_DURATION_SECS}s, got {0}s")]
    ExtensionTooShort(u64),

    #[error("session extension duration must be at most {MAX_LIFETIME_SECS}s, got {0}s")]
    ExtensionTooLong(u64),

    #[error("session extension threshold must be at least {MIN_EXTENSION_THRESHOLD_SECS}s, got {0}s")]
    ThresholdTooShort(u64),

    #[error("session name must not be empty")]
    EmptySessionName,

    #[error("session secret must not be empty")]
    EmptySecret,

    #[error("{0} must not be empty")]
    MissingUrl(&'static str),
}

/// Sliding-window settings, present only when enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindowConfig {
    pub extension_duration: Duration,
    pub extension_threshold: Duration,
}

/// Session configuration
#[derive(Clone)]
pub struct SessionConfig {
    name: String,
    secret: Vec<u8>,
    max_age: Duration,
    sliding_window: Option<SlidingWindowConfig>,
    cookie_secure: bool,
    cookie_same_site: SameSite,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("max_age", &self.max_age)
            .field("sliding_window", &self.sliding_window)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .finish()
    }
}

impl SessionConfig {
    /// Fixed-expiry session config
    pub fn new(
        name: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        max_age: Duration,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let secret = secret.into();

        if name.is_empty() {
            return Err(ConfigError::EmptySessionName);
        }
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if max_age.as_secs() < MIN_MAX_AGE_SECS {
            return Err(ConfigError::MaxAgeTooShort(max_age.as_secs()));
        }
        if max_age.as_secs() > MAX_LIFETIME_SECS {
            return Err(ConfigError::MaxAgeTooLong(max_age.as_secs()));
        }

        Ok(Self {
            name,
            secret,
            max_age,
            sliding_window: None,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
        })
    }

    /// Enable the sliding window
    pub fn with_sliding_window(
        mut self,
        extension_duration: Duration,
        extension_threshold: Duration,
    ) -> Result<Self, ConfigError> {
        if extension_duration.as_secs() < MIN_EXTENSION_DURATION_SECS {
            return Err(ConfigError::ExtensionTooShort(extension_duration.as_secs()));
        }
        if extension_duration.as_secs() > MAX_LIFETIME_SECS {
            return Err(ConfigError::ExtensionTooLong(extension_duration.as_secs()));
        }
        if extension_threshold.as_secs() < MIN_EXTENSION_THRESHOLD_SECS {
            return Err(ConfigError::ThresholdTooShort(
                extension_threshold.as_secs(),
            ));
        }

        self.sliding_window = Some(SlidingWindowConfig {
            extension_duration,
            extension_threshold,
        });
        Ok(self)
    }

    pub fn with_cookie(mut self, secure: bool, same_site: SameSite) -> Self {
        self.cookie_secure = secure;
        self.cookie_same_site = same_site;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn sliding_window(&self) -> Option<SlidingWindowConfig> {
        self.sliding_window
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            max_age_secs: secs_i64(self.max_age),
            sliding_window: self.sliding_window.map(|w| SlidingWindow {
                duration_secs: secs_i64(w.extension_duration),
                threshold_secs: secs_i64(w.extension_threshold),
            }),
        }
    }

    /// Attributes of the session cookie
    pub fn cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.max_age.as_secs()),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "myapp_session".to_string(),
            secret: b"your-session-key".to_vec(),
            max_age: Duration::from_secs(3600),
            sliding_window: None,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

fn secs_i64(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

/// What the auth gate does with an unauthenticated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatePolicy {
    /// 401 with `{"error":"Unauthorized"}`
    #[default]
    Reject,
    /// 302 to the sign-in URL
    Redirect,
}

/// SSO client configuration
#[derive(Debug, Clone)]
pub struct SsoConfig {
    /// Identity provider sign-in page
    pub sign_in_url: String,
    /// Identity provider sign-out page
    pub sign_out_url: String,
    /// Where the identity provider sends users back with a token
    pub callback_url: String,
    /// Application landing page after sign-in
    pub root_url: String,
    pub redis_uri: String,
    pub session: SessionConfig,
    pub gate_policy: GatePolicy,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            sign_in_url: "http://localhost:8080/auth/signin".to_string(),
            sign_out_url: "http://localhost:8080/auth/signout".to_string(),
            callback_url: "http://localhost:8080/auth/callback".to_string(),
            root_url: "http://localhost:8080".to_string(),
            redis_uri: "redis://:123456@localhost:6379/0".to_string(),
            session: SessionConfig::default(),
            gate_policy: GatePolicy::Reject,
        }
    }
}

impl SsoConfig {
    /// Create config for development (random secret, insecure cookie)
    pub fn development() -> Self {
        let secret = platform::crypto::random_bytes(32);
        let session = SessionConfig {
            secret,
            ..SessionConfig::default()
        }
        .with_cookie(false, SameSite::Lax);

        Self {
            session,
            ..Default::default()
        }
    }

    /// Check the URL fields. Session bounds are enforced when the
    /// [`SessionConfig`] is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("sign_in_url", &self.sign_in_url),
            ("root_url", &self.root_url),
            ("callback_url", &self.callback_url),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingUrl(field));
            }
        }
        Ok(())
    }
}
