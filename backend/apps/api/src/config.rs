//! Environment Configuration
//!
//! Reads the server and SSO settings from the process environment (after
//! `.env` has been loaded). Unset variables fall back to the SSO defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sso::{GatePolicy, SessionConfig, SsoConfig};

/// Everything the server needs at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub primary_database_url: String,
    pub secondary_database_url: Option<String>,
    /// Comma-separated origins allowed to call with credentials
    pub frontend_origins: Vec<String>,
    pub sso: SsoConfig,
}

/// Source of configuration values, keyed by variable name
pub trait Source {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment
pub struct Env;

impl Source for Env {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_source(&Env)
    }

    pub fn from_source(src: &impl Source) -> anyhow::Result<Self> {
        let defaults = SsoConfig::default();

        let port = parse_or(src, "SSO_PORT", 8080u16)?;
        let primary_database_url = src
            .get("PRIMARY_DATABASE_URL")
            .context("PRIMARY_DATABASE_URL must be set in environment")?;

        let session = session_config(src)?;
        let gate_policy = match src.get("AUTH_GATE_POLICY").as_deref() {
            Some("redirect") => GatePolicy::Redirect,
            Some("reject") | None => GatePolicy::Reject,
            Some(other) => anyhow::bail!("AUTH_GATE_POLICY must be reject or redirect, got {other}"),
        };

        let sso = SsoConfig {
            sign_in_url: src.get("SIGN_IN_URL").unwrap_or(defaults.sign_in_url),
            sign_out_url: src.get("SIGN_OUT_URL").unwrap_or(defaults.sign_out_url),
            callback_url: src.get("CALLBACK_URL").unwrap_or(defaults.callback_url),
            root_url: src.get("ROOT_URL").unwrap_or(defaults.root_url),
            redis_uri: src.get("REDIS_URI").unwrap_or(defaults.redis_uri),
            session,
            gate_policy,
        };
        sso.validate()?;

        let frontend_origins = src
            .get("FRONTEND_ORIGINS")
            .map(|v| v.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_default();

        Ok(Self {
            port,
            primary_database_url,
            secondary_database_url: src.get("SECONDARY_DATABASE_URL"),
            frontend_origins,
            sso,
        })
    }
}

fn session_config(src: &impl Source) -> anyhow::Result<SessionConfig> {
    let defaults = SessionConfig::default();

    let name = src
        .get("SESSION_NAME")
        .unwrap_or_else(|| defaults.name().to_string());
    let secret = match src.get("SESSION_KEY") {
        Some(key) => key.into_bytes(),
        None => {
            tracing::warn!("SESSION_KEY not set; using the built-in development key");
            defaults.secret().to_vec()
        }
    };
    let max_age = parse_or(src, "SESSION_MAX_AGE", defaults.max_age().as_secs())?;
    let secure = parse_or(src, "SESSION_COOKIE_SECURE", true)?;

    let mut session = SessionConfig::new(name, secret, Duration::from_secs(max_age))?
        .with_cookie(secure, sso::config::SameSite::Lax);

    if parse_or(src, "ENABLE_SLIDING_WINDOW", false)? {
        let duration = parse_or(src, "SESSION_EXTENSION_DURATION", 1800u64)?;
        let threshold = parse_or(src, "SESSION_EXTENSION_THRESHOLD", 1200u64)?;
        session = session.with_sliding_window(
            Duration::from_secs(duration),
            Duration::from_secs(threshold),
        )?;
    }

    Ok(session)
}

fn parse_or<T>(src: &impl Source, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match src.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Map(HashMap<&'static str, &'static str>);

    impl Source for Map {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    fn source(pairs: &[(&'static str, &'static str)]) -> Map {
        let mut map: HashMap<_, _> = pairs.iter().copied().collect();
        map.entry("PRIMARY_DATABASE_URL")
            .or_insert("postgres://localhost/primary");
        Map(map)
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_source(&source(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.secondary_database_url, None);
        assert_eq!(config.sso.root_url, "http://localhost:8080");
        assert_eq!(config.sso.session.name(), "myapp_session");
        assert_eq!(config.sso.session.max_age(), Duration::from_secs(3600));
        assert!(config.sso.session.sliding_window().is_none());
    }

    #[test]
    fn test_primary_database_is_required() {
        let empty = Map(HashMap::new());
        assert!(ServerConfig::from_source(&empty).is_err());
    }

    #[test]
    fn test_sliding_window_from_env() {
        let config = ServerConfig::from_source(&source(&[
            ("ENABLE_SLIDING_WINDOW", "true"),
            ("SESSION_EXTENSION_DURATION", "900"),
            ("SESSION_EXTENSION_THRESHOLD", "120"),
        ]))
        .unwrap();

        let window = config.sso.session.sliding_window().unwrap();
        assert_eq!(window.extension_duration, Duration::from_secs(900));
        assert_eq!(window.extension_threshold, Duration::from_secs(120));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(ServerConfig::from_source(&source(&[("SESSION_MAX_AGE", "60")])).is_err());
        assert!(
            ServerConfig::from_source(&source(&[
                ("ENABLE_SLIDING_WINDOW", "true"),
                ("SESSION_EXTENSION_THRESHOLD", "10"),
            ]))
            .is_err()
        );
        assert!(ServerConfig::from_source(&source(&[("SSO_PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_gate_policy() {
        let config =
            ServerConfig::from_source(&source(&[("AUTH_GATE_POLICY", "redirect")])).unwrap();
        assert_eq!(config.sso.gate_policy, GatePolicy::Redirect);
        assert!(ServerConfig::from_source(&source(&[("AUTH_GATE_POLICY", "maybe")])).is_err());
    }
}
