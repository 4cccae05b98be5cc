//! Cookie Management Infrastructure
//!
//! Parsing of the `Cookie` header and construction of `Set-Cookie` values.
//! Signed cookies carry `"<value>.<hmac>"` (see [`crate::crypto::sign_value`]).

use axum::http::{HeaderMap, HeaderValue, header};

use crate::crypto::sign_value;

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<u64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }
}

impl CookieConfig {
    /// Build a `Set-Cookie` header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        cookie.push_str(&format!("; Path={}", self.path));
        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));

        cookie
    }

    /// Build a `Set-Cookie` header value whose payload is HMAC-signed with `key`
    pub fn build_signed_set_cookie(&self, key: &[u8], value: &str) -> String {
        self.build_set_cookie(&sign_value(key, value))
    }

    /// Same as [`Self::build_signed_set_cookie`], as a header value
    pub fn signed_header_value(&self, key: &[u8], value: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.build_signed_set_cookie(key, value)).ok()
    }
}

/// Extract a cookie value from headers.
///
/// Browsers may split cookies over several `Cookie` headers; all are searched.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;

            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
}
