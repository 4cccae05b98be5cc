//! Token Validator
//!
//! Verifies an inbound bearer token against the active verification key and
//! resolves its `jti` claim to a user through the token grants.

use std::collections::HashSet;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind as JwtErrorKind};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Deserialize;

use crate::domain::entity::verification_key::VerificationKey;
use crate::domain::repository::{TokenGrantRepository, VerificationKeyRepository};
use crate::domain::value_object::UserId;
use crate::error::{SsoError, SsoResult};

/// Claims the client relies on. Everything else in the token is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub jti: String,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    jti: Option<serde_json::Value>,
}

/// Token validator
pub struct TokenValidator<R>
where
    R: TokenGrantRepository + VerificationKeyRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
}

impl<R> Clone for TokenValidator<R>
where
    R: TokenGrantRepository + VerificationKeyRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R> TokenValidator<R>
where
    R: TokenGrantRepository + VerificationKeyRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Validate `token` and return the user it was granted to
    pub async fn validate(&self, token: &str) -> SsoResult<UserId> {
        let claims = self.verify(token).await?;

        match self.repo.find_by_jti(&claims.jti).await {
            Ok(user_id) => Ok(user_id),
            Err(SsoError::RecordNotFound(_)) => Err(SsoError::UnknownTokenId),
            Err(e) => Err(e),
        }
    }

    /// Check the signature and extract the claims, without the grant lookup
    pub async fn verify(&self, token: &str) -> SsoResult<VerifiedClaims> {
        if token.is_empty() {
            return Err(SsoError::MissingToken);
        }

        let key = self
            .repo
            .last_verification_key()
            .await
            .map_err(|e| SsoError::KeyUnavailable(e.to_string()))?;
        let decoding_key = decoding_key(&key)?;

        let data = decode::<RawClaims>(token, &decoding_key, &validation())
            .map_err(|e| SsoError::InvalidToken(describe_jwt_error(&e)))?;

        match data.claims.jti {
            Some(serde_json::Value::String(jti)) => Ok(VerifiedClaims { jti }),
            _ => Err(SsoError::MissingTokenId),
        }
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.algorithms = vec![Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];
    // Only `jti` is consulted; `exp` is still checked when the token has one.
    validation.required_spec_claims = HashSet::new();
    validation.validate_aud = false;
    validation
}

/// Derive the public verification key from the stored private key
fn decoding_key(key: &VerificationKey) -> SsoResult<DecodingKey> {
    let pem = key.private_key_pem.trim();
    let private = RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| SsoError::KeyUnavailable(format!("key {} is not an RSA key: {e}", key.id)))?;

    let public_pem = RsaPublicKey::from(&private)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| SsoError::KeyUnavailable(e.to_string()))?;

    DecodingKey::from_rsa_pem(public_pem.as_bytes())
        .map_err(|e| SsoError::KeyUnavailable(e.to_string()))
}

fn describe_jwt_error(err: &jsonwebtoken::errors::Error) -> String {
    match err.kind() {
        JwtErrorKind::InvalidSignature => "signature mismatch".to_string(),
        JwtErrorKind::InvalidAlgorithm => "unexpected algorithm".to_string(),
        JwtErrorKind::ExpiredSignature => "token expired".to_string(),
        JwtErrorKind::ImmatureSignature => "token not yet valid".to_string(),
        JwtErrorKind::InvalidToken => "malformed token".to_string(),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryBackend, sign_token, FOREIGN_KEY_PEM, SIGNING_KEY_PEM};
    use serde_json::json;

    async fn validator() -> (TokenValidator<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::new();
        backend.insert_key(SIGNING_KEY_PEM).await;
        backend.insert_grant("jti-1", UserId::new(7)).await;
        (TokenValidator::new(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let (validator, _) = validator().await;
        let token = sign_token(SIGNING_KEY_PEM, &json!({ "jti": "jti-1" }));

        assert_eq!(validator.validate(&token).await.unwrap(), UserId::new(7));
    }

    #[tokio::test]
    async fn test_empty_token() {
        let (validator, _) = validator().await;
        assert!(matches!(
            validator.validate("").await,
            Err(SsoError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn test_foreign_signature_rejected() {
        let (validator, _) = validator().await;
        let token = sign_token(FOREIGN_KEY_PEM, &json!({ "jti": "jti-1" }));

        assert!(matches!(
            validator.validate(&token).await,
            Err(SsoError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_tampered_payload_rejected() {
        let (validator, _) = validator().await;
        let token = sign_token(SIGNING_KEY_PEM, &json!({ "jti": "jti-1" }));
        let other = sign_token(SIGNING_KEY_PEM, &json!({ "jti": "jti-2" }));

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(
            validator.validate(&forged).await,
            Err(SsoError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_or_non_string_jti() {
        let (validator, _) = validator().await;

        let token = sign_token(SIGNING_KEY_PEM, &json!({ "sub": "7", "user_id": 7 }));
        assert!(matches!(
            validator.validate(&token).await,
            Err(SsoError::MissingTokenId)
        ));

        let token = sign_token(SIGNING_KEY_PEM, &json!({ "jti": 12345 }));
        assert!(matches!(
            validator.validate(&token).await,
            Err(SsoError::MissingTokenId)
        ));
    }

    #[tokio::test]
    async fn test_unknown_jti() {
        let (validator, _) = validator().await;
        let token = sign_token(SIGNING_KEY_PEM, &json!({ "jti": "never-granted" }));

        assert!(matches!(
            validator.validate(&token).await,
            Err(SsoError::UnknownTokenId)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (validator, _) = validator().await;
        let token = sign_token(SIGNING_KEY_PEM, &json!({ "jti": "jti-1", "exp": 1_000 }));

        assert!(matches!(
            validator.validate(&token).await,
            Err(SsoError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_latest_key_is_used() {
        let (validator, backend) = validator().await;
        backend.insert_key(FOREIGN_KEY_PEM).await;

        let old = sign_token(SIGNING_KEY_PEM, &json!({ "jti": "jti-1" }));
        assert!(matches!(
            validator.validate(&old).await,
            Err(SsoError::InvalidToken(_))
        ));

        let new = sign_token(FOREIGN_KEY_PEM, &json!({ "jti": "jti-1" }));
        assert_eq!(validator.validate(&new).await.unwrap(), UserId::new(7));
    }

    #[tokio::test]
    async fn test_no_key_is_unavailable() {
        let backend = MemoryBackend::new();
        let validator = TokenValidator::new(Arc::new(backend));
        let token = sign_token(SIGNING_KEY_PEM, &json!({ "jti": "jti-1" }));

        assert!(matches!(
            validator.validate(&token).await,
            Err(SsoError::KeyUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unparseable_key_is_unavailable() {
        let backend = MemoryBackend::new();
        backend.insert_key("not a pem").await;
        let validator = TokenValidator::new(Arc::new(backend));
        let token = sign_token(SIGNING_KEY_PEM, &json!({ "jti": "jti-1" }));

        assert!(matches!(
            validator.validate(&token).await,
            Err(SsoError::KeyUnavailable(_))
        ));
    }
}
