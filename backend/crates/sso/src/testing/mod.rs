//! Test doubles and fixtures shared by the crate's tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use tokio::sync::RwLock;

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

/// Active signing key for tokens the tests issue
pub const SIGNING_KEY_PEM: &str = include_str!("fixtures/signing_key.pem");
/// A second, unrelated RSA key
pub const FOREIGN_KEY_PEM: &str = include_str!("fixtures/foreign_key.pem");

/// Sign `claims` with RS256 using a PKCS#1 private key
pub fn sign_token(private_key_pem: &str, claims: &serde_json::Value) -> String {
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
}

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    grants: HashMap<String, UserId>,
    keys: Vec<VerificationKey>,
    next_user_id: u64,
    next_key_id: i64,
    next_grant_id: i64,
}

/// In-memory backend with a switch that makes every call fail
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent call fails with `BackendUnavailable`
    pub fn fail_all(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Number of repository calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn insert_user(&self, id: UserId, email: &str, name: &str) -> User {
        let now = Utc::now();
        let user = User {
            id,
            email: email.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.next_user_id = state.next_user_id.max(id.get());
        state.users.insert(id, user.clone());
        user
    }

    pub async fn insert_grant(&self, jti: &str, user_id: UserId) {
        self.state
            .write()
            .await
            .grants
            .insert(jti.to_string(), user_id);
    }

    pub async fn insert_key(&self, pem: &str) -> VerificationKey {
        let mut state = self.state.write().await;
        state.next_key_id += 1;
        let now = Utc::now();
        let key = VerificationKey {
            id: state.next_key_id,
            private_key_pem: pem.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.keys.push(key.clone());
        key
    }

    fn enter(&self) -> SsoResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SsoError::BackendUnavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

impl UserRepository for MemoryBackend {
    async fn find_by_id(&self, user_id: UserId) -> SsoResult<User> {
        self.enter()?;
        self.state
            .read()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or(SsoError::RecordNotFound("user"))
    }

    async fn find_by_email(&self, email: &str) -> SsoResult<User> {
        self.enter()?;
        self.state
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(SsoError::RecordNotFound("user"))
    }

    async fn create(&self, user: &NewUser) -> SsoResult<User> {
        self.enter()?;
        let id = {
            let mut state = self.state.write().await;
            state.next_user_id += 1;
            UserId::new(state.next_user_id)
        };
        Ok(self.insert_user(id, &user.email, &user.name).await)
    }

    async fn update(&self, user: &User) -> SsoResult<()> {
        self.enter()?;
        let mut state = self.state.write().await;
        let slot = state
            .users
            .get_mut(&user.id)
            .ok_or(SsoError::RecordNotFound("user"))?;
        *slot = user.clone();
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> SsoResult<()> {
        self.enter()?;
        self.state
            .write()
            .await
            .users
            .remove(&user_id)
            .map(|_| ())
            .ok_or(SsoError::RecordNotFound("user"))
    }
}

impl TokenGrantRepository for MemoryBackend {
    async fn find_by_jti(&self, jti: &str) -> SsoResult<UserId> {
        self.enter()?;
        self.state
            .read()
            .await
            .grants
            .get(jti)
            .copied()
            .ok_or(SsoError::RecordNotFound("access token"))
    }

    async fn create_grant(&self, user_id: UserId, jti: &str) -> SsoResult<TokenGrant> {
        self.enter()?;
        self.insert_grant(jti, user_id).await;

        let mut state = self.state.write().await;
        state.next_grant_id += 1;
        let now = Utc::now();
        Ok(TokenGrant {
            id: state.next_grant_id,
            user_id,
            jti: jti.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn delete_grant(&self, jti: &str) -> SsoResult<()> {
        self.enter()?;
        self.state
            .write()
            .await
            .grants
            .remove(jti)
            .map(|_| ())
            .ok_or(SsoError::RecordNotFound("access token"))
    }
}

impl VerificationKeyRepository for MemoryBackend {
    async fn last_verification_key(&self) -> SsoResult<VerificationKey> {
        self.enter()?;
        self.state
            .read()
            .await
            .keys
            .iter()
            .max_by_key(|k| k.id)
            .cloned()
            .ok_or(SsoError::RecordNotFound("verification key"))
    }

    async fn create_verification_key(&self, private_key_pem: &str) -> SsoResult<VerificationKey> {
        self.enter()?;
        Ok(self.insert_key(private_key_pem).await)
    }

    async fn delete_verification_key(&self, id: i64) -> SsoResult<()> {
        self.enter()?;
        let mut state = self.state.write().await;
        let before = state.keys.len();
        state.keys.retain(|k| k.id != id);
        if state.keys.len() == before {
            return Err(SsoError::RecordNotFound("verification key"));
        }
        Ok(())
    }
}
