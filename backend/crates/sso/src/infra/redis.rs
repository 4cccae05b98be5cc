//! Redis Session Store
//!
//! Session records are JSON values under `session_<uuid>`, written with
//! `SET ... EX` so that Redis expires them on its own.

use std::time::Duration;

use fred::prelude::{Client, ClientLike, Config, Expiration, KeysInterface, ReconnectPolicy};
use kernel::id::SessionId;

use crate::domain::entity::session::SessionData;
use crate::domain::repository::SessionStore;
use crate::error::{SsoError, SsoResult};

const KEY_PREFIX: &str = "session_";

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
}

impl RedisSessionStore {
    /// Wrap a client that is already initialized
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect to `uri` (`redis://:password@host:port/db`), reconnecting with
    /// exponential backoff when the connection drops
    pub async fn connect(uri: &str) -> Result<Self, fred::error::Error> {
        let config = Config::from_url(uri)?;
        let client = Client::new(
            config,
            None,
            None,
            Some(ReconnectPolicy::new_exponential(0, 1000, 30_000, 2)),
        );
        client.init().await?;

        Ok(Self::new(client))
    }
}

pub(crate) fn record_key(id: &SessionId) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Whole seconds, at least one: `EX 0` is rejected by Redis
fn expiry_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX)
}

impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &SessionId) -> SsoResult<Option<SessionData>> {
        let raw: Option<String> = self
            .client
            .get(record_key(id))
            .await
            .map_err(|e| SsoError::StoreReadFailed(e.to_string()))?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| SsoError::StoreReadFailed(format!("corrupt session record: {e}")))
    }

    async fn save(&self, id: &SessionId, data: &SessionData, ttl: Duration) -> SsoResult<()> {
        let json =
            serde_json::to_string(data).map_err(|e| SsoError::StoreWriteFailed(e.to_string()))?;

        self.client
            .set::<(), _, _>(
                record_key(id),
                json,
                Some(Expiration::EX(expiry_secs(ttl))),
                None,
                false,
            )
            .await
            .map_err(|e| SsoError::StoreWriteFailed(e.to_string()))
    }
}
