//! In-Memory Session Store
//!
//! Process-local [`SessionStore`] for tests and single-instance local runs.
//! Records expire lazily: an expired record is dropped when next read.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use kernel::id::SessionId;
use tokio::sync::RwLock;

use crate::domain::entity::session::SessionData;
use crate::domain::repository::SessionStore;
use crate::error::{SsoError, SsoResult};

struct Entry {
    data: SessionData,
    ttl: Duration,
    /// `None` when the deadline lies beyond what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expires_at.is_none_or(|at| at > Instant::now())
    }
}

/// Cheap to clone; clones share the same records
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<RwLock<HashMap<SessionId, Entry>>>,
    fail_reads: Arc<AtomicBool>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `load` fail with `StoreReadFailed`
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// TTL the record was last saved with
    pub async fn ttl_of(&self, id: &SessionId) -> Option<Duration> {
        self.records.read().await.get(id).map(|entry| entry.ttl)
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> SsoResult<Option<SessionData>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SsoError::StoreReadFailed(
                "memory store is failing reads".to_string(),
            ));
        }

        {
            let records = self.records.read().await;
            match records.get(id) {
                None => return Ok(None),
                Some(entry) if entry.is_live() => {
                    return Ok(Some(entry.data.clone()));
                }
                Some(_) => {}
            }
        }

        self.records.write().await.remove(id);
        Ok(None)
    }

    async fn save(&self, id: &SessionId, data: &SessionData, ttl: Duration) -> SsoResult<()> {
        let entry = Entry {
            data: data.clone(),
            ttl,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.records.write().await.insert(*id, entry);
        Ok(())
    }
}
