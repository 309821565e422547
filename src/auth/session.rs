//! In-memory session store with sliding idle expiry.
//!
//! Sessions live only in process memory (one authenticating node): an
//! opaque random id maps to the principal resolved at login. Resolving
//! a session slides its idle window forward; a background sweeper
//! evicts abandoned entries so they do not accumulate.

use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::Principal;

/// Opaque ids are 32 random bytes, hex-encoded to 64 chars.
fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown session id")]
    Unknown,
    #[error("session expired")]
    Expired,
}

/// A resolved session as handed to request handlers.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub principal: Principal,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
struct SessionEntry {
    principal: Principal,
    created_at: chrono::DateTime<chrono::Utc>,
    /// Monotonic last-access instant; the idle window is measured from
    /// here, not from creation.
    last_accessed: Instant,
}

/// Thread-safe session store using dashmap
#[derive(Debug)]
pub struct SessionStore {
    entries: DashMap<String, SessionEntry>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            idle_timeout,
        }
    }

    /// Issue a fresh session for an authenticated principal, returning
    /// the opaque id the client carries in its cookie.
    pub fn create(&self, principal: Principal) -> String {
        let id = generate_session_id();
        self.entries.insert(
            id.clone(),
            SessionEntry {
                principal,
                created_at: chrono::Utc::now(),
                last_accessed: Instant::now(),
            },
        );
        id
    }

    /// Resolve an id to its session, sliding the idle window forward.
    /// Expired entries are evicted on the spot, so a later retry with
    /// the same id reports it as unknown.
    pub fn resolve(&self, id: &str) -> Result<Session, SessionError> {
        let now = Instant::now();

        let mut entry = self.entries.get_mut(id).ok_or(SessionError::Unknown)?;
        if now.duration_since(entry.last_accessed) > self.idle_timeout {
            // The guard must go before the map entry can be removed
            drop(entry);
            self.entries.remove(id);
            return Err(SessionError::Expired);
        }

        // Racing resolves keep the latest access; never slide backwards.
        entry.last_accessed = entry.last_accessed.max(now);

        Ok(Session {
            id: id.to_string(),
            principal: entry.principal.clone(),
            created_at: entry.created_at,
        })
    }

    /// Slide the idle window for an id without resolving the session.
    /// Unknown ids are ignored.
    pub fn touch(&self, id: &str) {
        if let Some(mut entry) = self.entries.get_mut(id) {
            entry.last_accessed = entry.last_accessed.max(Instant::now());
        }
    }

    /// Remove a session. Removing an unknown id is a no-op.
    pub fn destroy(&self, id: &str) {
        self.entries.remove(id);
    }

    /// Evict idle entries; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        // Logins can insert while retain walks the shards, so comparing
        // the map length before and after would not measure evictions.
        let removed = AtomicUsize::new(0);
        self.entries.retain(|_, entry| {
            if now.duration_since(entry.last_accessed) > self.idle_timeout {
                removed.fetch_add(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        });
        removed.into_inner()
    }

    /// Number of live sessions (for monitoring)
    pub fn session_count(&self) -> usize {
        self.entries.len()
    }
}

/// Spawn a background task to periodically evict idle sessions
pub fn spawn_sweeper(store: Arc<SessionStore>, sweep_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(sweep_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            let removed = store.sweep_expired();
            tracing::debug!(
                "Session sweep removed {} idle sessions, {} remaining",
                removed,
                store.session_count()
            );
        }
    });
}
