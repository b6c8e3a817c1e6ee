//! Session storage with lazy TTL expiry.
//!
//! The store is the only shared mutable resource of the dialogue core.
//! Lookups across distinct keys run concurrently; turns against the same key
//! are serialized by holding the returned per-session mutex for the duration
//! of the turn.

use crate::session::QuizSession;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Shared, per-key-lockable handle to one session's state.
pub type SessionHandle = Arc<Mutex<QuizSession>>;

/// Keyed storage of quiz sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolves a session key to its state, creating a fresh session under a
    /// new random key when the key is absent or unknown. Refreshes the
    /// session's last-accessed time and sweeps expired sessions first.
    async fn get_or_create(&self, key: Option<&str>) -> (String, SessionHandle);

    /// Evicts every session whose last access is older than the TTL.
    /// Invoked from `get_or_create`; there is no background reaper, so a
    /// session may outlive its TTL until the next lookup. That is acceptable.
    async fn sweep_expired(&self);

    /// Whether a session with this key is currently stored.
    async fn contains(&self, key: &str) -> bool;
}

struct Entry {
    handle: SessionHandle,
    last_accessed: Instant,
}

/// In-memory `SessionStore` backed by a mutex-guarded map.
pub struct MemorySessionStore {
    ttl: Duration,
    inner: Mutex<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn sweep_locked(&self, map: &mut HashMap<String, Entry>) {
        let ttl = self.ttl;
        let before = map.len();
        map.retain(|_, entry| entry.last_accessed.elapsed() <= ttl);
        let evicted = before - map.len();
        if evicted > 0 {
            debug!(evicted, "Swept expired sessions");
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_or_create(&self, key: Option<&str>) -> (String, SessionHandle) {
        let mut map = self.inner.lock().await;
        self.sweep_locked(&mut map);

        if let Some(key) = key {
            if let Some(entry) = map.get_mut(key) {
                entry.last_accessed = Instant::now();
                return (key.to_string(), entry.handle.clone());
            }
        }

        let new_key = Uuid::new_v4().to_string();
        let handle: SessionHandle = Arc::new(Mutex::new(QuizSession::default()));
        map.insert(
            new_key.clone(),
            Entry {
                handle: handle.clone(),
                last_accessed: Instant::now(),
            },
        );
        debug!(session_id = %new_key, "Created new session");
        (new_key, handle)
    }

    async fn sweep_expired(&self) {
        let mut map = self.inner.lock().await;
        self.sweep_locked(&mut map);
    }

    async fn contains(&self, key: &str) -> bool {
        self.inner.lock().await.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::QuizPhase;
    use tokio::time::{self, Duration};

    #[tokio::test]
    async fn absent_key_allocates_fresh_session() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let (key, handle) = store.get_or_create(None).await;
        assert!(store.contains(&key).await);
        assert_eq!(handle.lock().await.phase, QuizPhase::Setup);
    }

    #[tokio::test]
    async fn unknown_key_allocates_under_new_key() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let (key, _) = store.get_or_create(Some("no-such-session")).await;
        assert_ne!(key, "no-such-session");
        assert!(store.contains(&key).await);
    }

    #[tokio::test]
    async fn existing_key_returns_stored_session() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let (key, handle) = store.get_or_create(None).await;
        handle.lock().await.round_count = 7;

        let (resolved, handle_again) = store.get_or_create(Some(key.as_str())).await;
        assert_eq!(resolved, key);
        assert_eq!(handle_again.lock().await.round_count, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn untouched_session_expires_after_ttl() {
        let store = MemorySessionStore::new(Duration::from_secs(30));
        let (stale, _) = store.get_or_create(None).await;

        time::advance(Duration::from_secs(31)).await;
        // The sweep runs as a side effect of the next lookup.
        let (fresh, _) = store.get_or_create(None).await;

        assert!(!store.contains(&stale).await);
        assert!(store.contains(&fresh).await);
    }

    #[tokio::test(start_paused = true)]
    async fn touched_session_survives_ttl() {
        let store = MemorySessionStore::new(Duration::from_secs(30));
        let (key, _) = store.get_or_create(None).await;

        time::advance(Duration::from_secs(20)).await;
        let _ = store.get_or_create(Some(key.as_str())).await; // refreshes last_accessed
        time::advance(Duration::from_secs(20)).await;
        store.sweep_expired().await;

        assert!(store.contains(&key).await);
    }
}
