//! services/site/src/adapters/session_store.rs
//!
//! An in-process implementation of the `SessionStore` port. Sessions are lost
//! on restart, which is acceptable for flash messages and the greeting page.

use async_trait::async_trait;
use chrono::Utc;
use meadowlark_core::domain::SessionData;
use meadowlark_core::ports::{PortResult, SessionStore};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Keeps sessions in a map guarded by an async read/write lock.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Creates a store whose sessions expire `ttl` after their last write.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> PortResult<Option<SessionData>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|session| !session.is_expired(Utc::now()))
            .cloned())
    }

    async fn put(&self, id: &str, mut session: SessionData) -> PortResult<()> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::days(1));
        session.set_expires_at(Utc::now() + ttl);
        self.sessions.write().await.insert(id.to_string(), session);
        Ok(())
    }

    async fn delete(&self, id: &str) -> PortResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn stored_sessions_round_trip() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let mut session = SessionData::default();
        session.insert("username", json!("ada"));

        store.put("abc", session).await.unwrap();
        let loaded = store.get("abc").await.unwrap().expect("session should exist");
        assert_eq!(loaded.get("username"), Some(&json!("ada")));
        assert!(loaded.expires_at().is_some());
    }

    #[tokio::test]
    async fn expired_sessions_read_as_absent() {
        let store = MemorySessionStore::new(Duration::ZERO);
        store.put("abc", SessionData::default()).await.unwrap();

        assert!(store.get("abc").await.unwrap().is_none());
        assert_eq!(store.purge_expired().await, 1);
    }

    #[tokio::test]
    async fn delete_removes_the_session() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.put("abc", SessionData::default()).await.unwrap();
        store.delete("abc").await.unwrap();
        assert!(store.get("abc").await.unwrap().is_none());
    }
}
