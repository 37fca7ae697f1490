//! services/site/src/web/session.rs
//!
//! The per-request view of a visitor's session.

use meadowlark_core::domain::{FlashMessage, SessionData};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

struct SessionState {
    data: SessionData,
    dirty: bool,
}

/// A shared handle to the session attached to the current request.
///
/// The pipeline keeps one clone so it can write the session back to the
/// `SessionStore` once the handler is done with it. Nothing is written
/// unless the session was modified.
#[derive(Clone)]
pub struct SessionHandle {
    id: Arc<str>,
    is_new: bool,
    state: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    /// A brand-new, empty session with a random id.
    pub fn fresh() -> Self {
        Self::build(Uuid::new_v4().simple().to_string(), SessionData::default(), true)
    }

    /// A session loaded from the store.
    pub fn existing(id: impl Into<String>, data: SessionData) -> Self {
        Self::build(id.into(), data, false)
    }

    fn build(id: String, data: SessionData, is_new: bool) -> Self {
        Self {
            id: id.into(),
            is_new,
            state: Arc::new(Mutex::new(SessionState { data, dirty: false })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().await.data.get(key).cloned()
    }

    pub async fn insert(&self, key: &str, value: Value) {
        let mut state = self.state.lock().await;
        state.data.insert(key, value);
        state.dirty = true;
    }

    /// Queues `message` for the next page this visitor sees.
    pub async fn set_flash(&self, message: FlashMessage) {
        let mut state = self.state.lock().await;
        state.data.set_flash(message);
        state.dirty = true;
    }

    /// Reads and clears the pending flash. Only the enrichment chain calls
    /// this; handlers see the result through the render context.
    pub(crate) async fn take_flash(&self) -> Option<FlashMessage> {
        let mut state = self.state.lock().await;
        let flash = state.data.take_flash();
        if flash.is_some() {
            state.dirty = true;
        }
        flash
    }

    /// Returns a copy of the session if it changed during this request.
    pub(crate) async fn changes(&self) -> Option<SessionData> {
        let state = self.state.lock().await;
        state.dirty.then(|| state.data.clone())
    }
}
