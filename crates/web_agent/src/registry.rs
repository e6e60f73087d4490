use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::session::FormSession;

/// A live session as stored in the registry. The per-key mutex is what
/// serializes concurrent exchanges for one key; different keys lock
/// independently and run in parallel.
pub type SessionHandle = Arc<Mutex<FormSession>>;

/// Keyed cache of live sessions plus the errors retained for the error page.
///
/// Each session inserts its own entry on the first initialization exchange
/// and removes it on exit or close; nothing ever iterates the map.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionHandle>>,
    errors: Mutex<HashMap<String, String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: impl Into<String>, session: SessionHandle) {
        self.sessions.lock().await.insert(key.into(), session);
    }

    pub async fn remove(&self, key: &str) -> Option<SessionHandle> {
        self.sessions.lock().await.remove(key)
    }

    pub async fn get(&self, key: &str) -> Option<SessionHandle> {
        self.sessions.lock().await.get(key).cloned()
    }

    /// Retain the error that closed a session so the error page can show it.
    pub async fn store_error(&self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.lock().await.insert(key.into(), message.into());
    }

    pub async fn take_error(&self, key: &str) -> Option<String> {
        self.errors.lock().await.remove(key)
    }
}
