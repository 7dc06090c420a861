//! Injected key-value persistence.
//!
//! The admin token lives in whatever storage the host offers (browser local
//! storage, a keychain, memory in tests). Components receive a
//! [`KeyValueStore`] instead of reaching for global state.

use std::collections::HashMap;
use std::sync::RwLock;

/// Key the admin bearer token is stored under.
pub const ADMIN_TOKEN_KEY: &str = "adminToken";

/// Minimal string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with an admin token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(ADMIN_TOKEN_KEY, token.into());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}
