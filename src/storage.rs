use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Persistent string key-value store for serialized decryption grants.
///
/// Absence is always "no cached grant", never an error; write failures are
/// the implementation's problem and must not surface to callers.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Option<String>;
    async fn set_item(&self, key: &str, value: &str);
}

/// In-memory store; grants live for the process lifetime only.
#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    async fn set_item(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_string(), value.to_string());
    }
}
