// src/store/mod.rs
pub mod file;
pub mod memory;
pub mod redis_kv;

use std::sync::Arc;

use crate::error::StoreError;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use redis_kv::RedisStore;

/// Last-seen fragment per key. Keys are owned by exactly one source.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Overwrites unconditionally.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Pick a backend from the URL scheme:
/// `redis://` / `rediss://`, `file://<path>`, or `memory://`.
pub fn open_store(url: &str) -> Result<Arc<dyn StateStore>, StoreError> {
    if url.starts_with("redis://") || url.starts_with("rediss://") {
        return Ok(Arc::new(RedisStore::open(url)?));
    }
    if let Some(path) = url.strip_prefix("file://") {
        if path.is_empty() {
            return Err(StoreError::UnsupportedUrl(url.to_string()));
        }
        return Ok(Arc::new(FileStore::new(path)));
    }
    if url.starts_with("memory://") {
        return Ok(Arc::new(MemoryStore::new()));
    }
    Err(StoreError::UnsupportedUrl(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_selects_backend() {
        assert!(open_store("memory://").is_ok());
        assert!(open_store("file://state/last_seen.json").is_ok());
        assert!(open_store("redis://127.0.0.1:6379/0").is_ok());
        assert!(matches!(
            open_store("postgres://db"),
            Err(StoreError::UnsupportedUrl(_))
        ));
        assert!(matches!(
            open_store("file://"),
            Err(StoreError::UnsupportedUrl(_))
        ));
    }
}
