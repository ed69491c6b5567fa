use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::Result;

/// Key-value storage holding the serialized state blob under
/// [`STATE_CACHE_KEY`](super::STATE_CACHE_KEY).
#[async_trait]
pub trait StateCacheTrait: Send + Sync {
    /// Returns the stored blob, if any.
    async fn load(&self) -> Result<Option<String>>;

    /// Replaces the stored blob.
    async fn save(&self, blob: String) -> Result<()>;

    /// Deletes the entry. Removing a missing entry is not an error.
    async fn remove(&self) -> Result<()>;
}

/// In-process cache used by tests and by hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStateCache {
    blob: RwLock<Option<String>>,
}

impl MemoryStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
        }
    }

    pub async fn snapshot(&self) -> Option<String> {
        self.blob.read().await.clone()
    }
}

#[async_trait]
impl StateCacheTrait for MemoryStateCache {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.read().await.clone())
    }

    async fn save(&self, blob: String) -> Result<()> {
        *self.blob.write().await = Some(blob);
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        *self.blob.write().await = None;
        Ok(())
    }
}
