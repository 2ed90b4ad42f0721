use std::sync::{Arc, PoisonError, RwLock};

use cosfs_core::config::StorageSettings;
use cosfs_core::error::{CosfsError, Result};

use crate::client::ObjectClient;

/// An authenticated client together with the settings it was built from.
/// Never mutated after construction.
pub struct StorageClient {
    client: Arc<dyn ObjectClient>,
    settings: StorageSettings,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("bucket", &self.settings.bucket)
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    pub fn new(client: Arc<dyn ObjectClient>, settings: StorageSettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &dyn ObjectClient {
        self.client.as_ref()
    }

    pub fn bucket(&self) -> &str {
        &self.settings.bucket
    }

    pub fn chunk_size_bytes(&self) -> usize {
        self.settings.chunk_size_bytes()
    }

    pub fn settings(&self) -> &StorageSettings {
        &self.settings
    }
}

/// Hot-swappable reference to the live [`StorageClient`].
///
/// Readers take an `Arc` snapshot and keep using it for the whole operation;
/// a swap only affects operations started afterwards.
#[derive(Default)]
pub struct ClientHandle {
    current: RwLock<Option<Arc<StorageClient>>>,
}

impl ClientHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current client.
    pub fn get(&self) -> Result<Arc<StorageClient>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| CosfsError::IllegalState("storage client not initialized".to_string()))
    }

    /// Install `next`, returning the client it replaced.
    pub fn swap(&self, next: StorageClient) -> Option<Arc<StorageClient>> {
        let next = Arc::new(next);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.replace(next)
    }

    pub fn is_initialized(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
