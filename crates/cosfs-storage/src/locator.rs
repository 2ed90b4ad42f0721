use std::collections::BTreeMap;
use std::sync::Arc;

use cosfs_core::error::{CosfsError, Result};

use crate::storage::FileStorage;

/// Named file storages plus which one is the default.
pub struct StorageLocator {
    storages: BTreeMap<String, Arc<dyn FileStorage>>,
    default_name: String,
}

impl StorageLocator {
    pub fn new(default_name: impl Into<String>) -> Self {
        Self {
            storages: BTreeMap::new(),
            default_name: default_name.into(),
        }
    }

    /// Register a storage under its own name, replacing any previous one.
    pub fn register(&mut self, storage: Arc<dyn FileStorage>) {
        self.storages
            .insert(storage.storage_name().to_string(), storage);
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn default_storage(&self) -> Result<Arc<dyn FileStorage>> {
        self.by_name(&self.default_name)
    }

    pub fn by_name(&self, name: &str) -> Result<Arc<dyn FileStorage>> {
        self.storages
            .get(name)
            .cloned()
            .ok_or_else(|| CosfsError::StorageNotFound(name.to_string()))
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn FileStorage>> {
        self.storages.values()
    }
}
