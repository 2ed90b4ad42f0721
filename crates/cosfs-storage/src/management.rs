//! Operational control over COS storages: forced client refreshes with
//! optional new credentials or settings.

use std::sync::Arc;

use cosfs_core::config::SettingsOverrides;
use cosfs_core::error::Result;
use tracing::info;

use crate::locator::StorageLocator;
use crate::storage::FileStorage;

pub const REFRESHED: &str = "Refreshed successfully";
pub const NOT_COS: &str = "Not a COS file storage - refresh attempt ignored";

/// Complete replacement settings for one storage.
#[derive(Debug, Clone)]
pub struct SettingsUpdate {
    pub secret_id: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,
    pub chunk_size_kb: u32,
    pub endpoint_url: Option<String>,
}

impl From<SettingsUpdate> for SettingsOverrides {
    fn from(u: SettingsUpdate) -> Self {
        Self {
            secret_id: Some(u.secret_id),
            secret_key: Some(u.secret_key),
            bucket: Some(u.bucket),
            region: Some(u.region),
            chunk_size_kb: Some(u.chunk_size_kb),
            endpoint_url: Some(u.endpoint_url),
        }
    }
}

pub struct StorageManagement {
    locator: Arc<StorageLocator>,
}

impl StorageManagement {
    pub fn new(locator: Arc<StorageLocator>) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &StorageLocator {
        &self.locator
    }

    /// Refresh the client of the default storage.
    pub async fn refresh_default(&self) -> Result<String> {
        let storage = self.locator.default_storage()?;
        refresh(storage.as_ref(), SettingsOverrides::default()).await
    }

    /// Refresh a named storage from its settings source.
    pub async fn refresh_storage(&self, storage_name: &str) -> Result<String> {
        let storage = self.locator.by_name(storage_name)?;
        refresh(storage.as_ref(), SettingsOverrides::default()).await
    }

    /// Refresh a named storage with new credentials.
    pub async fn refresh_with_credentials(
        &self,
        storage_name: &str,
        secret_id: &str,
        secret_key: &str,
    ) -> Result<String> {
        let storage = self.locator.by_name(storage_name)?;
        refresh(
            storage.as_ref(),
            SettingsOverrides::credentials(secret_id, secret_key),
        )
        .await
    }

    /// Refresh a named storage with a full new configuration.
    pub async fn refresh_with_settings(
        &self,
        storage_name: &str,
        update: SettingsUpdate,
    ) -> Result<String> {
        let storage = self.locator.by_name(storage_name)?;
        refresh(storage.as_ref(), update.into()).await
    }
}

async fn refresh(storage: &dyn FileStorage, overrides: SettingsOverrides) -> Result<String> {
    let Some(cos) = storage.as_cos() else {
        info!(storage = storage.storage_name(), "Refresh ignored for non-COS storage");
        return Ok(NOT_COS.to_string());
    };
    cos.refresh_with(overrides).await?;
    Ok(REFRESHED.to_string())
}
