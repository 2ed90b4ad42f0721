use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use cosfs_core::config::{SettingsOverrides, SettingsSource, StorageSettings, UploadOptions};
use cosfs_core::error::{CosfsError, Result};
use cosfs_core::keygen::KeyGenerator;
use cosfs_core::types::FileRef;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::client::{ClientFactory, ObjectBody};
use crate::handle::{ClientHandle, StorageClient};
use crate::multipart::MultipartUpload;

/// A named place files can be saved to and read back from.
#[async_trait]
pub trait FileStorage: Send + Sync {
    fn storage_name(&self) -> &str;

    /// Store the whole of `input` under a freshly generated key.
    async fn save_stream(
        &self,
        file_name: &str,
        input: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<FileRef>;

    async fn open_stream(&self, reference: &FileRef) -> Result<ObjectBody>;

    async fn remove_file(&self, reference: &FileRef) -> Result<()>;

    async fn file_exists(&self, reference: &FileRef) -> Result<bool>;

    /// Downcast used by management operations.
    fn as_cos(&self) -> Option<&CosFileStorage> {
        None
    }
}

/// File storage backed by a COS bucket.
pub struct CosFileStorage {
    name: String,
    source: Box<dyn SettingsSource>,
    overrides: Mutex<SettingsOverrides>,
    factory: Arc<dyn ClientFactory>,
    handle: ClientHandle,
    refresh_lock: tokio::sync::Mutex<()>,
    keys: KeyGenerator,
    upload: UploadOptions,
}

impl CosFileStorage {
    /// Create an uninitialized storage; call [`refresh`](Self::refresh)
    /// before use.
    pub fn new(
        name: impl Into<String>,
        source: impl SettingsSource + 'static,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            name: name.into(),
            source: Box::new(source),
            overrides: Mutex::new(SettingsOverrides::default()),
            factory,
            handle: ClientHandle::new(),
            refresh_lock: tokio::sync::Mutex::new(()),
            keys: KeyGenerator::default(),
            upload: UploadOptions::default(),
        }
    }

    pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_upload_options(mut self, upload: UploadOptions) -> Self {
        self.upload = upload;
        self
    }

    /// Settings of the live client, if any.
    pub fn current_settings(&self) -> Option<StorageSettings> {
        self.handle.get().ok().map(|c| c.settings().clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.is_initialized()
    }

    /// Rebuild the client from the settings source and swap it in.
    ///
    /// Operations already running keep the client they started with.
    pub async fn refresh(&self) -> Result<()> {
        self.refresh_with(SettingsOverrides::default()).await
    }

    /// Rebuild the client with `overrides` layered over the settings source
    /// and any overrides accepted earlier.
    ///
    /// Overrides are kept only once a client has been built with them; a
    /// rejected set leaves both the live client and the stored overrides
    /// untouched.
    pub async fn refresh_with(&self, overrides: SettingsOverrides) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        let mut pending = self
            .overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        pending.merge(overrides);

        let mut settings = self.source.load()?;
        pending.apply(&mut settings);
        settings.validate()?;

        let client = self.factory.build(&settings).await.map_err(|e| {
            CosfsError::io(format!("Could not build client for storage {}", self.name), e)
        })?;

        info!(
            storage = %self.name,
            client = client.name(),
            bucket = %settings.bucket,
            region = %settings.region,
            "Refreshed storage client"
        );
        *self.overrides.lock().unwrap_or_else(PoisonError::into_inner) = pending;
        self.handle.swap(StorageClient::new(client, settings));
        Ok(())
    }

    /// Check the bucket is reachable with the live client.
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.handle.get()?;
        client
            .client()
            .test_connection(client.bucket())
            .await
            .map_err(|e| CosfsError::io(format!("Bucket {} not reachable", client.bucket()), e))
    }
}

#[async_trait]
impl FileStorage for CosFileStorage {
    fn storage_name(&self) -> &str {
        &self.name
    }

    async fn save_stream(
        &self,
        file_name: &str,
        input: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<FileRef> {
        let mut buffer = Vec::new();
        input
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| CosfsError::io(format!("Could not save file {file_name}."), e))?;

        let key = self.keys.key_for(file_name);
        let client = self.handle.get()?;
        debug!(storage = %self.name, file_name, key = %key, size = buffer.len(), "Saving file");

        MultipartUpload::new(client, &key, &self.upload)
            .run(Bytes::from(buffer))
            .await?;

        Ok(FileRef::new(&self.name, key, file_name))
    }

    async fn open_stream(&self, reference: &FileRef) -> Result<ObjectBody> {
        let client = self.handle.get()?;
        client
            .client()
            .get_object(client.bucket(), reference.path())
            .await
            .map_err(|e| {
                CosfsError::io(format!("Could not load file {}.", reference.file_name()), e)
            })
    }

    async fn remove_file(&self, reference: &FileRef) -> Result<()> {
        let client = self.handle.get()?;
        client
            .client()
            .delete_object(client.bucket(), reference.path())
            .await
            .map_err(|e| {
                CosfsError::io(format!("Could not delete file {}.", reference.file_name()), e)
            })
    }

    /// True if any object key starts with the reference path.
    async fn file_exists(&self, reference: &FileRef) -> Result<bool> {
        let client = self.handle.get()?;
        let found = client
            .client()
            .list_objects(client.bucket(), reference.path(), 1)
            .await
            .map_err(|e| {
                CosfsError::io(
                    format!("Could not check file {}.", reference.file_name()),
                    e,
                )
            })?;
        match found.first() {
            Some(obj) => {
                debug!(storage = %self.name, key = %obj.key, size = obj.size, "Found object");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn as_cos(&self) -> Option<&CosFileStorage> {
        Some(self)
    }
}
