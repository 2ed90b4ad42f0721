use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use cosfs_core::error::{CosfsError, Result};
use cosfs_core::keygen::KeyGenerator;
use cosfs_core::types::FileRef;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::client::ObjectBody;
use crate::storage::FileStorage;

/// Filesystem-based file storage for local use and testing.
pub struct LocalFileStorage {
    root: PathBuf,
    name: String,
    keys: KeyGenerator,
}

impl LocalFileStorage {
    pub fn new(root: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            name: name.to_string(),
            keys: KeyGenerator::default(),
        })
    }

    pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    /// Resolve `key` under the root. Only plain relative components are
    /// accepted, so a key can never point outside the root.
    fn file_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let contained = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(CosfsError::InvalidFileRef(format!(
                "path escapes storage {}: {key}",
                self.name
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    fn storage_name(&self) -> &str {
        &self.name
    }

    async fn save_stream(
        &self,
        file_name: &str,
        input: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<FileRef> {
        let key = self.keys.key_for(file_name);
        let path = self.file_path(&key)?;
        let io_err = |e: std::io::Error| CosfsError::io(format!("Could not save file {file_name}."), e);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let mut file = tokio::fs::File::create(&path).await.map_err(io_err)?;
        tokio::io::copy(input, &mut file).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        Ok(FileRef::new(&self.name, key, file_name))
    }

    async fn open_stream(&self, reference: &FileRef) -> Result<ObjectBody> {
        let file = tokio::fs::File::open(self.file_path(reference.path())?)
            .await
            .map_err(|e| {
                CosfsError::io(format!("Could not load file {}.", reference.file_name()), e)
            })?;
        Ok(Box::pin(file))
    }

    async fn remove_file(&self, reference: &FileRef) -> Result<()> {
        let path = self.file_path(reference.path())?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path).await.map_err(|e| {
                CosfsError::io(format!("Could not delete file {}.", reference.file_name()), e)
            })?;
        }
        Ok(())
    }

    async fn file_exists(&self, reference: &FileRef) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.file_path(reference.path())?)
            .await
            .unwrap_or(false))
    }
}
