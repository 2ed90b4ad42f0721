use std::path::PathBuf;

use super::{CosfsConfig, StorageSettings};
use crate::error::{CosfsError, Result};

/// Where a storage reads its settings from on every client refresh.
pub trait SettingsSource: Send + Sync {
    fn load(&self) -> Result<StorageSettings>;
}

/// Fixed settings, e.g. built in code.
#[derive(Debug, Clone)]
pub struct StaticSettings(pub StorageSettings);

impl SettingsSource for StaticSettings {
    fn load(&self) -> Result<StorageSettings> {
        Ok(self.0.clone())
    }
}

/// Re-reads one `[[storages]]` entry from the config file, then overlays the
/// `COSFS_<NAME>_*` environment variables.
#[derive(Debug, Clone)]
pub struct FileSettingsSource {
    path: PathBuf,
    storage_name: String,
}

impl FileSettingsSource {
    pub fn new(path: impl Into<PathBuf>, storage_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            storage_name: storage_name.into(),
        }
    }
}

impl SettingsSource for FileSettingsSource {
    fn load(&self) -> Result<StorageSettings> {
        let config = CosfsConfig::load(&self.path)?;
        let mut storage = config
            .storage(&self.storage_name)
            .cloned()
            .ok_or_else(|| CosfsError::StorageNotFound(self.storage_name.clone()))?;
        storage.apply_env()?;
        tracing::debug!(
            path = %self.path.display(),
            storage = %self.storage_name,
            "Loaded storage settings"
        );
        storage.cos_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_source_rereads_on_each_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cosfs.toml");
        let write = |bucket: &str| {
            std::fs::write(
                &path,
                format!(
                    r#"
[cosfs]
default_storage = "filesource-test"

[[storages]]
name = "filesource-test"
secret_id = "id"
secret_key = "key"
bucket = "{bucket}"
region = "ap-beijing"
"#
                ),
            )
            .unwrap();
        };

        let source = FileSettingsSource::new(&path, "filesource-test");
        write("first-1250000000");
        assert_eq!(source.load().unwrap().bucket, "first-1250000000");
        write("second-1250000000");
        assert_eq!(source.load().unwrap().bucket, "second-1250000000");
    }

    #[test]
    fn file_source_unknown_storage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cosfs.toml");
        CosfsConfig::default_config(tmp.path()).save(&path).unwrap();
        let source = FileSettingsSource::new(&path, "missing");
        assert!(matches!(source.load(), Err(CosfsError::StorageNotFound(_))));
    }
}
