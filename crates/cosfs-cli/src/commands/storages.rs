use std::path::{Path, PathBuf};
use std::sync::Arc;

use cosfs_core::config::{CosfsConfig, FileSettingsSource, StorageConfig};
use cosfs_core::types::StorageType;
use cosfs_storage::cos::CosClientFactory;
use cosfs_storage::local::LocalFileStorage;
use cosfs_storage::locator::StorageLocator;
use cosfs_storage::storage::{CosFileStorage, FileStorage};

/// Load the config and build every configured storage. COS clients are
/// built immediately from the file and environment; a storage whose client
/// cannot be built is still registered, uninitialized, so the others stay usable.
pub async fn load(base_dir: &Path) -> anyhow::Result<(CosfsConfig, Arc<StorageLocator>)> {
    let config_path = CosfsConfig::default_path(base_dir);
    let config = CosfsConfig::load(&config_path)?;

    let mut locator = StorageLocator::new(config.cosfs.default_storage.clone());
    for sc in &config.storages {
        let storage: Arc<dyn FileStorage> = match sc.storage_type {
            StorageType::Cos => {
                let storage = CosFileStorage::new(
                    sc.name.clone(),
                    FileSettingsSource::new(config_path.clone(), sc.name.clone()),
                    Arc::new(CosClientFactory),
                )
                .with_upload_options(sc.upload_options());
                if let Err(e) = storage.refresh().await {
                    tracing::warn!(
                        storage = %sc.name,
                        error = %e,
                        "Could not initialize storage client"
                    );
                }
                Arc::new(storage)
            }
            StorageType::Local => Arc::new(LocalFileStorage::new(
                &local_root(base_dir, sc),
                &sc.name,
            )?),
        };
        locator.register(storage);
    }

    if locator.by_name(locator.default_name()).is_err() {
        tracing::warn!(
            default = locator.default_name(),
            "Default storage is not configured"
        );
    }

    Ok((config, Arc::new(locator)))
}

/// Root directory of a local storage: `root` if set, else `<base_dir>/files/<name>`.
pub fn local_root(base_dir: &Path, sc: &StorageConfig) -> PathBuf {
    match &sc.root {
        Some(root) => PathBuf::from(root),
        None => base_dir.join("files").join(&sc.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn default_config_builds_local_storage() {
        let tmp = TempDir::new().unwrap();
        CosfsConfig::default_config(tmp.path())
            .save(&CosfsConfig::default_path(tmp.path()))
            .unwrap();

        let (config, locator) = load(tmp.path()).await.unwrap();
        assert_eq!(config.cosfs.default_storage, "local");
        let storage = locator.default_storage().unwrap();
        assert_eq!(storage.storage_name(), "local");
        assert!(storage.as_cos().is_none());
        assert!(tmp.path().join("files").is_dir());
    }

    #[tokio::test]
    async fn broken_cos_storage_does_not_block_others() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("plain");
        std::fs::write(
            CosfsConfig::default_path(tmp.path()),
            format!(
                r#"
[cosfs]
default_storage = "local"

[[storages]]
name = "local"
type = "local"
root = "{}"

[[storages]]
name = "halfdone"
type = "cos"
secret_id = "AKIDexample"
secret_key = "secret"
region = "ap-guangzhou"
"#,
                root.display().to_string().replace('\\', "/")
            ),
        )
        .unwrap();

        let (_, locator) = load(tmp.path()).await.unwrap();

        let local = locator.default_storage().unwrap();
        let mut input: &[u8] = b"still works";
        let file_ref = local.save_stream("a.txt", &mut input).await.unwrap();
        assert!(local.file_exists(&file_ref).await.unwrap());

        let broken = locator.by_name("halfdone").unwrap();
        assert!(!broken.as_cos().unwrap().is_initialized());
    }

    #[tokio::test]
    async fn missing_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load(tmp.path()).await.is_err());
    }

    #[test]
    fn local_root_falls_back_to_base_dir() {
        let tmp = TempDir::new().unwrap();
        let mut sc = CosfsConfig::default_config(tmp.path()).storages.remove(0);
        sc.root = None;
        assert_eq!(
            local_root(tmp.path(), &sc),
            tmp.path().join("files").join("local")
        );
    }
}
