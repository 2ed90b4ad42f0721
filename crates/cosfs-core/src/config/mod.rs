pub mod settings;
pub mod source;

pub use settings::{SettingsOverrides, StorageSettings, UploadOptions};
pub use source::{FileSettingsSource, SettingsSource, StaticSettings};

use crate::error::{CosfsError, Result};
use crate::types::StorageType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level cosfs configuration stored as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosfsConfig {
    pub cosfs: CosfsSettings,
    #[serde(default)]
    pub storages: Vec<StorageConfig>,
    #[serde(default)]
    pub web: WebSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosfsSettings {
    /// Storage used when no name is given.
    #[serde(default = "default_storage_name")]
    pub default_storage: String,
}

/// Management endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Bearer token required by the management API. Unset disables auth.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            admin_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub storage_type: StorageType,
    #[serde(default)]
    pub secret_id: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Multipart chunk size in kilobytes.
    #[serde(default = "default_chunk_size_kb")]
    pub chunk_size_kb: u32,
    /// Custom endpoint; defaults to `https://cos.<region>.myqcloud.com`.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
    #[serde(default = "default_wait_poll_secs")]
    pub wait_poll_secs: u64,
    /// Limit for the part uploads of one save.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    /// Root directory (local storages only).
    #[serde(default)]
    pub root: Option<String>,
}

pub const DEFAULT_STORAGE_NAME: &str = "cos";
pub const DEFAULT_CHUNK_SIZE_KB: u32 = 8192;
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 5;
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 900;

fn default_storage_name() -> String {
    DEFAULT_STORAGE_NAME.to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:9480".to_string()
}

fn default_chunk_size_kb() -> u32 {
    DEFAULT_CHUNK_SIZE_KB
}

fn default_upload_concurrency() -> usize {
    DEFAULT_UPLOAD_CONCURRENCY
}

fn default_upload_timeout_secs() -> u64 {
    DEFAULT_UPLOAD_TIMEOUT_SECS
}

fn default_wait_poll_secs() -> u64 {
    10
}

impl StorageConfig {
    /// Resolve into COS client settings. Fails if a required field is missing.
    pub fn cos_settings(&self) -> Result<StorageSettings> {
        let required = |value: &Option<String>, field: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    CosfsError::Config(format!("Storage '{}': missing '{field}'", self.name))
                })
        };

        Ok(StorageSettings {
            secret_id: required(&self.secret_id, "secret_id")?,
            secret_key: required(&self.secret_key, "secret_key")?,
            bucket: required(&self.bucket, "bucket")?,
            region: required(&self.region, "region")?,
            chunk_size_kb: self.chunk_size_kb,
            endpoint_url: self.endpoint_url.clone().filter(|e| !e.is_empty()),
        })
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            concurrency: self.upload_concurrency,
            wait_poll: Duration::from_secs(self.wait_poll_secs.max(1)),
            timeout: Duration::from_secs(self.upload_timeout_secs.max(1)),
        }
    }

    /// Overlay `COSFS_<NAME>_*` variables looked up through `lookup`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let prefix = format!(
            "COSFS_{}_",
            self.name.to_uppercase().replace(['-', '.'], "_")
        );
        let var = |suffix: &str| lookup(&format!("{prefix}{suffix}"));

        if let Some(v) = var("SECRET_ID") {
            self.secret_id = Some(v);
        }
        if let Some(v) = var("SECRET_KEY") {
            self.secret_key = Some(v);
        }
        if let Some(v) = var("BUCKET") {
            self.bucket = Some(v);
        }
        if let Some(v) = var("REGION") {
            self.region = Some(v);
        }
        if let Some(v) = var("ENDPOINT_URL") {
            self.endpoint_url = Some(v);
        }
        if let Some(v) = var("CHUNK_SIZE_KB") {
            self.chunk_size_kb = v.parse().map_err(|_| {
                CosfsError::Config(format!("{prefix}CHUNK_SIZE_KB is not a number: {v}"))
            })?;
        }
        Ok(())
    }

    /// Overlay variables from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }
}

impl CosfsConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CosfsError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CosfsError::TomlDe(e.to_string()))
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CosfsError::TomlSer(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config for `cosfs init`: a single local storage under `base_dir`.
    pub fn default_config(base_dir: &Path) -> Self {
        Self {
            cosfs: CosfsSettings {
                default_storage: "local".to_string(),
            },
            storages: vec![StorageConfig {
                name: "local".to_string(),
                storage_type: StorageType::Local,
                secret_id: None,
                secret_key: None,
                bucket: None,
                region: None,
                chunk_size_kb: DEFAULT_CHUNK_SIZE_KB,
                endpoint_url: None,
                upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
                wait_poll_secs: default_wait_poll_secs(),
                upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
                root: Some(base_dir.join("files").display().to_string()),
            }],
            web: WebSettings::default(),
        }
    }

    pub fn storage(&self, name: &str) -> Option<&StorageConfig> {
        self.storages.iter().find(|s| s.name == name)
    }

    /// Resolve the config file path: `<base_dir>/cosfs.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("cosfs.toml")
    }

    /// Resolve the default cosfs home directory: `~/.cosfs`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".cosfs"))
            .ok_or_else(|| CosfsError::Config("Cannot determine home directory".to_string()))
    }
}
