use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CosfsError;

/// Identifies a stored file within a named storage.
///
/// String form: `<storage>://<path>?name=<url-encoded file name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    storage_name: String,
    path: String,
    file_name: String,
}

impl FileRef {
    pub fn new(
        storage_name: impl Into<String>,
        path: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            storage_name: storage_name.into(),
            path: path.into(),
            file_name: file_name.into(),
        }
    }

    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Object key inside the storage.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Original name the file was saved under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: String = url::form_urlencoded::byte_serialize(self.file_name.as_bytes()).collect();
        write!(f, "{}://{}?name={}", self.storage_name, self.path, name)
    }
}

impl FromStr for FileRef {
    type Err = CosfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (storage_name, rest) = s
            .split_once("://")
            .ok_or_else(|| CosfsError::InvalidFileRef(format!("missing '://' in {s}")))?;
        let (path, query) = rest
            .split_once('?')
            .ok_or_else(|| CosfsError::InvalidFileRef(format!("missing '?name=' in {s}")))?;

        if storage_name.is_empty() || path.is_empty() {
            return Err(CosfsError::InvalidFileRef(s.to_string()));
        }

        let file_name = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "name")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| CosfsError::InvalidFileRef(format!("missing name parameter in {s}")))?;

        Ok(Self::new(storage_name, path, file_name))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Tencent COS through its S3-compatible API.
    #[default]
    Cos,
    /// Plain directory on the local filesystem.
    Local,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Cos => write!(f, "cos"),
            StorageType::Local => write!(f, "local"),
        }
    }
}

impl FromStr for StorageType {
    type Err = CosfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cos" | "tencent" | "qcloud" => Ok(StorageType::Cos),
            "local" | "fs" => Ok(StorageType::Local),
            other => Err(CosfsError::Config(format!("Unknown storage type: {other}"))),
        }
    }
}
