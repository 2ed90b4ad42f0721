use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{CosfsError, Result};

/// Everything needed to build a COS client for one storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    pub secret_id: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    pub chunk_size_kb: u32,
    pub endpoint_url: Option<String>,
}

impl StorageSettings {
    pub fn chunk_size_bytes(&self) -> usize {
        self.chunk_size_kb as usize * 1024
    }

    /// Endpoint the client talks to. Always HTTPS.
    pub fn endpoint(&self) -> String {
        match &self.endpoint_url {
            Some(url) => url.clone(),
            None => format!("https://cos.{}.myqcloud.com", self.region),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let blank = [
            ("secret_id", &self.secret_id),
            ("secret_key", &self.secret_key),
            ("bucket", &self.bucket),
            ("region", &self.region),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty());

        if let Some((field, _)) = blank {
            return Err(CosfsError::Config(format!("'{field}' must not be empty")));
        }
        if self.chunk_size_kb == 0 {
            return Err(CosfsError::Config(
                "'chunk_size_kb' must be greater than zero".to_string(),
            ));
        }
        if let Some(url) = &self.endpoint_url {
            if !url.starts_with("https://") {
                return Err(CosfsError::Config(format!(
                    "endpoint must use https: {url}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("chunk_size_kb", &self.chunk_size_kb)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Values set explicitly (e.g. through management operations). They take
/// precedence over whatever the settings source returns.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub chunk_size_kb: Option<u32>,
    /// `Some(None)` clears a configured endpoint.
    pub endpoint_url: Option<Option<String>>,
}

impl SettingsOverrides {
    pub fn credentials(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: Some(secret_id.into()),
            secret_key: Some(secret_key.into()),
            ..Self::default()
        }
    }

    /// Fold `other` into `self`; fields set in `other` win.
    pub fn merge(&mut self, other: SettingsOverrides) {
        if other.secret_id.is_some() {
            self.secret_id = other.secret_id;
        }
        if other.secret_key.is_some() {
            self.secret_key = other.secret_key;
        }
        if other.bucket.is_some() {
            self.bucket = other.bucket;
        }
        if other.region.is_some() {
            self.region = other.region;
        }
        if other.chunk_size_kb.is_some() {
            self.chunk_size_kb = other.chunk_size_kb;
        }
        if other.endpoint_url.is_some() {
            self.endpoint_url = other.endpoint_url;
        }
    }

    pub fn apply(&self, settings: &mut StorageSettings) {
        if let Some(v) = &self.secret_id {
            settings.secret_id = v.clone();
        }
        if let Some(v) = &self.secret_key {
            settings.secret_key = v.clone();
        }
        if let Some(v) = &self.bucket {
            settings.bucket = v.clone();
        }
        if let Some(v) = &self.region {
            settings.region = v.clone();
        }
        if let Some(v) = self.chunk_size_kb {
            settings.chunk_size_kb = v;
        }
        if let Some(v) = &self.endpoint_url {
            settings.endpoint_url = v.clone();
        }
    }
}

impl fmt::Debug for SettingsOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsOverrides")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("chunk_size_kb", &self.chunk_size_kb)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Tuning for the multipart fan-out of a single save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Maximum number of parts in flight.
    pub concurrency: usize,
    /// How often the waiting save wakes up to check its deadline.
    pub wait_poll: Duration,
    /// Overall limit for the part uploads of one save.
    pub timeout: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            concurrency: super::DEFAULT_UPLOAD_CONCURRENCY,
            wait_poll: Duration::from_secs(10),
            timeout: Duration::from_secs(super::DEFAULT_UPLOAD_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> StorageSettings {
        StorageSettings {
            secret_id: "AKIDexample".into(),
            secret_key: "secret".into(),
            bucket: "examplebucket-1250000000".into(),
            region: "ap-shanghai".into(),
            chunk_size_kb: 8192,
            endpoint_url: None,
        }
    }

    #[test]
    fn endpoint_defaults_to_regional_https() {
        assert_eq!(
            settings().endpoint(),
            "https://cos.ap-shanghai.myqcloud.com"
        );
    }

    #[test]
    fn validate_rejects_plain_http() {
        let mut s = settings();
        s.endpoint_url = Some("http://cos.ap-shanghai.myqcloud.com".into());
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_and_zero() {
        let mut s = settings();
        s.bucket = "  ".into();
        assert!(s.validate().unwrap_err().to_string().contains("bucket"));

        let mut s = settings();
        s.chunk_size_kb = 0;
        assert!(s.validate().is_err());

        assert!(settings().validate().is_ok());
    }

    #[test]
    fn overrides_apply_on_top() {
        let mut overrides = SettingsOverrides::credentials("AKIDnew", "new-secret");
        overrides.merge(SettingsOverrides {
            chunk_size_kb: Some(1024),
            endpoint_url: Some(Some("https://cos.example.com".into())),
            ..SettingsOverrides::default()
        });

        let mut s = settings();
        overrides.apply(&mut s);
        assert_eq!(s.secret_id, "AKIDnew");
        assert_eq!(s.secret_key, "new-secret");
        assert_eq!(s.chunk_size_kb, 1024);
        assert_eq!(s.endpoint(), "https://cos.example.com");
        assert_eq!(s.bucket, "examplebucket-1250000000");
    }

    #[test]
    fn debug_redacts_secret() {
        let out = format!("{:?}", settings());
        assert!(!out.contains("\"secret\""));
        assert!(out.contains("REDACTED"));
    }
}
