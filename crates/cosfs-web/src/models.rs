use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: String,
}

/// Body of a storage refresh. Either credentials alone, or a complete
/// settings set when any of region, bucket, chunk size or endpoint is given.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub chunk_size_kb: Option<u32>,
    pub endpoint_url: Option<String>,
}

impl RefreshRequest {
    pub fn is_settings_update(&self) -> bool {
        self.region.is_some()
            || self.bucket.is_some()
            || self.chunk_size_kb.is_some()
            || self.endpoint_url.is_some()
    }
}

#[derive(Serialize)]
pub struct StorageResponse {
    pub name: String,
    pub storage_type: String,
    pub default: bool,
    pub initialized: bool,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub chunk_size_kb: Option<u32>,
    pub endpoint_url: Option<String>,
}
