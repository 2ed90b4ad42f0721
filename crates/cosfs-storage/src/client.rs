use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cosfs_core::config::StorageSettings;
use tokio::io::AsyncRead;

/// Readable object content.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// Confirmation for one uploaded part, needed (in order) to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTag {
    pub part_number: i32,
    pub etag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// The object-storage operations cosfs needs from a vendor client.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Start a multipart upload and return its upload id.
    async fn initiate_multipart_upload(&self, bucket: &str, key: &str) -> anyhow::Result<String>;

    /// Upload one part of a multipart upload.
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> anyhow::Result<PartTag>;

    /// Parts the service holds for an upload, in part-number order.
    async fn list_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> anyhow::Result<Vec<PartTag>>;

    /// Assemble the object from `parts`, which must be in ascending order.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartTag],
    ) -> anyhow::Result<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> anyhow::Result<ObjectBody>;

    async fn delete_object(&self, bucket: &str, key: &str) -> anyhow::Result<()>;

    /// List at most `max_keys` objects whose key starts with `prefix`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
    ) -> anyhow::Result<Vec<ObjectSummary>>;

    /// Test connectivity.
    async fn test_connection(&self, bucket: &str) -> anyhow::Result<()>;

    /// Client kind for display.
    fn name(&self) -> &str;
}

/// Builds authenticated clients from settings.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn build(&self, settings: &StorageSettings) -> anyhow::Result<Arc<dyn ObjectClient>>;
}
