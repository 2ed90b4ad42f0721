//! Parallel multipart upload of a fully buffered payload.
//!
//! The payload is cut into fixed-size parts numbered from 1. Each part is
//! uploaded by its own task inside a `JoinSet` whose width is bounded by a
//! semaphore; the set lives only as long as one [`MultipartUpload::run`]
//! call. Tags are collected in a shared list, checked against the expected
//! part count, sorted by part number and committed.

use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use bytes::Bytes;
use cosfs_core::config::UploadOptions;
use cosfs_core::error::{CosfsError, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::PartTag;
use crate::handle::StorageClient;

/// Byte ranges of the parts for a payload of `len` bytes.
///
/// An empty payload still gets one (empty) part: the service refuses to
/// complete an upload without parts.
pub fn part_ranges(len: usize, chunk_size: usize) -> Vec<Range<usize>> {
    assert!(chunk_size > 0, "chunk size must be positive");
    if len == 0 {
        return vec![0..0];
    }
    (0..len.div_ceil(chunk_size))
        .map(|i| i * chunk_size..((i + 1) * chunk_size).min(len))
        .collect()
}

/// Uploads one part and records its tag.
struct PartUpload {
    client: Arc<StorageClient>,
    key: Arc<str>,
    upload_id: Arc<str>,
    part_number: i32,
    data: Bytes,
    tags: Arc<Mutex<Vec<PartTag>>>,
}

impl PartUpload {
    async fn run(self) -> anyhow::Result<()> {
        let size = self.data.len();
        let tag = self
            .client
            .client()
            .upload_part(
                self.client.bucket(),
                &self.key,
                &self.upload_id,
                self.part_number,
                self.data,
            )
            .await
            .with_context(|| format!("uploading part {} of {} failed", self.part_number, self.key))?;

        debug!(key = %self.key, part = self.part_number, size, etag = %tag.etag, "Uploaded part");
        self.tags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tag);
        Ok(())
    }
}

/// One multipart upload of `key`, bound to a client snapshot.
pub struct MultipartUpload<'a> {
    client: Arc<StorageClient>,
    key: Arc<str>,
    options: &'a UploadOptions,
}

impl<'a> MultipartUpload<'a> {
    pub fn new(client: Arc<StorageClient>, key: &str, options: &'a UploadOptions) -> Self {
        Self {
            client,
            key: Arc::from(key),
            options,
        }
    }

    /// Upload `data` and commit it as one object.
    pub async fn run(&self, data: Bytes) -> Result<()> {
        let key = self.key.clone();
        let upload_id: Arc<str> = self
            .client
            .client()
            .initiate_multipart_upload(self.client.bucket(), &key)
            .await
            .map_err(|e| CosfsError::io(format!("Could not start multipart upload of {key}"), e))?
            .into();

        let ranges = part_ranges(data.len(), self.client.chunk_size_bytes());
        let expected = ranges.len();
        debug!(key = %key, upload_id = %upload_id, parts = expected, size = data.len(), "Starting multipart upload");

        let tags = Arc::new(Mutex::new(Vec::with_capacity(expected)));
        let permits = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (i, range) in ranges.into_iter().enumerate() {
            let part_number = i32::try_from(i + 1).map_err(|_| {
                CosfsError::IllegalState(format!("too many parts for {key}: {expected}"))
            })?;
            let part = PartUpload {
                client: self.client.clone(),
                key: key.clone(),
                upload_id: upload_id.clone(),
                part_number,
                data: data.slice(range),
                tags: tags.clone(),
            };
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await?;
                part.run().await
            });
        }

        let failures = self.wait_for_parts(&mut tasks).await?;

        let mut parts = std::mem::take(&mut *tags.lock().unwrap_or_else(PoisonError::into_inner));
        if parts.len() != expected {
            let cause = failures
                .first()
                .map(|e| format!(": {e:#}"))
                .unwrap_or_default();
            return Err(CosfsError::IllegalState(format!(
                "multipart upload of {key} incomplete, {} of {expected} parts finished{cause}",
                parts.len()
            )));
        }

        parts.sort_by_key(|p| p.part_number);
        self.log_parts(&upload_id).await;

        self.client
            .client()
            .complete_multipart_upload(self.client.bucket(), &key, &upload_id, &parts)
            .await
            .map_err(|e| {
                CosfsError::io(format!("Could not complete multipart upload of {key}"), e)
            })?;

        info!(key = %key, parts = expected, "Completed multipart upload");
        Ok(())
    }

    /// Drain `tasks`, returning the part failures. Gives up once the
    /// configured timeout has passed, aborting whatever is still running.
    async fn wait_for_parts(
        &self,
        tasks: &mut JoinSet<anyhow::Result<()>>,
    ) -> Result<Vec<anyhow::Error>> {
        let deadline = Instant::now() + self.options.timeout;
        let mut failures = Vec::new();

        loop {
            let wait = self
                .options
                .wait_poll
                .min(deadline.saturating_duration_since(Instant::now()));

            match tokio::time::timeout(wait, tasks.join_next()).await {
                Ok(None) => return Ok(failures),
                Ok(Some(Ok(Ok(())))) => {}
                Ok(Some(Ok(Err(e)))) => {
                    warn!(key = %self.key, error = %format!("{e:#}"), "Part upload failed");
                    failures.push(e);
                }
                Ok(Some(Err(join_err))) => {
                    warn!(key = %self.key, error = %join_err, "Part upload task died");
                    failures.push(anyhow::anyhow!("part upload task died: {join_err}"));
                }
                Err(_) => {
                    let remaining = tasks.len();
                    if Instant::now() >= deadline {
                        tasks.abort_all();
                        return Err(CosfsError::io_msg(format!(
                            "timed out uploading {}, {remaining} parts still running",
                            self.key
                        )));
                    }
                    debug!(key = %self.key, remaining, "Waiting for part uploads");
                }
            }
        }
    }

    async fn log_parts(&self, upload_id: &str) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        match self
            .client
            .client()
            .list_parts(self.client.bucket(), &self.key, upload_id)
            .await
        {
            Ok(parts) => {
                for p in parts {
                    debug!(key = %self.key, part = p.part_number, etag = %p.etag, "Listed part");
                }
            }
            Err(e) => warn!(key = %self.key, error = %e, "Could not list parts"),
        }
    }
}
