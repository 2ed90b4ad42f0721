//! In-memory object client for local testing.
//!
//! Behaves like the S3 multipart API closely enough to exercise the upload
//! path: parts are held per upload id, completion checks ordering and ETags.
//! Faults and per-part delays can be injected.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use cosfs_core::config::StorageSettings;
use md5::{Digest, Md5};

use crate::client::{ClientFactory, ObjectBody, ObjectClient, ObjectSummary, PartTag};

/// A finished `complete_multipart_upload` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub part_numbers: Vec<i32>,
}

struct PendingUpload {
    bucket: String,
    key: String,
    parts: BTreeMap<i32, (String, Bytes)>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<(String, String), Bytes>,
    uploads: HashMap<String, PendingUpload>,
    next_upload: u64,
    commits: Vec<CommitRecord>,
    failing_parts: HashSet<i32>,
    part_delays: HashMap<i32, Duration>,
    uploaded_parts: usize,
}

/// Shared in-memory bucket store. Clones see the same objects.
#[derive(Clone, Default)]
pub struct MemoryObjectClient {
    state: Arc<Mutex<State>>,
}

impl MemoryObjectClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every upload of `part_number` fail.
    pub fn fail_part(&self, part_number: i32) {
        self.state().failing_parts.insert(part_number);
    }

    /// Hold uploads of `part_number` for `delay` before storing them.
    pub fn delay_part(&self, part_number: i32, delay: Duration) {
        self.state().part_delays.insert(part_number, delay);
    }

    pub fn commits(&self) -> Vec<CommitRecord> {
        self.state().commits.clone()
    }

    /// Uploads initiated but never completed.
    pub fn pending_uploads(&self) -> usize {
        self.state().uploads.len()
    }

    /// Number of successful `upload_part` calls.
    pub fn uploaded_parts(&self) -> usize {
        self.state().uploaded_parts
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.state()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Store an object directly, bypassing multipart.
    pub fn put_object(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.state()
            .objects
            .insert((bucket.to_string(), key.to_string()), data.into());
    }
}

fn etag_of(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(data)))
}

#[async_trait]
impl ObjectClient for MemoryObjectClient {
    async fn initiate_multipart_upload(&self, bucket: &str, key: &str) -> anyhow::Result<String> {
        let mut state = self.state();
        state.next_upload += 1;
        let upload_id = format!("mem-upload-{}", state.next_upload);
        state.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> anyhow::Result<PartTag> {
        let (fail, delay) = {
            let state = self.state();
            (
                state.failing_parts.contains(&part_number),
                state.part_delays.get(&part_number).copied(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            anyhow::bail!("injected failure for part {part_number}");
        }
        if !(1..=10_000).contains(&part_number) {
            anyhow::bail!("part number out of range: {part_number}");
        }

        let etag = etag_of(&data);
        let mut state = self.state();
        let upload = state
            .uploads
            .get_mut(upload_id)
            .filter(|u| u.bucket == bucket && u.key == key)
            .ok_or_else(|| anyhow::anyhow!("NoSuchUpload: {upload_id}"))?;
        upload.parts.insert(part_number, (etag.clone(), data));
        state.uploaded_parts += 1;

        Ok(PartTag { part_number, etag })
    }

    async fn list_parts(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
    ) -> anyhow::Result<Vec<PartTag>> {
        let state = self.state();
        let upload = state
            .uploads
            .get(upload_id)
            .ok_or_else(|| anyhow::anyhow!("NoSuchUpload: {upload_id}"))?;
        Ok(upload
            .parts
            .iter()
            .map(|(n, (etag, _))| PartTag {
                part_number: *n,
                etag: etag.clone(),
            })
            .collect())
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartTag],
    ) -> anyhow::Result<()> {
        if parts.is_empty() {
            anyhow::bail!("MalformedXML: at least one part is required");
        }
        if parts.windows(2).any(|w| w[0].part_number >= w[1].part_number) {
            anyhow::bail!("InvalidPartOrder: parts must be in ascending order");
        }

        let mut state = self.state();
        let upload = state
            .uploads
            .get(upload_id)
            .filter(|u| u.bucket == bucket && u.key == key)
            .ok_or_else(|| anyhow::anyhow!("NoSuchUpload: {upload_id}"))?;

        let mut assembled = BytesMut::new();
        for tag in parts {
            match upload.parts.get(&tag.part_number) {
                Some((etag, data)) if *etag == tag.etag => assembled.extend_from_slice(data),
                _ => anyhow::bail!("InvalidPart: part {} not found", tag.part_number),
            }
        }

        state.uploads.remove(upload_id);
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), assembled.freeze());
        state.commits.push(CommitRecord {
            bucket: bucket.to_string(),
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            part_numbers: parts.iter().map(|p| p.part_number).collect(),
        });
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> anyhow::Result<ObjectBody> {
        let data = self
            .object(bucket, key)
            .ok_or_else(|| anyhow::anyhow!("NoSuchKey: {key}"))?;
        Ok(Box::pin(Cursor::new(data)))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> anyhow::Result<()> {
        self.state()
            .objects
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
    ) -> anyhow::Result<Vec<ObjectSummary>> {
        let state = self.state();
        Ok(state
            .objects
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .take(max_keys.max(0) as usize)
            .map(|((_, k), v)| ObjectSummary {
                key: k.clone(),
                size: v.len() as u64,
            })
            .collect())
    }

    async fn test_connection(&self, _bucket: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Hands out clients over one shared [`MemoryObjectClient`] store.
#[derive(Default)]
pub struct MemoryClientFactory {
    store: MemoryObjectClient,
    builds: AtomicUsize,
    last_settings: Mutex<Option<StorageSettings>>,
}

impl MemoryClientFactory {
    pub fn new(store: MemoryObjectClient) -> Self {
        Self {
            store,
            builds: AtomicUsize::new(0),
            last_settings: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &MemoryObjectClient {
        &self.store
    }

    /// Number of clients built so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Settings passed to the most recent build.
    pub fn last_settings(&self) -> Option<StorageSettings> {
        self.last_settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ClientFactory for MemoryClientFactory {
    async fn build(&self, settings: &StorageSettings) -> anyhow::Result<Arc<dyn ObjectClient>> {
        settings.validate()?;
        self.builds.fetch_add(1, Ordering::SeqCst);
        *self
            .last_settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(Arc::new(self.store.clone()))
    }
}
