//! Storage key generation: `<yyyy>/<MM>/<dd>/<uuid>[.<ext>]`.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Source of the current timestamp.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of unique identifiers.
pub trait UuidSource: Send + Sync {
    fn create_uuid(&self) -> Uuid;
}

/// Random (v4) UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomUuidSource;

impl UuidSource for RandomUuidSource {
    fn create_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Derives object keys from the current date and a fresh UUID.
#[derive(Clone)]
pub struct KeyGenerator {
    time: Arc<dyn TimeSource>,
    uuids: Arc<dyn UuidSource>,
}

impl KeyGenerator {
    pub fn new(time: Arc<dyn TimeSource>, uuids: Arc<dyn UuidSource>) -> Self {
        Self { time, uuids }
    }

    /// Key for a new object holding `file_name`.
    pub fn key_for(&self, file_name: &str) -> String {
        let date_dir = self.time.now().format("%Y/%m/%d");
        let id = self.uuids.create_uuid().hyphenated();
        match file_extension(file_name) {
            Some(ext) => format!("{date_dir}/{id}.{ext}"),
            None => format!("{date_dir}/{id}"),
        }
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemTimeSource), Arc::new(RandomUuidSource))
    }
}

impl std::fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGenerator").finish_non_exhaustive()
    }
}

/// Text after the last `.` of the final path component, if non-empty.
pub fn file_extension(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}
