//! In-memory ObjectStore
//!
//! Behaves like a single bucket with last-write-wins semantics. Individual
//! keys can be set to fail, and the whole bucket can be marked missing, so
//! callers can exercise their error paths without a network.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::traits::{ListOptions, ListResult, ObjectInfo, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
    last_modified: jiff::Timestamp,
}

/// Bucket held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failing_keys: Mutex<BTreeSet<String>>,
    bucket_missing: bool,
    put_count: Mutex<usize>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that answers every request with `BucketNotFound`
    pub fn missing_bucket() -> Self {
        Self {
            bucket_missing: true,
            ..Self::default()
        }
    }

    /// Make uploads to `key` fail with a network error
    pub fn fail_uploads_to(&self, key: impl Into<String>) {
        lock(&self.failing_keys).insert(key.into());
    }

    /// Object bytes, if the key exists
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(key).map(|o| o.data.clone())
    }

    /// Stored content type, if the key exists
    pub fn content_type(&self, key: &str) -> Option<String> {
        lock(&self.objects).get(key).map(|o| o.content_type.clone())
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    /// Number of successful uploads, including overwrites
    pub fn put_count(&self) -> usize {
        *lock(&self.put_count)
    }

    fn check_bucket(&self) -> Result<()> {
        if self.bucket_missing {
            Err(Error::BucketNotFound("memory".to_string()))
        } else {
            Ok(())
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn info_for(key: &str, object: &StoredObject) -> ObjectInfo {
    let mut info = ObjectInfo::new(key, object.data.len() as i64);
    info.last_modified = Some(object.last_modified);
    info.content_type = Some(object.content_type.clone());
    info
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectInfo> {
        self.check_bucket()?;
        if lock(&self.failing_keys).contains(key) {
            return Err(Error::Network(format!("injected failure for {key}")));
        }

        let object = StoredObject {
            data,
            content_type: content_type.to_string(),
            last_modified: jiff::Timestamp::now(),
        };
        let info = info_for(key, &object);
        lock(&self.objects).insert(key.to_string(), object);
        *lock(&self.put_count) += 1;
        Ok(info)
    }

    async fn list_objects(&self, options: ListOptions) -> Result<ListResult> {
        self.check_bucket()?;
        let prefix = options.prefix.unwrap_or_default();
        let max_keys = options.max_keys.unwrap_or(1000).max(1) as usize;
        let objects = lock(&self.objects);

        // Continuation tokens are the last key of the previous page.
        let mut matching = objects
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| match &options.continuation_token {
                Some(after) => key.as_str() > after.as_str(),
                None => true,
            });

        let items: Vec<ObjectInfo> = matching
            .by_ref()
            .take(max_keys)
            .map(|(key, object)| info_for(key, object))
            .collect();
        let truncated = matching.next().is_some();
        let continuation_token = if truncated {
            items.last().map(|i| i.key.clone())
        } else {
            None
        };

        Ok(ListResult {
            items,
            truncated,
            continuation_token,
        })
    }

    async fn head_object(&self, key: &str) -> Result<ObjectInfo> {
        self.check_bucket()?;
        lock(&self.objects)
            .get(key)
            .map(|object| info_for(key, object))
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.check_bucket()?;
        lock(&self.objects)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }
}
