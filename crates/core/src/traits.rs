//! ObjectStore trait definition
//!
//! This trait defines the small set of bucket operations the uploader needs.
//! It keeps the upload logic decoupled from the S3 SDK so it can run against
//! an in-memory store in tests.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::Serialize;

use crate::error::Result;

/// Page size used when listing
pub const DEFAULT_PAGE_SIZE: i32 = 1000;

/// Metadata for a remote object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: i64,

    /// Human-readable size
    pub size_human: String,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object of the given size
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: size,
            size_human: humansize::format_size(size.max(0) as u64, humansize::BINARY),
            last_modified: None,
            etag: None,
            content_type: None,
        }
    }
}

/// One page of a list operation
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// Listed objects
    pub items: Vec<ObjectInfo>,

    /// Whether more items are available
    pub truncated: bool,

    /// Continuation token for the next page
    pub continuation_token: Option<String>,
}

/// Options for list operations
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Key prefix to filter by
    pub prefix: Option<String>,

    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,

    /// Continuation token from a previous page
    pub continuation_token: Option<String>,
}

/// Bucket operations used by the uploader
///
/// Implemented by the S3 adapter and by [`crate::MemoryStore`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object, replacing any existing object with the same key
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str)
    -> Result<ObjectInfo>;

    /// List one page of objects
    async fn list_objects(&self, options: ListOptions) -> Result<ListResult>;

    /// Get object metadata, failing with `NotFound` for missing keys
    async fn head_object(&self, key: &str) -> Result<ObjectInfo>;

    /// Delete a single object
    async fn delete_object(&self, key: &str) -> Result<()>;
}

/// List every object under `prefix`, following continuation tokens
pub async fn list_all<S>(store: &S, prefix: &str) -> Result<Vec<ObjectInfo>>
where
    S: ObjectStore + ?Sized,
{
    let mut items = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let options = ListOptions {
            prefix: Some(prefix.to_string()),
            max_keys: Some(DEFAULT_PAGE_SIZE),
            continuation_token: continuation_token.take(),
        };

        let page = store.list_objects(options).await?;
        tracing::debug!(prefix, count = page.items.len(), "listed page");
        items.extend(page.items);

        match page.continuation_token {
            Some(token) if page.truncated => continuation_token = Some(token),
            _ => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_new() {
        let info = ObjectInfo::new("images/photo.jpg", 2048);
        assert_eq!(info.key, "images/photo.jpg");
        assert_eq!(info.size_bytes, 2048);
        assert_eq!(info.size_human, "2 KiB");
        assert!(info.last_modified.is_none());
    }

    #[test]
    fn test_negative_size_is_clamped_for_display() {
        let info = ObjectInfo::new("images/odd.bin", -1);
        assert_eq!(info.size_human, "0 B");
    }
}
