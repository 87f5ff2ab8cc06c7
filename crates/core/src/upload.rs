//! Upload pipeline
//!
//! Each input goes through read -> resize -> key -> put, one file at a time,
//! in the order given. A per-file failure is recorded and the batch moves on.
//! Fatal errors (see [`Error::is_fatal`]) stop the batch.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::imaging::{self, Asset, ResizeOptions};
use crate::key::{build_remote_key, key_file_name};
use crate::traits::ObjectStore;

/// Settings shared by every file in a batch
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Normalized folder prefix below the root namespace
    pub prefix: Option<String>,

    /// Resize settings
    pub resize: ResizeOptions,
}

/// A successfully uploaded file
#[derive(Debug, Clone, Serialize)]
pub struct Uploaded {
    /// Local source path
    pub source: PathBuf,

    /// Remote key
    pub key: String,

    /// Public URL
    pub url: String,

    /// Uploaded size in bytes
    pub size_bytes: u64,

    /// Content type sent with the object
    pub content_type: String,

    /// Output dimensions, when the image was inspected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Whether the image was resized before upload
    pub resized: bool,
}

impl Uploaded {
    /// Markdown image snippet for the uploaded file
    pub fn markdown(&self) -> String {
        format!("![{}]({})", key_file_name(&self.key), self.url)
    }
}

/// A file that could not be uploaded
#[derive(Debug)]
pub struct Failed {
    /// Local source path
    pub source: PathBuf,

    /// Why it failed
    pub error: Error,
}

/// Outcome of a whole batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Successful uploads, in input order
    pub uploaded: Vec<Uploaded>,

    /// Per-file failures, in input order
    pub failed: Vec<Failed>,

    /// Inputs never attempted because a fatal error stopped the batch
    pub skipped: Vec<PathBuf>,
}

impl BatchSummary {
    /// Whether every input was uploaded
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// The error that stopped the batch, if any
    pub fn fatal_error(&self) -> Option<&Error> {
        self.failed.last().map(|f| &f.error).filter(|e| e.is_fatal())
    }
}

/// Uploads local images to an [`ObjectStore`]
pub struct Uploader<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    config: &'a Config,
    options: UploadOptions,
}

impl<'a, S: ObjectStore + ?Sized> Uploader<'a, S> {
    /// Create an uploader for one batch
    pub fn new(store: &'a S, config: &'a Config, options: UploadOptions) -> Self {
        Self {
            store,
            config,
            options,
        }
    }

    /// Upload a single file
    pub async fn upload_file(&self, path: &Path) -> Result<Uploaded> {
        let asset = Asset::read(path)?;
        let asset = imaging::prepare(asset, &self.options.resize)?;
        let key = build_remote_key(&asset.file_name, self.options.prefix.as_deref());

        tracing::debug!(
            source = %path.display(),
            key = %key,
            bytes = asset.data.len(),
            content_type = %asset.content_type,
            "uploading"
        );

        let size_bytes = asset.data.len() as u64;
        let content_type = asset.content_type.clone();
        self.store
            .put_object(&key, asset.data, &content_type)
            .await?;

        Ok(Uploaded {
            source: path.to_path_buf(),
            url: self.config.public_url_for(&key),
            key,
            size_bytes,
            content_type,
            width: asset.dimensions.map(|(w, _)| w),
            height: asset.dimensions.map(|(_, h)| h),
            resized: asset.resized,
        })
    }

    /// Upload files left to right
    ///
    /// `on_result` is called after every attempted file, before the next one
    /// starts, so callers can report progress as it happens.
    pub async fn upload_batch<F>(&self, paths: &[PathBuf], mut on_result: F) -> BatchSummary
    where
        F: FnMut(&Path, &Result<Uploaded>),
    {
        let mut summary = BatchSummary::default();

        for (index, path) in paths.iter().enumerate() {
            let result = self.upload_file(path).await;
            on_result(path, &result);

            match result {
                Ok(uploaded) => summary.uploaded.push(uploaded),
                Err(error) => {
                    let fatal = error.is_fatal();
                    summary.failed.push(Failed {
                        source: path.clone(),
                        error,
                    });
                    if fatal {
                        summary.skipped = paths[index + 1..].to_vec();
                        tracing::warn!(
                            skipped = summary.skipped.len(),
                            "stopping batch after fatal error"
                        );
                        break;
                    }
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;

    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use mockall::mock;

    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::{ListOptions, ListResult, ObjectInfo};

    mock! {
        Store {}

        #[async_trait]
        impl ObjectStore for Store {
            async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<ObjectInfo>;
            async fn list_objects(&self, options: ListOptions) -> Result<ListResult>;
            async fn head_object(&self, key: &str) -> Result<ObjectInfo>;
            async fn delete_object(&self, key: &str) -> Result<()>;
        }
    }

    fn test_config() -> Config {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("R2_ACCOUNT_ID", "acct"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "secret"),
            ("R2_BUCKET_NAME", "photos"),
            ("R2_PUBLIC_URL", "https://cdn.example.com"),
        ]);
        Config::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 200]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        std::fs::write(&path, buf.into_inner()).unwrap();
        path
    }

    fn resize_to(max_width: u32) -> UploadOptions {
        UploadOptions {
            prefix: None,
            resize: ResizeOptions {
                max_width,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_upload_small_image_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "small.png", 20, 10);
        let original = std::fs::read(&path).unwrap();

        let store = MemoryStore::new();
        let config = test_config();
        let uploader = Uploader::new(&store, &config, resize_to(100));

        let uploaded = uploader.upload_file(&path).await.unwrap();
        assert_eq!(uploaded.key, "images/small.png");
        assert_eq!(uploaded.url, "https://cdn.example.com/images/small.png");
        assert!(!uploaded.resized);
        assert_eq!(store.get("images/small.png").unwrap(), original);
        assert_eq!(store.content_type("images/small.png").unwrap(), "image/png");
        assert_eq!(std::fs::read(&path).unwrap(), original);
    }

    #[tokio::test]
    async fn test_upload_wide_image_is_resized_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 200, 100);

        let store = MemoryStore::new();
        let config = test_config();
        let options = UploadOptions {
            prefix: Some("blog/2026-02".into()),
            ..resize_to(50)
        };
        let uploader = Uploader::new(&store, &config, options);

        let uploaded = uploader.upload_file(&path).await.unwrap();
        assert_eq!(uploaded.key, "images/blog/2026-02/wide.jpg");
        assert_eq!(uploaded.width, Some(50));
        assert_eq!(uploaded.height, Some(25));
        assert!(uploaded.resized);
        assert_eq!(
            store.content_type("images/blog/2026-02/wide.jpg").unwrap(),
            "image/jpeg"
        );
        assert_eq!(
            uploaded.markdown(),
            "![wide.jpg](https://cdn.example.com/images/blog/2026-02/wide.jpg)"
        );
    }

    #[tokio::test]
    async fn test_upload_without_resize_sends_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();

        let store = MemoryStore::new();
        let config = test_config();
        let options = UploadOptions {
            prefix: None,
            resize: ResizeOptions {
                enabled: false,
                ..Default::default()
            },
        };
        let uploader = Uploader::new(&store, &config, options);

        let uploaded = uploader.upload_file(&path).await.unwrap();
        assert_eq!(uploaded.content_type, "text/plain");
        assert_eq!(store.get("images/notes.txt").unwrap(), b"plain text");
    }

    #[tokio::test]
    async fn test_same_name_twice_overwrites() {
        let first_dir = tempfile::tempdir().unwrap();
        let second_dir = tempfile::tempdir().unwrap();
        let first = write_png(first_dir.path(), "photo.png", 10, 10);
        let second = write_png(second_dir.path(), "photo.png", 12, 12);

        let store = MemoryStore::new();
        let config = test_config();
        let uploader = Uploader::new(&store, &config, resize_to(100));

        let a = uploader.upload_file(&first).await.unwrap();
        let b = uploader.upload_file(&second).await.unwrap();
        assert_eq!(a.key, b.key);
        assert_eq!(store.keys(), ["images/photo.png"]);
        assert_eq!(store.put_count(), 2);
        assert_eq!(
            store.get("images/photo.png").unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good_a = write_png(dir.path(), "a.png", 10, 10);
        let missing = dir.path().join("missing.png");
        let good_b = write_png(dir.path(), "b.png", 10, 10);
        let paths = vec![good_a, missing.clone(), good_b];

        let store = MemoryStore::new();
        let config = test_config();
        let uploader = Uploader::new(&store, &config, resize_to(100));

        let mut seen = Vec::new();
        let summary = uploader
            .upload_batch(&paths, |path, result| {
                seen.push((path.to_path_buf(), result.is_ok()));
            })
            .await;

        assert_eq!(summary.uploaded.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].source, missing);
        assert!(matches!(summary.failed[0].error, Error::FileRead { .. }));
        assert!(summary.skipped.is_empty());
        assert!(!summary.is_success());
        assert!(summary.fatal_error().is_none());
        assert_eq!(store.keys(), ["images/a.png", "images/b.png"]);
        assert_eq!(
            seen.iter().map(|(_, ok)| *ok).collect::<Vec<_>>(),
            [true, false, true]
        );
    }

    #[tokio::test]
    async fn test_batch_continues_after_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_png(dir.path(), "a.png", 10, 10),
            write_png(dir.path(), "b.png", 10, 10),
        ];

        let store = MemoryStore::new();
        store.fail_uploads_to("images/a.png");
        let config = test_config();
        let uploader = Uploader::new(&store, &config, resize_to(100));

        let summary = uploader.upload_batch(&paths, |_, _| {}).await;
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(summary.failed[0].error, Error::Network(_)));
        assert_eq!(summary.uploaded.len(), 1);
        assert_eq!(summary.uploaded[0].key, "images/b.png");
    }

    #[tokio::test]
    async fn test_missing_bucket_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_png(dir.path(), "a.png", 10, 10),
            write_png(dir.path(), "b.png", 10, 10),
            write_png(dir.path(), "c.png", 10, 10),
        ];

        let mut store = MockStore::new();
        store
            .expect_put_object()
            .times(1)
            .returning(|_, _, _| Err(Error::BucketNotFound("photos".into())));

        let config = test_config();
        let uploader = Uploader::new(&store, &config, resize_to(100));
        let summary = uploader.upload_batch(&paths, |_, _| {}).await;

        assert!(summary.uploaded.is_empty());
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.skipped, paths[1..].to_vec());
        assert!(matches!(
            summary.fatal_error(),
            Some(Error::BucketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_store_receives_computed_key_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "shot.png", 10, 10);

        let mut store = MockStore::new();
        store
            .expect_put_object()
            .withf(|key, data, content_type| {
                key.to_string() == "images/trips/shot.png"
                    && !data.is_empty()
                    && content_type.to_string() == "image/png"
            })
            .times(1)
            .returning(|key, data, _| Ok(ObjectInfo::new(key, data.len() as i64)));

        let config = test_config();
        let options = UploadOptions {
            prefix: Some("trips".into()),
            ..resize_to(100)
        };
        let uploader = Uploader::new(&store, &config, options);
        uploader.upload_file(&path).await.unwrap();
    }
}
