//! r2img-core: Core library for the r2img photo uploader
//!
//! This crate provides the core functionality for r2img, including:
//! - Configuration loading from the environment
//! - Remote key construction
//! - Image resizing and re-encoding
//! - ObjectStore trait for bucket operations, with an in-memory implementation
//! - The sequential upload pipeline
//!
//! This crate is independent of any specific S3 SDK, so the whole pipeline
//! can be tested without network access.

pub mod config;
pub mod error;
pub mod files;
pub mod imaging;
pub mod key;
pub mod memory;
pub mod traits;
pub mod upload;

pub use config::Config;
pub use error::{Error, Result};
pub use imaging::{Asset, ResizeOptions};
pub use key::{ROOT_NAMESPACE, build_remote_key, normalize_prefix, root_prefix};
pub use memory::MemoryStore;
pub use traits::{ListOptions, ListResult, ObjectInfo, ObjectStore, list_all};
pub use upload::{BatchSummary, Failed, UploadOptions, Uploaded, Uploader};
