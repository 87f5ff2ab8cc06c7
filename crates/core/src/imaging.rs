//! Image loading, resizing and re-encoding
//!
//! Images wider than the configured maximum are scaled down with Lanczos3
//! resampling and re-encoded as JPEG. Anything at or below the maximum keeps
//! its original bytes. Files on disk are never modified.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use crate::error::{Error, Result};

/// Default maximum width in pixels
pub const DEFAULT_MAX_WIDTH: u32 = 1920;

/// Default JPEG quality for re-encoded images
pub const DEFAULT_QUALITY: u8 = 80;

/// Content type of re-encoded images
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Fallback content type for unknown extensions
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Resize settings for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    /// Whether resizing is enabled at all
    pub enabled: bool,

    /// Maximum output width in pixels
    pub max_width: u32,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// A local image held in memory
#[derive(Debug, Clone)]
pub struct Asset {
    /// Where the bytes were read from
    pub path: PathBuf,

    /// File name used for the remote key
    pub file_name: String,

    /// Raw or re-encoded bytes
    pub data: Vec<u8>,

    /// Media type of `data`
    pub content_type: String,

    /// Width and height, once known
    pub dimensions: Option<(u32, u32)>,

    /// Whether `data` was produced by resizing
    pub resized: bool,
}

impl Asset {
    /// Read a file from disk
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| Error::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_bytes(path, data))
    }

    /// Wrap bytes that came from `path`
    pub fn from_bytes(path: &Path, data: Vec<u8>) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path: path.to_path_buf(),
            content_type: content_type_for(path),
            file_name,
            data,
            dimensions: None,
            resized: false,
        }
    }

    fn unsupported(&self, reason: impl ToString) -> Error {
        Error::UnsupportedFormat {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn reader(&self) -> Result<ImageReader<Cursor<&[u8]>>> {
        ImageReader::new(Cursor::new(self.data.as_slice()))
            .with_guessed_format()
            .map_err(|e| self.unsupported(e))
    }
}

/// Content type guessed from a path's extension
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Apply the batch resize settings to an asset
pub fn prepare(asset: Asset, options: &ResizeOptions) -> Result<Asset> {
    if options.enabled {
        resize(asset, options.max_width, options.quality)
    } else {
        Ok(asset)
    }
}

/// Scale an asset down to `max_width` and re-encode it as JPEG
///
/// Assets whose width is at most `max_width` are returned with their bytes
/// untouched; only their dimensions are filled in.
pub fn resize(mut asset: Asset, max_width: u32, quality: u8) -> Result<Asset> {
    let (width, height) = asset
        .reader()?
        .into_dimensions()
        .map_err(|e| asset.unsupported(e))?;

    if width <= max_width {
        tracing::debug!(file = %asset.file_name, width, height, "no resize needed");
        asset.dimensions = Some((width, height));
        return Ok(asset);
    }

    let image = asset
        .reader()?
        .decode()
        .map_err(|e| asset.unsupported(e))?;

    let new_height = scaled_height(width, height, max_width);
    let resized = image.resize_exact(max_width, new_height, FilterType::Lanczos3);
    let data = encode_jpeg(&resized, quality).map_err(|e| asset.unsupported(e))?;

    tracing::debug!(
        file = %asset.file_name,
        from = %format!("{width}x{height}"),
        to = %format!("{max_width}x{new_height}"),
        bytes = data.len(),
        "resized"
    );

    Ok(Asset {
        file_name: jpeg_file_name(&asset.file_name),
        content_type: JPEG_CONTENT_TYPE.to_string(),
        dimensions: Some((max_width, new_height)),
        resized: true,
        data,
        path: asset.path,
    })
}

/// Height after scaling `width` to `target_width`, truncated, never zero
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(target_width) / u64::from(width.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    // JPEG has no alpha channel; flatten everything to 8-bit RGB first.
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(buf)
}

fn jpeg_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    format!("{stem}.jpg")
}
