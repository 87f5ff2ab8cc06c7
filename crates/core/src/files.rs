//! Input file discovery

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extensions picked up when uploading a whole directory
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "gif"];

/// Whether a path has one of the [`IMAGE_EXTENSIONS`] (case-insensitive)
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Image files directly inside `dir`, sorted by path
///
/// Subdirectories are not descended into.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FileRead {
            path: dir.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let pattern = format!(
        "{}/*",
        glob::Pattern::escape(&dir.to_string_lossy()).trim_end_matches('/')
    );
    let entries = glob::glob(&pattern).map_err(|e| Error::General(e.to_string()))?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() && is_image_file(&path) => paths.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping unreadable entry: {e}"),
        }
    }
    paths.sort();
    Ok(paths)
}
