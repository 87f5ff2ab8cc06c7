//! Remote key construction
//!
//! Every uploaded object lives under the fixed [`ROOT_NAMESPACE`], optionally
//! nested in caller-supplied folder segments:
//! `images/[prefix/]file_name`.
//!
//! Keys carry no collision detection. Uploading a file whose key already
//! exists replaces the remote object.

use crate::error::{Error, Result};

/// Top-level key segment for all uploaded images
pub const ROOT_NAMESPACE: &str = "images";

/// Key prefix used to list everything this tool uploaded
pub fn root_prefix() -> String {
    format!("{ROOT_NAMESPACE}/")
}

/// Validate and normalize a user-supplied prefix
///
/// Leading, trailing and repeated slashes are dropped. `.` and `..`
/// segments are rejected. A prefix that is empty after normalization
/// yields `None`.
pub fn normalize_prefix(raw: &str) -> Result<Option<String>> {
    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(bad) = segments.iter().find(|s| matches!(**s, "." | "..")) {
        return Err(Error::InvalidKey(format!(
            "prefix '{raw}' contains a '{bad}' segment"
        )));
    }
    if segments.iter().any(|s| s.chars().any(char::is_control)) {
        return Err(Error::InvalidKey(format!(
            "prefix '{raw}' contains control characters"
        )));
    }

    if segments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(segments.join("/")))
    }
}

/// Build the remote key for a file name and optional prefix
pub fn build_remote_key(file_name: &str, prefix: Option<&str>) -> String {
    let mut key = String::from(ROOT_NAMESPACE);
    if let Some(prefix) = prefix {
        for segment in prefix.split('/').filter(|s| !s.is_empty()) {
            key.push('/');
            key.push_str(segment);
        }
    }
    key.push('/');
    key.push_str(file_name);
    key
}

/// Last path segment of a key, used as link text
pub fn key_file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_without_prefix() {
        assert_eq!(build_remote_key("photo.jpg", None), "images/photo.jpg");
    }

    #[test]
    fn test_key_with_prefix() {
        assert_eq!(
            build_remote_key("photo.jpg", Some("blog/2026-02")),
            "images/blog/2026-02/photo.jpg"
        );
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = build_remote_key("sunset.png", Some("travel"));
        let b = build_remote_key("sunset.png", Some("travel"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_stray_slashes() {
        assert_eq!(
            build_remote_key("a.jpg", Some("/blog//2026/")),
            "images/blog/2026/a.jpg"
        );
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(
            normalize_prefix("/blog/2026-02/").unwrap(),
            Some("blog/2026-02".to_string())
        );
        assert_eq!(normalize_prefix("///").unwrap(), None);
        assert_eq!(normalize_prefix("").unwrap(), None);
    }

    #[test]
    fn test_normalize_prefix_rejects_dot_segments() {
        assert!(matches!(
            normalize_prefix("blog/../secret"),
            Err(Error::InvalidKey(_))
        ));
        assert!(normalize_prefix("./blog").is_err());
    }

    #[test]
    fn test_key_file_name() {
        assert_eq!(key_file_name("images/blog/photo.jpg"), "photo.jpg");
        assert_eq!(key_file_name("photo.jpg"), "photo.jpg");
    }

    #[test]
    fn test_root_prefix() {
        assert_eq!(root_prefix(), "images/");
    }
}
