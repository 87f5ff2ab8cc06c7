//! Error types for r2img-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for r2img-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for r2img-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Invalid remote key or prefix
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Source file missing or unreadable
    #[error("Cannot read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Image could not be decoded, resized or encoded
    #[error("Unsupported image {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidUrl(_) | Error::InvalidKey(_) => 2, // UsageError
            Error::Network(_) => 3,                                              // NetworkError
            Error::Auth(_) => 4,                                                 // AuthError
            Error::NotFound(_) | Error::BucketNotFound(_) => 5,                  // NotFound
            _ => 1,                                                              // GeneralError
        }
    }

    /// Whether this error must stop the whole run rather than a single file
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::InvalidUrl(_) | Error::BucketNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidKey("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::BucketNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
        let err = Error::UnsupportedFormat {
            path: "a.txt".into(),
            reason: "unknown".into(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_fatal_errors() {
        assert!(Error::Config("missing".into()).is_fatal());
        assert!(Error::BucketNotFound("photos".into()).is_fatal());
        assert!(!Error::Network("reset".into()).is_fatal());
        assert!(!Error::Auth("denied".into()).is_fatal());
        assert!(!Error::NotFound("images/a.jpg".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("images/photo.jpg".into());
        assert_eq!(err.to_string(), "Not found: images/photo.jpg");

        let err = Error::FileRead {
            path: "missing.png".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "Cannot read missing.png: no such file");
    }
}
