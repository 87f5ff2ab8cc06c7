//! Exit code definitions for r2img
//!
//! Scripts wrapping the uploader rely on these values. Changing one is a
//! breaking change.

use r2img_core::Error;

/// Exit codes for the r2img application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error, including a batch with failed files
    GeneralError = 1,

    /// User input error: invalid arguments or configuration
    UsageError = 2,

    /// Network error: timeout, connection reset, 503, etc.
    NetworkError = 3,

    /// Authentication or permission failure
    AuthError = 4,

    /// Resource not found: bucket or object does not exist
    NotFound = 5,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::NetworkError),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            _ => None,
        }
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments or configuration",
            Self::NetworkError => "Network error",
            Self::AuthError => "Authentication or permission failure",
            Self::NotFound => "Resource not found",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        Self::from_i32(err.exit_code()).unwrap_or(Self::GeneralError)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
