//! Output formatting utilities
//!
//! Formatters for human-readable and JSON output, plus spinners shown while
//! a file is being processed.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressBar;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress spinners
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
