//! Output formatter for human-readable and JSON output
//!
//! Results go to stdout; errors and warnings go to stderr so that snippets
//! can be piped without noise.

use console::style;
use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
///
/// When JSON mode is enabled, stdout carries a single JSON document and
/// errors are emitted as JSON objects on stderr.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Output configuration this formatter was built from
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Output a success message
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }

        if self.colors_enabled() {
            println!("{} {message}", style("✓").green());
        } else {
            println!("✓ {message}");
        }
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| message.to_string())
            );
        } else if self.colors_enabled() {
            eprintln!("{} {message}", style("✗").red());
        } else {
            eprintln!("✗ {message}");
        }
    }

    /// Output a warning message
    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }

        if self.colors_enabled() {
            eprintln!("{} {message}", style("⚠").yellow());
        } else {
            eprintln!("⚠ {message}");
        }
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
