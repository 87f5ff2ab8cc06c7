//! Spinner shown while a file is read, resized and uploaded

use super::OutputConfig;

/// Spinner wrapper
///
/// In quiet or JSON mode, or with `--no-progress`, nothing is drawn.
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a spinner for indeterminate progress
    pub fn spinner(config: &OutputConfig, message: &str) -> Self {
        let bar = if config.quiet || config.json || config.no_progress {
            None
        } else {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
            {
                bar.set_style(style);
            }
            bar.set_message(message.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(bar)
        };

        Self { bar }
    }

    /// Set message
    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Hide the spinner while `f` writes to the terminal
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    /// Finish and clear the spinner
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Check if the spinner is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}
