//! Terminal styling helpers
//!
//! Colors are emitted unconditionally; output goes through `anstream`, which
//! strips them when stdout is not a terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Green check mark
pub fn check() -> String {
    "✓".green().to_string()
}

/// Red cross
pub fn cross() -> String {
    "✗".red().to_string()
}

/// Style for the batch progress bar
pub fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Semantic colors for CLI output
pub trait Stylize {
    /// Highlighted value (names, ids)
    fn accent(&self) -> String;
    /// De-emphasized detail
    fn muted(&self) -> String;
    /// Error text
    fn failure(&self) -> String;
}

impl<T: Display> Stylize for T {
    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    fn failure(&self) -> String {
        self.red().to_string()
    }
}
