//! Progress indicators for simulated runs.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for determinate progress
pub fn progress_bar(total: u64, message: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
    let pb = ProgressBar::new(total);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Finish a progress bar with a success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with an error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("✗ {}", message));
}
