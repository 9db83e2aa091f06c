//! Terminal output helpers shared by the commands.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while the directory and permission loads run.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("spinner template is a valid static string"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// A dimmed `key: value` detail line.
pub fn detail(key: &str, value: &str) {
    println!("  {} {}", style(format!("{key}:")).dim(), value);
}

/// A green check line for a completed action.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// A yellow notice line.
pub fn notice(msg: &str) {
    println!("{} {}", style("!").yellow(), msg);
}
