use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for a sweep of `len` steps.
pub fn sweep_bar(len: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    bar.set_style(style);
    bar.set_message(message.to_string());
    bar
}

/// Spinner for loops without a known length.
pub fn counter_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner
}
