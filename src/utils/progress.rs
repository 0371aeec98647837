//! Progress reporting helpers shared by pipeline stages.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Styled bar for a stage with a known step count. Hidden when silent so
/// library callers and tests stay quiet.
pub fn stage_bar(len: u64, message: &str, silent: bool) -> ProgressBar {
    if silent {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {}",
                message
            ))
            .unwrap()
            .progress_chars("##-"),
    );
    pb
}

/// Steady-tick spinner for a stage without a known step count. Hidden when
/// silent.
pub fn stage_spinner(message: &str, silent: bool) -> ProgressBar {
    if silent {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(&format!("[{{elapsed_precise}}] {{spinner}} {}", message))
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
