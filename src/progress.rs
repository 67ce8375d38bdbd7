//! Phase reporting for fetch and clean runs.
//!
//! Each run phase gets a progress bar or spinner on the terminal. With
//! `--log-only` the bars are hidden and phases report through periodic
//! stderr lines instead, which reads better in redirected output.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Run phases, in the order a `run` command goes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Song pages downloaded from the provider.
    Fetch,
    /// Filter & Group plus Select & Clean.
    Canonicalize,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Fetch => "fetch",
            Phase::Canonicalize => "canonicalize",
        }
    }

    /// How often (in items) log-only mode prints a progress line.
    pub fn log_interval(self) -> u64 {
        match self {
            Phase::Fetch => 25,
            Phase::Canonicalize => 1,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Progress bar over the items of one phase (hidden in log-only mode).
pub fn phase_bar(phase: Phase, len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else if let Ok(style) =
        ProgressStyle::default_bar().template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(format!("[{}]", phase));
    pb
}

/// Spinner for a phase with no item count (hidden in log-only mode).
pub fn phase_spinner(phase: Phase) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        eprintln!("[{}] started", phase);
    } else {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg} {spinner} [{elapsed_precise}]") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(format!("[{}]", phase));
    pb
}

/// Close out a phase bar or spinner with a summary.
/// In log-only mode the summary goes to stderr, since the bar is hidden.
pub fn finish_phase(pb: &ProgressBar, phase: Phase, summary: &str) {
    if is_log_only() {
        eprintln!("[{}] {}", phase, summary);
    }
    pb.finish_with_message(format!("[{}] {}", phase, summary));
}

/// The periodic progress line printed in log-only mode, if one is due.
pub fn progress_line(phase: Phase, current: u64, total: u64) -> Option<String> {
    if total == 0 || (current % phase.log_interval() != 0 && current != total) {
        return None;
    }
    let pct = 100.0 * current as f64 / total as f64;
    Some(format!("[{}] {}/{} ({:.1}%)", phase, current, total, pct))
}

/// Log progress periodically for tail-friendly output.
pub fn log_progress(phase: Phase, current: u64, total: u64) {
    if is_log_only() {
        if let Some(line) = progress_line(phase, current, total) {
            eprintln!("{}", line);
        }
    }
}
