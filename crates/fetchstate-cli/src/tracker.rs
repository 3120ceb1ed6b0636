use std::sync::Arc;
use std::time::Duration;

use fetchstate::{Phase, TransitionCallback, TransitionEvent};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

const SPINNER_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

static SPINNER_TEMPLATE: Lazy<Option<ProgressStyle>> =
    Lazy::new(|| ProgressStyle::with_template(SPINNER_STYLE).ok().map(|s| s.tick_chars(TICK)));

/// Spinner showing the phase of the target being retrieved.
pub struct Tracker {
    pb: ProgressBar,
}

impl Tracker {
    pub fn new(quiet: bool) -> Self {
        let pb = if quiet { ProgressBar::hidden() } else { ProgressBar::new_spinner() };
        let pb = match SPINNER_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        pb.enable_steady_tick(Duration::from_millis(80));
        pb.set_message(Phase::Idle.to_string());
        Self { pb }
    }

    /// Transition observer that mirrors each phase into the spinner.
    pub fn observer(&self) -> TransitionCallback {
        let pb = self.pb.clone();
        Arc::new(move |event: &TransitionEvent| pb.set_message(event.phase.to_string()))
    }

    pub fn start(&self, target: &str) {
        self.pb.reset_elapsed();
        self.pb.set_prefix(target.to_string());
    }

    pub fn interrupted(&self) { self.pb.set_message("interrupted"); }

    /// Print a line without tearing the spinner.
    pub fn println(&self, line: &str) { self.pb.suspend(|| println!("{line}")); }

    pub fn finish(self) { self.pb.finish_and_clear(); }
}
