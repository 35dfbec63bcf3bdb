use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use molkit::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct BarState {
    bar: ProgressBar,
    phase: &'static str,
    started: Option<Instant>,
}

/// Renders engine [`Progress`] events as a single spinner/bar on stderr.
///
/// Each phase shows a spinner until a task announces its length, then a bar.
/// A finished phase leaves one `✓ <phase> (<seconds>s)` line behind.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new(visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(0), target);
        bar.set_style(spinner_style());
        Self {
            state: Arc::new(Mutex::new(BarState {
                bar,
                phase: "",
                started: None,
            })),
        }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let state = Arc::clone(&self.state);
        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };
            state.handle(progress);
        })
    }
}

impl BarState {
    fn handle(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.phase = name;
                self.started = Some(Instant::now());
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar.set_message(name);
                self.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                let seconds = self
                    .started
                    .take()
                    .map_or(0.0, |start| start.elapsed().as_secs_f64());
                self.bar.println(format!("✓ {} ({:.2}s)", self.phase, seconds));
                self.bar.finish_and_clear();
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.set_style(bar_style());
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = self.bar.length() {
                    self.bar.set_position(length);
                }
            }
            Progress::Message(message) => self.bar.println(format!("  {}", message)),
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<30} [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn events_drive_the_bar() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.callback();

        callback(Progress::PhaseStart { name: "Perceiving Bonds" });
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.bar.message(), "Perceiving Bonds");
            assert_eq!(state.phase, "Perceiving Bonds");
            assert!(state.started.is_some());
        }

        callback(Progress::TaskStart { total_steps: 8 });
        callback(Progress::TaskIncrement);
        callback(Progress::TaskIncrement);
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.bar.length(), Some(8));
            assert_eq!(state.bar.position(), 2);
        }

        callback(Progress::TaskFinish);
        assert_eq!(handler.state.lock().unwrap().bar.position(), 8);

        callback(Progress::PhaseFinish);
        let state = handler.state.lock().unwrap();
        assert!(state.bar.is_finished());
        assert!(state.started.is_none());
    }

    #[test]
    fn a_new_phase_resets_the_bar() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.callback();

        callback(Progress::PhaseStart { name: "Assembling Structure" });
        callback(Progress::TaskStart { total_steps: 3 });
        callback(Progress::TaskIncrement);
        callback(Progress::PhaseFinish);
        callback(Progress::PhaseStart { name: "Naming Chains" });

        let state = handler.state.lock().unwrap();
        assert_eq!(state.bar.position(), 0);
        assert_eq!(state.bar.message(), "Naming Chains");
    }

    #[test]
    fn callback_can_be_sent_to_another_thread() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Superposition" });
            callback(Progress::Message("9 pairs".to_string()));
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(handler.state.lock().unwrap().bar.is_finished());
    }
}
