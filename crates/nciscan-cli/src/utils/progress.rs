use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use nciscan::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const BAR_TEMPLATE: &str = "{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

struct BarState {
    bar: ProgressBar,
    phase: &'static str,
    failed_frames: usize,
}

impl BarState {
    fn handle(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.phase = name;
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                self.bar.set_message(name);
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                let message = match self.failed_frames {
                    0 => format!("✓ {}", self.phase),
                    n => format!("✓ {} ({} frame(s) skipped)", self.phase, n),
                };
                self.bar.finish_with_message(message);
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
                self.bar.set_style(bar_style());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                let total = self.bar.length().unwrap_or(0);
                self.bar.set_position(total.max(self.bar.position()));
                self.bar.finish();
            }
            Progress::FrameDone { name, ok } => {
                if !ok {
                    self.failed_frames += 1;
                    self.bar.println(format!("  ✗ {name} skipped"));
                }
            }
            Progress::Message(msg) => {
                if self.bar.is_finished() {
                    self.bar.set_message(msg);
                } else {
                    self.bar.println(format!("  {msg}"));
                }
            }
        }
    }
}

/// Renders engine progress events on a single stderr bar.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::new(0).with_style(spinner_style());
        bar.set_draw_target(target);
        bar.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(BarState {
                bar,
                phase: "",
                failed_frames: 0,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();
        Box::new(move |progress: Progress| match state.lock() {
            Ok(mut guard) => guard.handle(progress),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot update progress."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn style(template: &'static str) -> ProgressStyle {
    ProgressStyle::with_template(template).expect("progress templates are constant and valid")
}

fn spinner_style() -> ProgressStyle {
    style(SPINNER_TEMPLATE)
}

fn bar_style() -> ProgressStyle {
    style(BAR_TEMPLATE)
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
        })
        .progress_chars("##-")
}
