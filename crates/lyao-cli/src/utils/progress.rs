use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use lyao::engine::progress::{Progress, ProgressSink};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Renders sweep progress as a single bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target)
            .with_style(Self::bar_style())
            .with_message("Waiting");
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressSink<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::SweepStart { total_runs } => {
                    pb_guard.reset();
                    pb_guard.set_length(total_runs);
                    pb_guard.set_position(0);
                    pb_guard.set_message("Sweeping");
                }
                Progress::RunStart { key } => {
                    pb_guard.set_message(key.to_string());
                }
                Progress::RunFinish { .. } => {
                    pb_guard.inc(1);
                }
                Progress::RunFailed { key, reason } => {
                    pb_guard.println(format!("  ✗ {key}: {reason}"));
                    pb_guard.inc(1);
                }
                Progress::SweepFinish { completed, failed } => {
                    pb_guard.finish_with_message(format!(
                        "✓ {completed} completed, {failed} failed"
                    ));
                }
                Progress::Message(msg) => {
                    if pb_guard.is_finished() {
                        pb_guard.set_message(msg);
                    } else {
                        pb_guard.println(format!("  {msg}"));
                    }
                }
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("Failed to create bar style template")
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.0}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyao::engine::archive::{Period, RunKey};
    use std::thread;

    fn hidden() -> CliProgressHandler {
        CliProgressHandler::with_target(ProgressDrawTarget::hidden())
    }

    fn key(period: Period) -> RunKey {
        RunKey {
            day_of_year: 34,
            f107: 70.0,
            period,
        }
    }

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = hidden();
        let pb = handler.pb.lock().unwrap();
        assert_eq!(pb.length(), Some(0));
        assert!(pb.is_finished());
    }

    #[test]
    fn callback_tracks_runs_and_failures() {
        let handler = hidden();
        let callback = handler.get_callback();

        callback(Progress::SweepStart { total_runs: 2 });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.length(), Some(2));
            assert_eq!(pb.position(), 0);
            assert!(!pb.is_finished());
        }

        callback(Progress::RunStart {
            key: key(Period::Am),
        });
        assert_eq!(handler.pb.lock().unwrap().message(), "doy-34_AM_f107-70");

        callback(Progress::RunFinish {
            key: key(Period::Am),
            completed: 1,
        });
        callback(Progress::RunFailed {
            key: key(Period::Pm),
            reason: "transport exited with code 2".to_string(),
        });
        assert_eq!(handler.pb.lock().unwrap().position(), 2);

        callback(Progress::SweepFinish {
            completed: 1,
            failed: 1,
        });
        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "✓ 1 completed, 1 failed");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::SweepStart { total_runs: 1 });
            callback(Progress::RunFinish {
                key: key(Period::Am),
                completed: 1,
            });
            callback(Progress::SweepFinish {
                completed: 1,
                failed: 0,
            });
        })
        .join()
        .unwrap();

        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.position(), 1);
    }
}
