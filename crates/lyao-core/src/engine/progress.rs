use super::archive::RunKey;

/// Events emitted while a sweep runs, in order: one `SweepStart`, then per
/// run a `RunStart` followed by `RunFinish` or `RunFailed`, then `SweepFinish`.
#[derive(Debug, Clone)]
pub enum Progress {
    SweepStart { total_runs: u64 },
    RunStart { key: RunKey },
    RunFinish { key: RunKey, completed: u64 },
    RunFailed { key: RunKey, reason: String },
    SweepFinish { completed: u64, failed: u64 },

    Message(String),
}

pub type ProgressSink<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards sweep events to an optional sink. The default reporter drops them.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    sink: Option<ProgressSink<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: ProgressSink<'a>) -> Self {
        Self { sink: Some(sink) }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        self.report(Progress::Message(text.into()));
    }
}
