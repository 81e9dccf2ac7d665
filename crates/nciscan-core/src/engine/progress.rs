/// Events emitted while a frame or a trajectory is processed.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// A trajectory frame finished, successfully or not.
    FrameDone { name: String, ok: bool },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Wraps `f` in a `PhaseStart`/`PhaseFinish` pair. The finish event is sent
    /// even when `f` fails so that renderers can close their bars.
    pub fn phase<T, E>(&self, name: &'static str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.report(Progress::PhaseStart { name });
        let result = f();
        self.report(Progress::PhaseFinish);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn phase_reports_start_and_finish_even_on_error() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(format!("{event:?}"));
        }));

        let result: Result<(), &str> = reporter.phase("Detection", || Err("boom"));
        assert_eq!(result, Err("boom"));
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("Detection"));
        assert_eq!(events[1], "PhaseFinish");
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".into()));
        let value: Result<u8, ()> = reporter.phase("Noop", || Ok(7));
        assert_eq!(value, Ok(7));
    }
}
