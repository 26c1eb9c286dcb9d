use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Pipeline stages with a recorded duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Bind,
    Evaluate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct StageTiming {
    bind: Duration,
    evaluate: Duration,
}

/// Latest bind/evaluate durations. Each record overwrites the previous value;
/// there is no history.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    latest: Mutex<StageTiming>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, stage: Stage, duration: Duration) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        match stage {
            Stage::Bind => latest.bind = duration,
            Stage::Evaluate => latest.evaluate = duration,
        }
        log::debug!("{stage:?} took {:.2}ms", as_millis(duration));
    }

    pub fn bind_ms(&self) -> f64 {
        as_millis(self.snapshot().bind)
    }

    pub fn evaluate_ms(&self) -> f64 {
        as_millis(self.snapshot().evaluate)
    }

    /// Formats both durations, e.g. `"bind: 1.25ms, eval: 10.00ms"`.
    pub fn summary(&self) -> String {
        let timing = self.snapshot();
        format!(
            "bind: {:.2}ms, eval: {:.2}ms",
            as_millis(timing.bind),
            as_millis(timing.evaluate)
        )
    }

    fn snapshot(&self) -> StageTiming {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_summary_is_zero() {
        let metrics = MetricsRecorder::new();
        assert_eq!(metrics.summary(), "bind: 0.00ms, eval: 0.00ms");
    }

    #[test]
    fn test_summary_uses_two_decimals() {
        let metrics = MetricsRecorder::new();
        metrics.record(Stage::Bind, Duration::from_micros(1250));
        metrics.record(Stage::Evaluate, Duration::from_millis(10));
        assert_eq!(metrics.summary(), "bind: 1.25ms, eval: 10.00ms");
    }

    #[test]
    fn test_record_overwrites_previous_value() {
        let metrics = MetricsRecorder::new();
        metrics.record(Stage::Evaluate, Duration::from_millis(30));
        metrics.record(Stage::Evaluate, Duration::from_millis(5));
        assert_relative_eq!(metrics.evaluate_ms(), 5.0);
    }

    #[test]
    fn test_stages_are_independent() {
        let metrics = MetricsRecorder::new();
        metrics.record(Stage::Bind, Duration::from_millis(2));
        assert_relative_eq!(metrics.bind_ms(), 2.0);
        assert_relative_eq!(metrics.evaluate_ms(), 0.0);
    }
}
