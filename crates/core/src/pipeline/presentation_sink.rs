use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("{0}")]
    Failed(String),
}

/// Progress markers shown next to each pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Indicator {
    Initialization,
    Binding,
    Evaluating,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    Reset,
    Start,
    End,
    Error,
}

/// Consumer of pipeline output.
///
/// Apart from `render`, calls are fire-and-forget: the pipeline never waits
/// on or inspects their outcome.
pub trait PresentationSink: Send + Sync {
    /// Shows a processed frame together with its filtered detections.
    fn render(&self, frame: &Frame, detections: &[Detection]) -> Result<(), RenderError>;

    fn update_timing_text(&self, text: &str);

    fn notify_status(&self, message: &str);

    fn update_indicator(&self, _indicator: Indicator, _state: ExecutionState) {}
}
