use thiserror::Error;

use crate::config::config_error::ConfigError;
use crate::detection::domain::detection_unit::DetectionError;
use crate::pipeline::presentation_sink::RenderError;
use crate::source::domain::frame_source::SourceError;

/// Failure of one pipeline run or of a reconfiguration request.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The frame's source was torn down mid-run. Expected; never reported.
    #[error("run cancelled")]
    Cancelled,
    #[error(transparent)]
    Detection(DetectionError),
    #[error("Exception while rendering results: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("run panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

impl From<DetectionError> for PipelineError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Detection(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_cancellation_maps_to_cancelled() {
        let err: PipelineError = DetectionError::Cancelled.into();
        assert!(err.is_cancellation());
    }

    #[test]
    fn test_detection_failure_is_not_cancellation() {
        let err: PipelineError = DetectionError::Evaluate("boom".into()).into();
        assert!(!err.is_cancellation());
        assert_eq!(err.to_string(), "evaluation failed: boom");
    }

    #[test]
    fn test_render_message() {
        let err: PipelineError = RenderError::Failed("surface lost".into()).into();
        assert_eq!(
            err.to_string(),
            "Exception while rendering results: surface lost"
        );
    }
}
