use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::execution_device::ExecutionDevice;
use crate::shared::cancel_token::CancelToken;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("failed to bind input image: {0}")]
    Bind(String),
    #[error("evaluation failed: {0}")]
    Evaluate(String),
    #[error("input was bound by binding #{bound}, but binding #{current} is live")]
    StaleBinding { bound: u64, current: u64 },
    #[error("evaluate called before any input was bound")]
    NothingBound,
    #[error("detection unit error: {0}")]
    Unit(String),
}

/// The external detection capability: model load, device enumeration and
/// session creation.
///
/// Implementations block the calling thread for the duration of each call;
/// the pipeline only ever calls them from its run worker.
pub trait DetectionUnit: Send + Sync {
    /// Compute backends this unit can run on. Called once at startup.
    fn supported_devices(&self) -> Result<Vec<ExecutionDevice>, DetectionError>;

    /// Backend used when no device is explicitly selected.
    fn default_device(&self) -> Result<ExecutionDevice, DetectionError>;

    /// Creates device-bound session state for feeding frames to the unit.
    fn create_session(
        &self,
        device: &ExecutionDevice,
    ) -> Result<Box<dyn UnitSession>, DetectionError>;
}

/// Device-bound state of one detection unit instance.
///
/// Sessions are stateful (the bound input lives inside them), hence
/// `&mut self`. Long-running implementations should poll `cancel` and return
/// [`DetectionError::Cancelled`] once it is set.
pub trait UnitSession: Send {
    fn set_input(&mut self, frame: &Frame, cancel: &CancelToken) -> Result<(), DetectionError>;

    fn evaluate(&mut self, cancel: &CancelToken) -> Result<Vec<Detection>, DetectionError>;
}
