use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::Sender;
use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to start source: {0}")]
    Start(String),
    #[error("invalid frame size {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },
}

/// Out-of-band notifications from a running source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceEvent {
    /// The source hit an unrecoverable error and stopped emitting.
    Failed(String),
    /// The source has no more frames to deliver.
    Ended,
}

/// Callback invoked on the source's delivery thread for every frame.
pub type FrameHandler = Arc<dyn Fn(Frame) + Send + Sync>;

/// A push-based producer of frames (camera, video file, still image).
///
/// Frames go to the subscribed handler; failures and end-of-stream go to the
/// event channel. Both are optional: a source without a subscriber keeps
/// running and discards its output.
pub trait FrameSource: Send {
    fn subscribe(&mut self, handler: FrameHandler, events: Sender<SourceEvent>);

    /// Drops the handler. No frame is delivered once this returns.
    fn unsubscribe(&mut self);

    fn start(&mut self) -> Result<(), SourceError>;

    /// Stops emission and releases the source's resources. Idempotent.
    fn stop(&mut self);

    fn frame_width(&self) -> u32;

    fn frame_height(&self) -> u32;
}
