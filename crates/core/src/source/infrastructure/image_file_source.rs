use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;

use crate::shared::frame::{Frame, PixelFormat};
use crate::source::domain::frame_source::{FrameHandler, FrameSource, SourceError, SourceEvent};

/// Adapts a single image file to the [`FrameSource`] interface.
///
/// The file is decoded to RGB when opened, so a bad path fails before any
/// running source is replaced. `start` delivers the frame once on the
/// calling thread, then reports [`SourceEvent::Ended`].
pub struct ImageFileSource {
    path: PathBuf,
    frame: Frame,
    subscriber: Option<(FrameHandler, Sender<SourceEvent>)>,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let decoded = image::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(SourceError::InvalidFrameSize { width, height });
        }
        log::debug!("Decoded {} ({width}x{height})", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            frame: Frame::new(rgb.into_raw(), width, height, PixelFormat::Rgb8, 0),
            subscriber: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ImageFileSource {
    fn subscribe(&mut self, handler: FrameHandler, events: Sender<SourceEvent>) {
        self.subscriber = Some((handler, events));
    }

    fn unsubscribe(&mut self) {
        self.subscriber = None;
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if let Some((handler, events)) = &self.subscriber {
            handler(self.frame.clone());
            let _ = events.send(SourceEvent::Ended);
        }
        Ok(())
    }

    fn stop(&mut self) {}

    fn frame_width(&self) -> u32 {
        self.frame.width()
    }

    fn frame_height(&self) -> u32 {
        self.frame.height()
    }
}
