use crate::source::domain::frame_source::{FrameSource, SourceError};
use crate::source::domain::source_descriptor::SourceDescriptor;
use crate::source::infrastructure::image_file_source::ImageFileSource;
use crate::source::infrastructure::test_pattern_source::TestPatternSource;

/// Turns a parsed descriptor into a ready-to-subscribe source.
pub trait FrameSourceFactory: Send + Sync {
    /// Returns `Ok(None)` for [`SourceDescriptor::None`].
    fn create(&self, descriptor: &SourceDescriptor)
        -> Result<Option<Box<dyn FrameSource>>, SourceError>;
}

/// Builds the sources bundled with the crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSourceFactory;

impl FrameSourceFactory for DefaultSourceFactory {
    fn create(
        &self,
        descriptor: &SourceDescriptor,
    ) -> Result<Option<Box<dyn FrameSource>>, SourceError> {
        let source: Box<dyn FrameSource> = match descriptor {
            SourceDescriptor::None => return Ok(None),
            SourceDescriptor::TestPattern { width, height, fps } => {
                Box::new(TestPatternSource::new(*width, *height, *fps)?)
            }
            SourceDescriptor::ImageFile(path) => Box::new(ImageFileSource::open(path)?),
        };
        log::debug!("Created source for {descriptor}");
        Ok(Some(source))
    }
}
