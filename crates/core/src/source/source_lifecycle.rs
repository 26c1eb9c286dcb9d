use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use crate::pipeline::pipeline_controller::PipelineController;
use crate::pipeline::pipeline_error::PipelineError;
use crate::shared::cancel_token::CancelToken;
use crate::shared::frame::Frame;
use crate::source::domain::frame_source::{FrameHandler, FrameSource, SourceEvent};
use crate::source::domain::source_descriptor::SourceDescriptor;
use crate::source::frame_source_factory::{DefaultSourceFactory, FrameSourceFactory};

/// The currently attached source and everything needed to tear it down.
struct Attachment {
    descriptor: SourceDescriptor,
    source: Box<dyn FrameSource>,
    /// Open while deliveries may reach the controller. Deliveries hold the
    /// read lock, so closing it waits out any delivery in progress.
    gate: Arc<RwLock<bool>>,
    cancel: CancelToken,
    forwarder: Option<JoinHandle<()>>,
}

impl Attachment {
    /// Detaches, then disposes the source. Once the gate is closed no frame
    /// from this source can be admitted, and any run already holding one of
    /// its frames is cancelled.
    fn detach(mut self) {
        *self.gate.write().unwrap_or_else(PoisonError::into_inner) = false;
        self.cancel.cancel();
        self.source.unsubscribe();
        self.source.stop();
        drop(self.source);

        // The event channel closes with the source, which ends the forwarder.
        if let Some(forwarder) = self.forwarder.take() {
            if forwarder.join().is_err() {
                log::error!("Source event forwarder panicked");
            }
        }
        log::info!("Detached source {}", self.descriptor);
    }
}

/// Owns the active frame source and swaps it on request.
///
/// A swap detaches the old source (gate closed, runs cancelled, source
/// stopped), recreates the controller's binding and only then starts the new
/// source. Invalid descriptors and sources that fail to open are rejected
/// before the old source is touched.
pub struct SourceLifecycleManager {
    controller: Arc<PipelineController>,
    factory: Box<dyn FrameSourceFactory>,
    active: Mutex<Option<Attachment>>,
}

impl SourceLifecycleManager {
    pub fn new(controller: Arc<PipelineController>) -> Self {
        Self::with_factory(controller, Box::new(DefaultSourceFactory))
    }

    pub fn with_factory(
        controller: Arc<PipelineController>,
        factory: Box<dyn FrameSourceFactory>,
    ) -> Self {
        Self {
            controller,
            factory,
            active: Mutex::new(None),
        }
    }

    /// Replaces the active source with the one described by `descriptor`.
    ///
    /// `none` detaches the current source and leaves the pipeline idle.
    pub fn set_source(&self, descriptor: &str) -> Result<(), PipelineError> {
        let descriptor: SourceDescriptor = descriptor.parse()?;
        let source = self.factory.create(&descriptor)?;

        let mut active = self.lock_active();
        if let Some(previous) = active.take() {
            previous.detach();
        }

        self.controller.rebind()?;

        let Some(source) = source else {
            log::info!("No source configured, pipeline idle");
            return Ok(());
        };

        *active = Some(self.attach(descriptor, source)?);
        Ok(())
    }

    /// Detaches the active source, if any.
    pub fn clear(&self) {
        if let Some(previous) = self.lock_active().take() {
            previous.detach();
        }
    }

    pub fn current_descriptor(&self) -> SourceDescriptor {
        self.lock_active()
            .as_ref()
            .map(|a| a.descriptor.clone())
            .unwrap_or(SourceDescriptor::None)
    }

    /// Width and height of the active source's frames.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.lock_active()
            .as_ref()
            .map(|a| (a.source.frame_width(), a.source.frame_height()))
    }

    pub fn is_active(&self) -> bool {
        self.lock_active().is_some()
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<Attachment>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(
        &self,
        descriptor: SourceDescriptor,
        mut source: Box<dyn FrameSource>,
    ) -> Result<Attachment, PipelineError> {
        let gate = Arc::new(RwLock::new(true));
        let cancel = CancelToken::new();

        let handler: FrameHandler = {
            let controller = self.controller.clone();
            let gate = gate.clone();
            let cancel = cancel.clone();
            Arc::new(move |frame: Frame| {
                let open = gate.read().unwrap_or_else(PoisonError::into_inner);
                if *open {
                    controller.on_frame_arrived(frame, &cancel);
                }
            })
        };

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        source.subscribe(handler, event_tx);
        let forwarder = spawn_forwarder(self.controller.clone(), event_rx);

        let mut attachment = Attachment {
            descriptor,
            source,
            gate,
            cancel,
            forwarder: Some(forwarder),
        };

        if let Err(e) = attachment.source.start() {
            log::warn!("Failed to start {}: {e}", attachment.descriptor);
            attachment.detach();
            return Err(e.into());
        }
        log::info!("Attached source {}", attachment.descriptor);
        Ok(attachment)
    }
}

impl Drop for SourceLifecycleManager {
    fn drop(&mut self) {
        self.clear();
    }
}

fn spawn_forwarder(controller: Arc<PipelineController>, events: Receiver<SourceEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for event in events {
            match event {
                SourceEvent::Failed(reason) => {
                    log::warn!("Source failed: {reason}");
                    controller.status(&format!("Source failed: {reason}"));
                }
                SourceEvent::Ended => {
                    log::info!("Source ended");
                    controller.status("Source ended");
                }
            }
        }
    })
}
