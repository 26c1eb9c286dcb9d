use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::detection::domain::detection::Detection;
use crate::pipeline::presentation_sink::{
    ExecutionState, Indicator, PresentationSink, RenderError,
};
use crate::shared::frame::Frame;

/// Headless presentation sink that reports results through the `log` crate.
///
/// Rendering logs each detection in pixel coordinates. Rendered frames are
/// throttled to every `throttle_frames`-th at `info` level; the rest go to
/// `debug`. The sink also keeps the latest timing text and status for the
/// caller's end-of-run summary.
pub struct LogPresentationSink {
    throttle_frames: u64,
    rendered: AtomicU64,
    detections: AtomicU64,
    last_timing: Mutex<Option<String>>,
    last_status: Mutex<Option<String>>,
}

impl LogPresentationSink {
    pub fn new(throttle_frames: u64) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            rendered: AtomicU64::new(0),
            detections: AtomicU64::new(0),
            last_timing: Mutex::new(None),
            last_status: Mutex::new(None),
        }
    }

    pub fn rendered_frames(&self) -> u64 {
        self.rendered.load(Ordering::Relaxed)
    }

    pub fn rendered_detections(&self) -> u64 {
        self.detections.load(Ordering::Relaxed)
    }

    pub fn last_timing(&self) -> Option<String> {
        self.last_timing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_status(&self) -> Option<String> {
        self.last_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the formatted summary string, or `None` if nothing was rendered.
    pub fn summary_string(&self) -> Option<String> {
        let frames = self.rendered_frames();
        if frames == 0 {
            return None;
        }
        let mut summary = format!(
            "Rendered {frames} frame(s), {} detection(s)",
            self.rendered_detections()
        );
        if let Some(timing) = self.last_timing() {
            summary.push_str(&format!("; last run {timing}"));
        }
        Some(summary)
    }
}

impl Default for LogPresentationSink {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PresentationSink for LogPresentationSink {
    fn render(&self, frame: &Frame, detections: &[Detection]) -> Result<(), RenderError> {
        let count = self.rendered.fetch_add(1, Ordering::Relaxed) + 1;
        self.detections
            .fetch_add(detections.len() as u64, Ordering::Relaxed);

        let level = if count % self.throttle_frames == 1 || self.throttle_frames == 1 {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        log::log!(
            level,
            "Frame {} ({}x{}): {} detection(s)",
            frame.index(),
            frame.width(),
            frame.height(),
            detections.len()
        );
        for d in detections {
            let (x, y, w, h) = d.bbox.to_pixels(frame.width(), frame.height());
            log::debug!(
                "  {} {:.0}% at ({x}, {y}) {w}x{h}",
                d.kind,
                d.confidence * 100.0
            );
        }
        Ok(())
    }

    fn update_timing_text(&self, text: &str) {
        log::debug!("Timing: {text}");
        *self
            .last_timing
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
    }

    fn notify_status(&self, message: &str) {
        log::info!("{message}");
        *self
            .last_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    fn update_indicator(&self, indicator: Indicator, state: ExecutionState) {
        log::trace!("{indicator:?}: {state:?}");
    }
}
