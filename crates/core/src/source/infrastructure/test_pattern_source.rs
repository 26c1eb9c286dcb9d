use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::shared::frame::{Frame, PixelFormat};
use crate::source::domain::frame_source::{FrameHandler, FrameSource, SourceError, SourceEvent};

type Subscriber = Arc<RwLock<Option<(FrameHandler, Sender<SourceEvent>)>>>;

/// Emits synthetic RGB frames at a fixed rate from its own thread.
///
/// Each frame is a diagonal gradient shifted by the frame index, so
/// consecutive frames differ and quadrant brightness drifts over time.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    fps: u32,
    max_frames: Option<usize>,
    subscriber: Subscriber,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, fps: u32) -> Result<Self, SourceError> {
        if width == 0 || height == 0 {
            return Err(SourceError::InvalidFrameSize { width, height });
        }
        if fps == 0 {
            return Err(SourceError::Start("frame rate must be positive".into()));
        }
        Ok(Self {
            width,
            height,
            fps,
            max_frames: None,
            subscriber: Arc::new(RwLock::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        })
    }

    /// Stops after `count` frames and reports [`SourceEvent::Ended`].
    pub fn with_frame_limit(mut self, count: usize) -> Self {
        self.max_frames = Some(count);
        self
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl FrameSource for TestPatternSource {
    fn subscribe(&mut self, handler: FrameHandler, events: Sender<SourceEvent>) {
        *self
            .subscriber
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some((handler, events));
    }

    fn unsubscribe(&mut self) {
        self.subscriber
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SourceError::Start("already running".into()));
        }

        let (width, height) = (self.width, self.height);
        let interval = Duration::from_secs_f64(1.0 / self.fps as f64);
        let max_frames = self.max_frames;
        let subscriber = self.subscriber.clone();
        let running = self.running.clone();

        let spawned = std::thread::Builder::new()
            .name("test-pattern".into())
            .spawn(move || {
                let mut due = Instant::now();
                let mut index = 0usize;
                while running.load(Ordering::SeqCst) {
                    if max_frames.is_some_and(|max| index >= max) {
                        notify(&subscriber, SourceEvent::Ended);
                        break;
                    }

                    let frame = pattern_frame(width, height, index);
                    // Clone out so the handler runs without the subscriber lock.
                    let handler = subscriber
                        .read()
                        .unwrap_or_else(PoisonError::into_inner)
                        .as_ref()
                        .map(|(h, _)| h.clone());
                    if let Some(handler) = handler {
                        handler(frame);
                    }
                    index += 1;

                    due += interval;
                    if let Some(wait) = due.checked_duration_since(Instant::now()) {
                        std::thread::sleep(wait);
                    }
                }
                log::debug!("Test pattern stopped after {index} frame(s)");
            });

        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                log::info!(
                    "Test pattern started: {}x{} @ {} fps",
                    self.width,
                    self.height,
                    self.fps
                );
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(SourceError::Start(e.to_string()))
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Test pattern thread panicked");
            }
        }
    }

    fn frame_width(&self) -> u32 {
        self.width
    }

    fn frame_height(&self) -> u32 {
        self.height
    }
}

impl Drop for TestPatternSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn notify(subscriber: &Subscriber, event: SourceEvent) {
    let guard = subscriber.read().unwrap_or_else(PoisonError::into_inner);
    if let Some((_, events)) = guard.as_ref() {
        let _ = events.send(event);
    }
}

fn pattern_frame(width: u32, height: u32, index: usize) -> Frame {
    let (w, h) = (width as usize, height as usize);
    let shift = index * 4;
    let mut data = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            let base = (x * 255 / w.max(1) + y * 255 / h.max(1)) / 2 + shift;
            data.push((base % 256) as u8);
            data.push(((base + 85) % 256) as u8);
            data.push(((base + 170) % 256) as u8);
        }
    }
    Frame::new(data, width, height, PixelFormat::Rgb8, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collecting_handler() -> (FrameHandler, Arc<Mutex<Vec<Frame>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = frames.clone();
        let handler: FrameHandler = Arc::new(move |frame: Frame| sink.lock().unwrap().push(frame));
        (handler, frames)
    }

    #[test]
    fn test_rejects_zero_size() {
        assert!(matches!(
            TestPatternSource::new(0, 10, 30),
            Err(SourceError::InvalidFrameSize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_rejects_zero_fps() {
        assert!(matches!(
            TestPatternSource::new(10, 10, 0),
            Err(SourceError::Start(_))
        ));
    }

    #[test]
    fn test_emits_indexed_rgb_frames() {
        let mut source = TestPatternSource::new(8, 6, 200).unwrap().with_frame_limit(3);
        let (handler, frames) = collecting_handler();
        let (tx, rx) = crossbeam_channel::unbounded();
        source.subscribe(handler, tx);

        source.start().unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            SourceEvent::Ended
        );
        source.stop();

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!((frame.width(), frame.height()), (8, 6));
            assert_eq!(frame.format(), PixelFormat::Rgb8);
        }
        assert_ne!(frames[0].data(), frames[1].data());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut source = TestPatternSource::new(4, 4, 500).unwrap();
        let (handler, frames) = collecting_handler();
        let (tx, _rx) = crossbeam_channel::unbounded();
        source.subscribe(handler, tx);
        source.start().unwrap();
        std::thread::sleep(Duration::from_millis(20));

        source.unsubscribe();
        let seen = frames.lock().unwrap().len();
        std::thread::sleep(Duration::from_millis(20));
        source.stop();

        // At most one delivery can already be in progress at unsubscribe.
        assert!(frames.lock().unwrap().len() <= seen + 1);
    }

    #[test]
    fn test_double_start_errors() {
        let mut source = TestPatternSource::new(4, 4, 30).unwrap();
        source.start().unwrap();
        assert!(matches!(source.start(), Err(SourceError::Start(_))));
        source.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut source = TestPatternSource::new(4, 4, 30).unwrap();
        source.stop();
        source.start().unwrap();
        source.stop();
        source.stop();
    }
}
