use std::time::{Duration, Instant};

use crate::detection::domain::detection::{BoundingBox, Detection};
use crate::detection::domain::detection_unit::{DetectionError, DetectionUnit, UnitSession};
use crate::detection::domain::execution_device::{DeviceKind, ExecutionDevice};
use crate::detection::domain::object_kind::ObjectKind;
use crate::shared::cancel_token::CancelToken;
use crate::shared::constants::CANCEL_POLL_INTERVAL;
use crate::shared::frame::Frame;

/// Quadrants darker than this (mean of all channels) report nothing.
const PRESENCE_THRESHOLD: f64 = 32.0;

/// Deterministic stand-in for a real detector.
///
/// Splits each frame into four quadrants and reports one detection per
/// quadrant whose mean intensity exceeds a threshold. The object kind is
/// derived from the quadrant position and brightness, confidence from
/// brightness. Bind and evaluate sleep for configurable latencies while
/// polling the cancel token, which makes the unit useful for exercising the
/// pipeline's timing and drop behavior without a model.
#[derive(Clone, Debug)]
pub struct SimulatedDetectionUnit {
    devices: Vec<ExecutionDevice>,
    bind_latency: Duration,
    eval_latency: Duration,
}

impl SimulatedDetectionUnit {
    pub fn new() -> Self {
        Self {
            devices: vec![
                ExecutionDevice::new(DeviceKind::Cpu, "Simulated CPU"),
                ExecutionDevice::new(DeviceKind::Gpu, "Simulated GPU"),
            ],
            bind_latency: Duration::ZERO,
            eval_latency: Duration::ZERO,
        }
    }

    pub fn with_devices(mut self, devices: Vec<ExecutionDevice>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_latencies(mut self, bind: Duration, eval: Duration) -> Self {
        self.bind_latency = bind;
        self.eval_latency = eval;
        self
    }
}

impl Default for SimulatedDetectionUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionUnit for SimulatedDetectionUnit {
    fn supported_devices(&self) -> Result<Vec<ExecutionDevice>, DetectionError> {
        Ok(self.devices.clone())
    }

    fn default_device(&self) -> Result<ExecutionDevice, DetectionError> {
        self.devices
            .first()
            .cloned()
            .ok_or_else(|| DetectionError::Unit("no execution devices".into()))
    }

    fn create_session(
        &self,
        device: &ExecutionDevice,
    ) -> Result<Box<dyn UnitSession>, DetectionError> {
        if !self.devices.contains(device) {
            return Err(DetectionError::Unit(format!("unknown device {device}")));
        }
        Ok(Box::new(SimulatedSession {
            bind_latency: self.bind_latency,
            eval_latency: self.eval_latency,
            quadrant_means: None,
        }))
    }
}

struct SimulatedSession {
    bind_latency: Duration,
    eval_latency: Duration,
    quadrant_means: Option<[f64; 4]>,
}

impl UnitSession for SimulatedSession {
    fn set_input(&mut self, frame: &Frame, cancel: &CancelToken) -> Result<(), DetectionError> {
        simulate_work(self.bind_latency, cancel)?;
        let means = quadrant_means(frame)
            .ok_or_else(|| DetectionError::Bind("frame buffer does not match its size".into()))?;
        self.quadrant_means = Some(means);
        Ok(())
    }

    fn evaluate(&mut self, cancel: &CancelToken) -> Result<Vec<Detection>, DetectionError> {
        let means = self.quadrant_means.ok_or(DetectionError::NothingBound)?;
        simulate_work(self.eval_latency, cancel)?;
        Ok(detections_from_means(&means))
    }
}

/// Sleeps for `duration` in short slices, bailing out once `cancel` is set.
fn simulate_work(duration: Duration, cancel: &CancelToken) -> Result<(), DetectionError> {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return Err(DetectionError::Cancelled);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        std::thread::sleep(CANCEL_POLL_INTERVAL.min(deadline - now));
    }
}

/// Mean intensity of the top-left, top-right, bottom-left and bottom-right
/// quadrants, over all channels.
fn quadrant_means(frame: &Frame) -> Option<[f64; 4]> {
    let pixels = frame.as_ndarray()?;
    let (h, w, _) = pixels.dim();
    let (hh, hw) = (h / 2, w / 2);
    if hh == 0 || hw == 0 {
        return Some([0.0; 4]);
    }

    let mut means = [0.0; 4];
    let corners = [(0, 0), (0, hw), (hh, 0), (hh, hw)];
    for (slot, &(row, col)) in corners.iter().enumerate() {
        let quadrant = pixels.slice(ndarray::s![row..row + hh, col..col + hw, ..]);
        let sum: f64 = quadrant.iter().map(|&v| v as f64).sum();
        means[slot] = sum / quadrant.len() as f64;
    }
    Some(means)
}

fn detections_from_means(means: &[f64; 4]) -> Vec<Detection> {
    let kinds: Vec<ObjectKind> = ObjectKind::selectable().collect();
    let origins: [(f32, f32); 4] = [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5)];

    means
        .iter()
        .zip(origins)
        .enumerate()
        .filter(|(_, (mean, _))| **mean > PRESENCE_THRESHOLD)
        .map(|(quadrant, (mean, (left, top)))| {
            let bucket = (*mean / 32.0) as usize;
            let kind = kinds[(quadrant * 17 + bucket) % kinds.len()];
            let confidence = (*mean / 255.0).clamp(0.0, 1.0) as f32;
            Detection::new(
                kind,
                BoundingBox::new(left + 0.05, top + 0.05, 0.4, 0.4),
                confidence,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use approx::assert_relative_eq;

    fn session() -> Box<dyn UnitSession> {
        let unit = SimulatedDetectionUnit::new();
        unit.create_session(&unit.default_device().unwrap()).unwrap()
    }

    /// 4x4 gray frame with only the bottom-right quadrant lit.
    fn bottom_right_lit(value: u8) -> Frame {
        let mut data = vec![0u8; 16];
        for row in 2..4 {
            for col in 2..4 {
                data[row * 4 + col] = value;
            }
        }
        Frame::new(data, 4, 4, PixelFormat::Gray8, 0)
    }

    #[test]
    fn test_default_devices() {
        let unit = SimulatedDetectionUnit::new();
        let devices = unit.supported_devices().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(unit.default_device().unwrap(), devices[0]);
    }

    #[test]
    fn test_unknown_device_is_rejected() {
        let unit = SimulatedDetectionUnit::new();
        let result = unit.create_session(&ExecutionDevice::new(DeviceKind::Npu, "npu"));
        assert!(result.is_err());
    }

    #[test]
    fn test_quadrant_means() {
        let means = quadrant_means(&bottom_right_lit(200)).unwrap();
        assert_relative_eq!(means[0], 0.0);
        assert_relative_eq!(means[1], 0.0);
        assert_relative_eq!(means[2], 0.0);
        assert_relative_eq!(means[3], 200.0);
    }

    #[test]
    fn test_dark_frame_reports_nothing() {
        let mut s = session();
        let cancel = CancelToken::new();
        s.set_input(&Frame::blank(8, 8, PixelFormat::Rgb8, 0), &cancel)
            .unwrap();
        assert!(s.evaluate(&cancel).unwrap().is_empty());
    }

    #[test]
    fn test_lit_quadrant_reports_one_detection() {
        let mut s = session();
        let cancel = CancelToken::new();
        s.set_input(&bottom_right_lit(255), &cancel).unwrap();

        let detections = s.evaluate(&cancel).unwrap();

        assert_eq!(detections.len(), 1);
        assert_relative_eq!(detections[0].confidence, 1.0);
        assert_relative_eq!(detections[0].bbox.left, 0.55);
        assert_relative_eq!(detections[0].bbox.top, 0.55);
    }

    #[test]
    fn test_detections_are_deterministic() {
        let mut s = session();
        let cancel = CancelToken::new();
        s.set_input(&bottom_right_lit(128), &cancel).unwrap();
        let first = s.evaluate(&cancel).unwrap();
        let second = s.evaluate(&cancel).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_evaluate_before_bind_errors() {
        let mut s = session();
        let result = s.evaluate(&CancelToken::new());
        assert_eq!(result, Err(DetectionError::NothingBound));
    }

    #[test]
    fn test_latency_is_cancellable() {
        let unit = SimulatedDetectionUnit::new()
            .with_latencies(Duration::from_secs(10), Duration::from_secs(10));
        let mut s = unit
            .create_session(&unit.default_device().unwrap())
            .unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let started = Instant::now();
        let result = s.set_input(&bottom_right_lit(255), &cancel);

        assert_eq!(result, Err(DetectionError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
