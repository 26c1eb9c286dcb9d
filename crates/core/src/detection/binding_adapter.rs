use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::config_error::ConfigError;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::detection_unit::{DetectionError, DetectionUnit, UnitSession};
use crate::detection::domain::execution_device::ExecutionDevice;
use crate::shared::cancel_token::CancelToken;
use crate::shared::frame::Frame;

/// Device-bound state required to feed frames into the detection unit.
///
/// Each binding carries a unique id so inputs bound through one binding can
/// never be evaluated by another.
pub struct Binding {
    id: u64,
    device: ExecutionDevice,
    session: Box<dyn UnitSession>,
}

impl Binding {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn device(&self) -> &ExecutionDevice {
        &self.device
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

/// Token returned by [`DetectionBindingAdapter::bind`], consumed by
/// [`DetectionBindingAdapter::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundInput {
    binding_id: u64,
    frame_index: usize,
    width: u32,
    height: u32,
}

impl BoundInput {
    pub fn binding_id(&self) -> u64 {
        self.binding_id
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Thin wrapper over a [`DetectionUnit`]: validates device selection against
/// the devices enumerated at startup and pairs bind/evaluate calls.
pub struct DetectionBindingAdapter {
    unit: Arc<dyn DetectionUnit>,
    devices: Vec<ExecutionDevice>,
    next_binding_id: AtomicU64,
}

impl DetectionBindingAdapter {
    /// Enumerates the unit's devices once. Fails with
    /// [`ConfigError::NoDevices`] when the unit cannot run anywhere.
    pub fn new(unit: Arc<dyn DetectionUnit>) -> Result<Self, ConfigError> {
        let devices = unit
            .supported_devices()
            .map_err(ConfigError::Enumeration)?;
        if devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        log::debug!("Detection unit supports {} device(s)", devices.len());
        Ok(Self {
            unit,
            devices,
            next_binding_id: AtomicU64::new(1),
        })
    }

    pub fn devices(&self) -> &[ExecutionDevice] {
        &self.devices
    }

    pub fn device_at(&self, index: usize) -> Result<&ExecutionDevice, ConfigError> {
        self.devices
            .get(index)
            .ok_or(ConfigError::DeviceIndexOutOfRange {
                index,
                available: self.devices.len(),
            })
    }

    pub fn index_of(&self, device: &ExecutionDevice) -> Option<usize> {
        self.devices.iter().position(|d| d == device)
    }

    /// Creates a binding on `device`, or on the unit's default device when
    /// `None`. An explicit device must be one of the enumerated devices.
    pub fn create_binding(&self, device: Option<&ExecutionDevice>) -> Result<Binding, ConfigError> {
        let device = match device {
            Some(d) => {
                if !self.devices.contains(d) {
                    return Err(ConfigError::UnsupportedDevice(d.to_string()));
                }
                d.clone()
            }
            None => self
                .unit
                .default_device()
                .map_err(ConfigError::Binding)?,
        };

        let session = self
            .unit
            .create_session(&device)
            .map_err(ConfigError::Binding)?;
        let id = self.next_binding_id.fetch_add(1, Ordering::Relaxed);
        log::debug!("Created binding #{id} on {device}");

        Ok(Binding {
            id,
            device,
            session,
        })
    }

    pub fn bind(
        &self,
        binding: &mut Binding,
        frame: &Frame,
        cancel: &CancelToken,
    ) -> Result<BoundInput, DetectionError> {
        if cancel.is_cancelled() {
            return Err(DetectionError::Cancelled);
        }
        binding.session.set_input(frame, cancel)?;
        Ok(BoundInput {
            binding_id: binding.id,
            frame_index: frame.index(),
            width: frame.width(),
            height: frame.height(),
        })
    }

    pub fn evaluate(
        &self,
        binding: &mut Binding,
        input: BoundInput,
        cancel: &CancelToken,
    ) -> Result<Vec<Detection>, DetectionError> {
        if input.binding_id != binding.id {
            return Err(DetectionError::StaleBinding {
                bound: input.binding_id,
                current: binding.id,
            });
        }
        if cancel.is_cancelled() {
            return Err(DetectionError::Cancelled);
        }
        binding.session.evaluate(cancel)
    }
}
