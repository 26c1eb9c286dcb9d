use std::fmt;

/// Class of compute backend a detection unit can run on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    Gpu,
    Npu,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Cpu => write!(f, "Cpu"),
            DeviceKind::Gpu => write!(f, "Gpu"),
            DeviceKind::Npu => write!(f, "Npu"),
        }
    }
}

/// A selectable compute backend, identified by kind and name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExecutionDevice {
    pub kind: DeviceKind,
    pub name: String,
}

impl ExecutionDevice {
    pub fn new(kind: DeviceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Formatted as `"<Kind> | <Name>"` for device pickers.
impl fmt::Display for ExecutionDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_kind_and_name() {
        let device = ExecutionDevice::new(DeviceKind::Gpu, "Integrated Graphics");
        assert_eq!(device.to_string(), "Gpu | Integrated Graphics");
    }

    #[test]
    fn test_equality_requires_kind_and_name() {
        let a = ExecutionDevice::new(DeviceKind::Cpu, "x");
        let b = ExecutionDevice::new(DeviceKind::Gpu, "x");
        assert_ne!(a, b);
        assert_eq!(a, ExecutionDevice::new(DeviceKind::Cpu, "x"));
    }
}
