use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::detection_unit::DetectionError;

/// Rejected reconfiguration. The previously active configuration stays in
/// effect whenever one of these is returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("device '{0}' is not supported by the detection unit")]
    UnsupportedDevice(String),
    #[error("device index {index} out of range ({available} devices available)")]
    DeviceIndexOutOfRange { index: usize, available: usize },
    #[error("no execution devices available")]
    NoDevices,
    #[error("failed to enumerate execution devices: {0}")]
    Enumeration(#[source] DetectionError),
    #[error("failed to create binding: {0}")]
    Binding(#[source] DetectionError),
    #[error("malformed source descriptor: {0}")]
    MalformedDescriptor(String),
    #[error("unknown object category '{0}'")]
    UnknownCategory(String),
    #[error("failed to read settings from {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
