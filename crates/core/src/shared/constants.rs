use std::time::Duration;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Frame rate used by the test pattern source when none is given.
pub const DEFAULT_PATTERN_FPS: u32 = 30;

/// Interval at which simulated work polls its cancel token.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(2);

pub const NO_DEVICES_MESSAGE: &str =
    "No execution devices available, this skill cannot run on this device";
