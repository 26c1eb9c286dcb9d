use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::config_error::ConfigError;
use crate::shared::constants::{DEFAULT_PATTERN_FPS, IMAGE_EXTENSIONS};

/// Parsed form of a source selection string.
///
/// Grammar:
/// - `none` (or an empty string): no source, the pipeline idles
/// - `pattern:<W>x<H>[@<FPS>]`: synthetic frames
/// - `image:<path>`, or a bare path with a known image extension
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceDescriptor {
    None,
    TestPattern { width: u32, height: u32, fps: u32 },
    ImageFile(PathBuf),
}

impl FromStr for SourceDescriptor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(SourceDescriptor::None);
        }
        if let Some(pattern) = trimmed.strip_prefix("pattern:") {
            return parse_pattern(pattern).ok_or_else(|| malformed(s));
        }
        if let Some(path) = trimmed.strip_prefix("image:") {
            if path.is_empty() {
                return Err(malformed(s));
            }
            return Ok(SourceDescriptor::ImageFile(PathBuf::from(path)));
        }
        if has_image_extension(Path::new(trimmed)) {
            return Ok(SourceDescriptor::ImageFile(PathBuf::from(trimmed)));
        }
        Err(malformed(s))
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::None => write!(f, "none"),
            SourceDescriptor::TestPattern { width, height, fps } => {
                write!(f, "pattern:{width}x{height}@{fps}")
            }
            SourceDescriptor::ImageFile(path) => write!(f, "image:{}", path.display()),
        }
    }
}

fn malformed(s: &str) -> ConfigError {
    ConfigError::MalformedDescriptor(s.to_string())
}

fn parse_pattern(pattern: &str) -> Option<SourceDescriptor> {
    let (size, fps) = match pattern.split_once('@') {
        Some((size, fps)) => (size, fps.parse::<u32>().ok()?),
        None => (pattern, DEFAULT_PATTERN_FPS),
    };
    let (w, h) = size.split_once(['x', 'X'])?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    if width == 0 || height == 0 || fps == 0 {
        return None;
    }
    Some(SourceDescriptor::TestPattern { width, height, fps })
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("none")]
    #[case("NONE")]
    #[case("")]
    #[case("   ")]
    fn test_parse_none(#[case] input: &str) {
        assert_eq!(input.parse::<SourceDescriptor>().unwrap(), SourceDescriptor::None);
    }

    #[rstest]
    #[case("pattern:640x480@15", 640, 480, 15)]
    #[case("pattern:320X240@60", 320, 240, 60)]
    #[case("pattern:64x48", 64, 48, DEFAULT_PATTERN_FPS)]
    fn test_parse_pattern(
        #[case] input: &str,
        #[case] width: u32,
        #[case] height: u32,
        #[case] fps: u32,
    ) {
        assert_eq!(
            input.parse::<SourceDescriptor>().unwrap(),
            SourceDescriptor::TestPattern { width, height, fps }
        );
    }

    #[rstest]
    #[case("image:/tmp/photo.png", "/tmp/photo.png")]
    #[case("image:frames/raw.bin", "frames/raw.bin")]
    #[case("/tmp/photo.JPG", "/tmp/photo.JPG")]
    #[case("shot.webp", "shot.webp")]
    fn test_parse_image(#[case] input: &str, #[case] path: &str) {
        assert_eq!(
            input.parse::<SourceDescriptor>().unwrap(),
            SourceDescriptor::ImageFile(PathBuf::from(path))
        );
    }

    #[rstest]
    #[case("camera:0")]
    #[case("pattern:")]
    #[case("pattern:640")]
    #[case("pattern:0x480")]
    #[case("pattern:640x480@0")]
    #[case("pattern:640x480@fast")]
    #[case("image:")]
    #[case("movie.mp4")]
    fn test_parse_malformed(#[case] input: &str) {
        assert!(matches!(
            input.parse::<SourceDescriptor>(),
            Err(ConfigError::MalformedDescriptor(_))
        ));
    }

    #[test]
    fn test_display_reparses() {
        let descriptor = SourceDescriptor::TestPattern {
            width: 8,
            height: 6,
            fps: 5,
        };
        assert_eq!(descriptor.to_string(), "pattern:8x6@5");
        assert_eq!(
            descriptor.to_string().parse::<SourceDescriptor>().unwrap(),
            descriptor
        );
    }
}
