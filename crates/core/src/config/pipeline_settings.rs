use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::config_error::ConfigError;
use crate::detection::domain::object_kind::ObjectKind;
use crate::pipeline::pipeline_controller::ControllerConfig;

/// Persisted pipeline configuration, stored as JSON.
///
/// Every field is optional; missing fields fall back to the defaults (unit's
/// default device, every category accepted, no source).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    pub device_index: Option<usize>,
    pub categories: Option<Vec<ObjectKind>>,
    pub source: Option<String>,
}

impl PipelineSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self =
            serde_json::from_str(&text).map_err(|source| ConfigError::SettingsParse {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            device_index: self.device_index,
            categories: self.categories.clone(),
        }
    }
}

/// Parses a comma separated list of category labels, e.g. `"person, car"`.
///
/// `all` selects every selectable kind; an empty string selects none.
pub fn parse_categories(list: &str) -> Result<Vec<ObjectKind>, ConfigError> {
    let list = list.trim();
    if list.eq_ignore_ascii_case("all") {
        return Ok(ObjectKind::selectable().collect());
    }
    list.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| {
            label
                .parse::<ObjectKind>()
                .map_err(|_| ConfigError::UnknownCategory(label.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_settings() {
        let file = write_settings(
            r#"{"device_index": 1, "categories": ["person", "traffic_light"], "source": "pattern:64x48@10"}"#,
        );

        let settings = PipelineSettings::load(file.path()).unwrap();

        assert_eq!(settings.device_index, Some(1));
        assert_eq!(
            settings.categories,
            Some(vec![ObjectKind::Person, ObjectKind::TrafficLight])
        );
        assert_eq!(settings.source.as_deref(), Some("pattern:64x48@10"));
    }

    #[test]
    fn test_load_empty_object_uses_defaults() {
        let file = write_settings("{}");
        assert_eq!(
            PipelineSettings::load(file.path()).unwrap(),
            PipelineSettings::default()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = PipelineSettings::load(Path::new("/nonexistent/settings.json"));
        assert!(matches!(result, Err(ConfigError::SettingsRead { .. })));
    }

    #[test]
    fn test_load_malformed_json() {
        let file = write_settings("{\"device_index\": ");
        assert!(matches!(
            PipelineSettings::load(file.path()),
            Err(ConfigError::SettingsParse { .. })
        ));
    }

    #[test]
    fn test_load_unknown_category() {
        let file = write_settings(r#"{"categories": ["unicorn"]}"#);
        assert!(matches!(
            PipelineSettings::load(file.path()),
            Err(ConfigError::SettingsParse { .. })
        ));
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let file = write_settings(r#"{"device": 0}"#);
        assert!(PipelineSettings::load(file.path()).is_err());
    }

    #[test]
    fn test_controller_config() {
        let settings = PipelineSettings {
            device_index: Some(2),
            categories: Some(vec![ObjectKind::Dog]),
            source: None,
        };
        let config = settings.controller_config();
        assert_eq!(config.device_index, Some(2));
        assert_eq!(config.categories, Some(vec![ObjectKind::Dog]));
    }

    #[test]
    fn test_parse_categories() {
        assert_eq!(
            parse_categories("person, Traffic Light,car").unwrap(),
            vec![ObjectKind::Person, ObjectKind::TrafficLight, ObjectKind::Car]
        );
        assert!(parse_categories("").unwrap().is_empty());
        assert_eq!(
            parse_categories("ALL").unwrap().len(),
            ObjectKind::selectable_count()
        );
    }

    #[test]
    fn test_parse_categories_unknown_label() {
        assert!(matches!(
            parse_categories("person,unicorn"),
            Err(ConfigError::UnknownCategory(label)) if label == "unicorn"
        ));
    }
}
