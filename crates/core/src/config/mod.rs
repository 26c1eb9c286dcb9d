pub mod config_error;
pub mod pipeline_settings;
