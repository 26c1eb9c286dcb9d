pub mod image_file_source;
pub mod test_pattern_source;
