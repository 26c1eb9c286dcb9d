pub mod domain;
pub mod frame_source_factory;
pub mod infrastructure;
pub mod source_lifecycle;
