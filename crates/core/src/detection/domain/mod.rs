pub mod detection;
pub mod detection_unit;
pub mod execution_device;
pub mod object_kind;
