pub mod execution_slot;
pub mod metrics_recorder;
pub mod pipeline_controller;
pub mod pipeline_error;
pub mod pipeline_stats;
pub mod presentation_sink;
pub mod result_filter;
