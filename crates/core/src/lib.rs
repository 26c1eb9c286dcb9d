//! Real-time frame-to-detection pipeline.
//!
//! Frames from a [`source`] are offered to the
//! [`PipelineController`](pipeline::pipeline_controller::PipelineController),
//! which admits at most one at a time, runs it through the detection unit,
//! filters the results and hands them to a presentation sink.

pub mod config;
pub mod detection;
pub mod pipeline;
pub mod presentation;
pub mod shared;
pub mod source;
