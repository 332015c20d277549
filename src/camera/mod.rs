//! Camera device boundary: live preview pipeline and single-shot grabs.

pub mod pipeline;

pub use pipeline::{pull_frame, CameraPipeline, PipelineError};
