pub mod config;
pub mod conflict;
pub mod copy;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod scan;
pub mod task;

pub use config::{EncodeConfig, FailurePolicy, DEFAULT_BITRATE, MAX_BITRATE, MIN_BITRATE};
pub use encode::EncodeSummary;
pub use error::{ConflictReport, PipelineError, Result};
pub use pipeline::{run_build, run_post_build};
pub use task::EncodeTask;
