//! Pipeline drivers behind the `cav-sim` command line tool.

pub mod batch;
pub mod config;
pub mod pipeline;

pub use batch::{case_labels, run_batch, BatchEntry, BatchIndex, CaseFiles, CaseStatus};
pub use config::{load_config, PipelineConfig};
