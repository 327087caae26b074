pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod transform;
pub mod types;

pub use config::Config;
pub use error::{EtlError, Result};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineResult};
pub use types::{BatchOutcome, Dataset, EmptyReason, RawRecord, TypedRecord};
