//! Managed pipeline submission.
//!
//! A `PipelineService` accepts a fully built `JobRequest` and returns a
//! `JobHandle` as soon as the platform acknowledges the job. Runs are never
//! awaited; the handle is only used to build a monitoring link.

mod error;
mod template;
mod traits;
mod types;
mod vertex;

pub use error::PipelineError;
pub use template::{pipeline_spec_from_template, set_enable_caching, TemplateSource};
pub use traits::PipelineService;
pub use types::{JobHandle, JobRequest};
pub use vertex::VertexPipelineClient;
