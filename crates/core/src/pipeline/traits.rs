use async_trait::async_trait;

use super::{JobHandle, JobRequest, PipelineError};

/// A service that runs templated pipelines out of process.
#[async_trait]
pub trait PipelineService: Send + Sync {
    /// Returns the name of this service implementation.
    fn name(&self) -> &str;

    /// Submits the job and returns once creation is acknowledged.
    async fn submit(&self, request: JobRequest) -> Result<JobHandle, PipelineError>;
}
