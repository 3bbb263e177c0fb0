//! Mock pipeline service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::pipeline::{JobHandle, JobRequest, PipelineError, PipelineService};

/// A recorded submission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub request: JobRequest,
    pub success: bool,
}

/// Mock implementation of the PipelineService trait.
///
/// Acknowledges every request immediately with a handle carrying the
/// requested job id. Submissions for a given customer name can be made to
/// fail once, and every submission can be slowed down by a fixed delay.
#[derive(Debug)]
pub struct MockPipelineService {
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    /// Customer names whose next submission fails.
    failures: Arc<RwLock<HashMap<String, PipelineError>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockPipelineService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPipelineService {
    pub fn new() -> Self {
        Self {
            submissions: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded submissions.
    pub async fn recorded_submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    /// Get the number of successful submissions.
    pub async fn submission_count(&self) -> usize {
        self.submissions
            .read()
            .await
            .iter()
            .filter(|s| s.success)
            .count()
    }

    /// Make the next submission for `customer_name` fail with `error`.
    pub async fn fail_customer(&self, customer_name: impl Into<String>, error: PipelineError) {
        self.failures
            .write()
            .await
            .insert(customer_name.into(), error);
    }

    /// Wait `delay` before acknowledging each submission.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }
}

#[async_trait]
impl PipelineService for MockPipelineService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, request: JobRequest) -> Result<JobHandle, PipelineError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let customer = request
            .parameter("customer_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if let Some(err) = self.failures.write().await.remove(&customer) {
            self.submissions.write().await.push(RecordedSubmission {
                request,
                success: false,
            });
            return Err(err);
        }

        let handle = JobHandle {
            job_id: request.job_id.clone(),
            resource_name: format!(
                "projects/mock/locations/mock/pipelineJobs/{}",
                request.job_id
            ),
            display_name: request.display_name.clone(),
        };

        self.submissions.write().await.push(RecordedSubmission {
            request,
            success: true,
        });

        Ok(handle)
    }
}
