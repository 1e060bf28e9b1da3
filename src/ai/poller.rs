//! Create → poll → resolve orchestration for long-running generation jobs.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::config::PollPolicy;
use crate::core::models::{GenerationTask, TaskHandle, TaskStatus};
use crate::errors::StudioError;

/// Remote API that accepts jobs and reports their progress.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    type Job: Send + Sync;

    /// Submits `job` and returns the server-assigned handle.
    async fn submit(&self, job: &Self::Job) -> Result<TaskHandle, StudioError>;

    /// Fetches the current state of a submitted task.
    async fn check(&self, handle: &TaskHandle) -> Result<GenerationTask, StudioError>;
}

/// Drives a [`TaskBackend`] until the task reaches a terminal state.
#[derive(Debug, Clone)]
pub struct TaskPoller<B> {
    backend: B,
    policy: PollPolicy,
}

impl<B: TaskBackend> TaskPoller<B> {
    #[must_use]
    pub const fn new(backend: B, policy: PollPolicy) -> Self {
        Self { backend, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// # Errors
    ///
    /// Propagates the backend's submission failure.
    pub async fn submit(&self, job: &B::Job) -> Result<TaskHandle, StudioError> {
        let handle = self.backend.submit(job).await?;
        info!(task_id = %handle.task_id, "Generation task created");
        Ok(handle)
    }

    /// Polls until the task resolves, the attempt budget runs out, or
    /// `cancel` fires.
    ///
    /// Each attempt sleeps `policy.interval` first. A failed status check
    /// consumes the attempt but does not stop the loop.
    ///
    /// # Errors
    ///
    /// - `TaskFailed` when the remote side reports failure, or success
    ///   without an output URL
    /// - `TaskTimedOut` when `policy.max_attempts` checks pass without a
    ///   terminal state
    /// - `Cancelled` when `cancel` is triggered
    #[tracing::instrument(level = "info", skip(self, cancel), fields(task_id = %handle.task_id))]
    pub async fn await_completion(
        &self,
        handle: &TaskHandle,
        cancel: &CancellationToken,
    ) -> Result<String, StudioError> {
        for attempt in 1..=self.policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(StudioError::Cancelled);
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(StudioError::Cancelled),
                () = tokio::time::sleep(self.policy.interval) => {}
            }

            let checked = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(StudioError::Cancelled),
                result = self.backend.check(handle) => result,
            };

            let task = match checked {
                Ok(task) => task,
                Err(e) => {
                    warn!(attempt, error = %e, "Status check failed; will retry");
                    continue;
                }
            };

            debug!(attempt, status = ?task.status, "Task status");
            match task.status {
                TaskStatus::Succeeded => {
                    return match task.result_url() {
                        Some(url) => {
                            info!(attempt, "Generation task succeeded");
                            Ok(url.to_string())
                        }
                        None => Err(StudioError::TaskFailed(
                            "task succeeded without an output URL".to_string(),
                        )),
                    };
                }
                TaskStatus::Failed => {
                    warn!(attempt, failure = ?task.failure, "Generation task failed");
                    return Err(StudioError::TaskFailed(
                        task.failure
                            .unwrap_or_else(|| "remote task reported FAILED".to_string()),
                    ));
                }
                TaskStatus::Pending | TaskStatus::Running | TaskStatus::Unknown => {}
            }
        }

        warn!(attempts = self.policy.max_attempts, "Generation task timed out");
        Err(StudioError::TaskTimedOut {
            attempts: self.policy.max_attempts,
        })
    }

    /// Submits `job` and waits for its result URL.
    ///
    /// # Errors
    ///
    /// Any error from [`TaskPoller::submit`] or [`TaskPoller::await_completion`].
    pub async fn run(&self, job: &B::Job, cancel: &CancellationToken) -> Result<String, StudioError> {
        if cancel.is_cancelled() {
            return Err(StudioError::Cancelled);
        }
        let handle = self.submit(job).await?;
        self.await_completion(&handle, cancel).await
    }
}
