//! Request-scoped context: the correlation id used to tag log events and the
//! deadline every blocking call must honour.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("request deadline exceeded")]
pub struct DeadlineExceeded;

#[derive(Clone, Debug)]
pub struct RequestContext {
    correlation_id: String,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into(), deadline: None }
    }

    /// Context with a freshly generated correlation id.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Narrows the deadline to `now + timeout`. An earlier deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Drives `operation` to completion unless the deadline passes first. An
    /// already expired context never polls `operation`.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, DeadlineExceeded>
    where
        F: Future<Output = T>,
    {
        if self.is_expired() {
            return Err(DeadlineExceeded);
        }

        match self.deadline {
            Some(deadline) => {
                tokio::time::timeout_at(deadline, operation).await.map_err(|_| DeadlineExceeded)
            }
            None => Ok(operation.await),
        }
    }
}
