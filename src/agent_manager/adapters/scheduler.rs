//! Timer-backed retry scheduler.

use crate::agent_manager::ports::RetryScheduler;
use async_trait::async_trait;
use std::time::Duration;

/// Retry scheduler that sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRetryScheduler;

impl TokioRetryScheduler {
    /// Creates a scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RetryScheduler for TokioRetryScheduler {
    async fn delay(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
