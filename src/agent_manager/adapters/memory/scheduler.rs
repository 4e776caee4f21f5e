//! Retry scheduler that records delays.

use crate::agent_manager::ports::RetryScheduler;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Scheduler that logs every requested delay.
///
/// By default it resumes immediately. A [`Self::sleeping`] scheduler also
/// waits on the tokio timer, so retries interleave with supervision timers
/// under a paused test clock.
#[derive(Debug, Clone, Default)]
pub struct RecordingRetryScheduler {
    delays: Arc<Mutex<Vec<Duration>>>,
    sleeps: bool,
}

impl RecordingRetryScheduler {
    /// Creates a scheduler with an empty log that never waits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler that records and then sleeps for each delay.
    #[must_use]
    pub fn sleeping() -> Self {
        Self {
            sleeps: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Duration>> {
        self.delays.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns every requested delay, oldest first.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.lock().clone()
    }

    /// Returns how many delays were requested.
    #[must_use]
    pub fn delay_count(&self) -> usize {
        self.lock().len()
    }
}

#[async_trait]
impl RetryScheduler for RecordingRetryScheduler {
    async fn delay(&self, delay: Duration) {
        self.lock().push(delay);
        if self.sleeps {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}
