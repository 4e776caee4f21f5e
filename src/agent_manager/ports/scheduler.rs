//! Delay port used to space out retries.

use async_trait::async_trait;
use std::time::Duration;

/// Waits out a backoff interval before an operation is reattempted.
#[async_trait]
pub trait RetryScheduler: Send + Sync {
    /// Completes once `delay` has elapsed.
    async fn delay(&self, delay: Duration);
}
