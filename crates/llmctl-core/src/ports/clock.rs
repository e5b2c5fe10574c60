//! Clock port so retry delays can be simulated in tests.

use std::time::Duration;

use async_trait::async_trait;

/// Source of delays for retry and backoff logic.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
