//! Pause between cycles.

use std::time::Duration;

use async_trait::async_trait;

/// Suspends the cycle loop between iterations.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits for `duration` before the next cycle starts.
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
