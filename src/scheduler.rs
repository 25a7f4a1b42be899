//! Injectable timer used by the status poller.
//!
//! Production code sleeps on the tokio timer; tests swap in a scheduler that
//! advances a virtual clock instead of waiting on wall-clock time.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Suspend until `duration` has elapsed on this scheduler's clock.
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock scheduler backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
