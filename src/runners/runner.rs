//! # Core runner trait
//!
//! `TaskRunner` is the execution substrate behind a dispatcher: something that
//! runs deliveries. Two implementations exist and one is picked per [`Mode`](crate::Mode):
//!
//! - [`SerialRunner`](super::SerialRunner): one dedicated worker, FIFO
//! - [`PoolRunner`](super::PoolRunner): elastic pool, one task per delivery
//!
//! ## Contract
//! - `submit` never blocks and never runs the delivery on the caller's thread.
//! - After `shutdown`, `submit` is rejected; accepted deliveries still run.
//! - After `shutdown_now`, accepted deliveries that have not started are discarded.
//! - A failing delivery never stops the runner.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::task::TaskTracker;

use crate::dispatch::{Delivery, DispatcherStats};
use crate::error::DispatchError;

/// Contract for delivery execution substrates.
#[async_trait]
pub(crate) trait TaskRunner: Send + Sync + 'static {
    /// Queues a delivery for execution.
    fn submit(&self, delivery: Delivery) -> Result<(), DispatchError>;

    /// Stops accepting deliveries; accepted ones still run.
    fn shutdown(&self);

    /// Stops accepting deliveries and discards the ones that have not started.
    fn shutdown_now(&self);

    /// True once `shutdown` (or `shutdown_now`) was called.
    fn is_shutdown(&self) -> bool;

    /// True once shut down and every accepted delivery finished.
    fn is_terminated(&self) -> bool;

    /// Waits until terminated or until `timeout` elapses (`None` = no limit).
    ///
    /// Returns whether the runner terminated.
    async fn await_termination(&self, timeout: Option<Duration>) -> bool;

    /// Delivery counters.
    fn stats(&self) -> DispatcherStats;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str;
}

/// Waits for a closed tracker to run empty, bounded by `timeout`.
pub(super) async fn wait_drained(tracker: &TaskTracker, timeout: Option<Duration>) -> bool {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, tracker.wait()).await.is_ok(),
        None => {
            tracker.wait().await;
            true
        }
    }
}
