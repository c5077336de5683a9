//! # PoolRunner: elastic pool, one task per delivery.
//!
//! Every accepted delivery becomes its own tracked task. The handlers run on
//! Tokio's blocking pool, which grows and shrinks with demand; an optional
//! semaphore caps how many deliveries run at once.
//!
//! ## Diagram
//! ```text
//!    submit(Delivery)
//!        │
//!        ├──► task 1 ─► [permit] ─► spawn_blocking ─► Reporter::execute
//!        ├──► task 2 ─► [permit] ─► spawn_blocking ─► Reporter::execute
//!        └──► task N ─► [waits for permit] ...
//!                            │
//!             abort cancelled? ─► Reporter::discard
//! ```
//!
//! ## Rules
//! - **No cross-delivery ordering**: deliveries of different posts may interleave
//! - **Intra-delivery ordering**: one delivery's handlers run sequentially in one task
//! - **Isolation**: a failing delivery only affects itself

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use super::runner::{TaskRunner, wait_drained};
use crate::dispatch::{Delivery, DispatcherStats, Reporter};
use crate::error::DispatchError;

/// Multi-worker runner for [`Mode::Async`](crate::Mode::Async).
pub(crate) struct PoolRunner {
    /// Guards the open → closed transition against concurrent `submit`.
    open: RwLock<bool>,
    tracker: TaskTracker,
    abort: CancellationToken,
    limit: Option<Arc<Semaphore>>,
    runtime: Handle,
    reporter: Arc<Reporter>,
}

impl PoolRunner {
    /// Creates the runner; `max_workers` caps concurrent deliveries.
    pub(crate) fn new(reporter: Arc<Reporter>, runtime: Handle, max_workers: Option<usize>) -> Self {
        Self {
            open: RwLock::new(true),
            tracker: TaskTracker::new(),
            abort: CancellationToken::new(),
            limit: max_workers.map(|n| Arc::new(Semaphore::new(n))),
            runtime,
            reporter,
        }
    }
}

/// Waits for a permit (if capped), then runs the delivery on the blocking pool.
async fn run_pooled(
    delivery: Delivery,
    abort: CancellationToken,
    limit: Option<Arc<Semaphore>>,
    reporter: Arc<Reporter>,
) {
    let _permit = match limit {
        Some(sem) => tokio::select! {
            biased;
            _ = abort.cancelled() => None,
            permit = sem.acquire_owned() => permit.ok(),
        },
        None => None,
    };

    if abort.is_cancelled() {
        reporter.discard(delivery);
        return;
    }

    let worker = Arc::clone(&reporter);
    if let Err(e) = tokio::task::spawn_blocking(move || worker.execute(delivery)).await {
        error!(error = %e, "pool worker did not finish");
    }
}

#[async_trait]
impl TaskRunner for PoolRunner {
    fn submit(&self, delivery: Delivery) -> Result<(), DispatchError> {
        let open = self.open.read();
        if !*open {
            return Err(DispatchError::Closed { operation: "post" });
        }

        self.reporter.counters.submitted.fetch_add(1, Ordering::AcqRel);
        self.tracker.spawn_on(
            run_pooled(
                delivery,
                self.abort.clone(),
                self.limit.clone(),
                Arc::clone(&self.reporter),
            ),
            &self.runtime,
        );
        Ok(())
    }

    fn shutdown(&self) {
        let mut open = self.open.write();
        if *open {
            *open = false;
            self.tracker.close();
            info!(runner = self.name(), in_flight = self.tracker.len(), "shutting down");
        }
    }

    fn shutdown_now(&self) {
        self.shutdown();
        if !self.abort.is_cancelled() {
            self.abort.cancel();
            info!(runner = self.name(), "discarding pending deliveries");
        }
    }

    fn is_shutdown(&self) -> bool {
        self.tracker.is_closed()
    }

    fn is_terminated(&self) -> bool {
        self.tracker.is_closed() && self.tracker.is_empty()
    }

    async fn await_termination(&self, timeout: Option<Duration>) -> bool {
        wait_drained(&self.tracker, timeout).await
    }

    fn stats(&self) -> DispatcherStats {
        self.reporter.counters.snapshot()
    }

    fn name(&self) -> &'static str {
        "pool"
    }
}
