//! # SerialRunner: one dedicated worker, strict FIFO.
//!
//! Deliveries are queued on an unbounded channel and executed one at a time by
//! a single worker thread taken from Tokio's blocking pool.
//!
//! ## Diagram
//! ```text
//!   post ─► submit(Delivery) ─► [unbounded queue] ─► worker ─► Reporter::execute
//!                                                        │
//!                                     abort cancelled? ──┴─► Reporter::discard
//! ```
//!
//! ## Rules
//! - Deliveries run in submission order, never concurrently
//! - `shutdown` drops the sender; the worker drains the queue and exits
//! - `shutdown_now` additionally flips the abort token; the worker discards
//!   whatever is still queued

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use super::runner::{TaskRunner, wait_drained};
use crate::dispatch::{Delivery, DispatcherStats, Reporter};
use crate::error::DispatchError;

/// Single-worker runner for [`Mode::Sync`](crate::Mode::Sync).
pub(crate) struct SerialRunner {
    queue: Mutex<Option<mpsc::UnboundedSender<Delivery>>>,
    tracker: TaskTracker,
    abort: CancellationToken,
    reporter: Arc<Reporter>,
}

impl SerialRunner {
    /// Creates the runner and starts its worker on `runtime`.
    pub(crate) fn new(reporter: Arc<Reporter>, runtime: &Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = TaskTracker::new();
        let abort = CancellationToken::new();

        let worker_abort = abort.clone();
        let worker_reporter = Arc::clone(&reporter);
        tracker.spawn_blocking_on(move || drain(rx, worker_abort, worker_reporter), runtime);

        Self {
            queue: Mutex::new(Some(tx)),
            tracker,
            abort,
            reporter,
        }
    }
}

/// Worker loop: runs until the queue is closed and empty.
fn drain(
    mut rx: mpsc::UnboundedReceiver<Delivery>,
    abort: CancellationToken,
    reporter: Arc<Reporter>,
) {
    while let Some(delivery) = rx.blocking_recv() {
        if abort.is_cancelled() {
            reporter.discard(delivery);
        } else {
            reporter.execute(delivery);
        }
    }
    debug!("serial worker stopped");
}

#[async_trait]
impl TaskRunner for SerialRunner {
    fn submit(&self, delivery: Delivery) -> Result<(), DispatchError> {
        let queue = self.queue.lock();
        let Some(tx) = queue.as_ref() else {
            return Err(DispatchError::Closed { operation: "post" });
        };

        let counters = &self.reporter.counters;
        counters.submitted.fetch_add(1, Ordering::AcqRel);
        if tx.send(delivery).is_err() {
            counters.submitted.fetch_sub(1, Ordering::AcqRel);
            return Err(DispatchError::Closed { operation: "post" });
        }
        Ok(())
    }

    fn shutdown(&self) {
        if self.queue.lock().take().is_some() {
            self.tracker.close();
            info!(runner = self.name(), "shutting down");
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
        "serial"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Registry;
    use crate::events::EventType;
    use crate::handlers::Handler;
    use std::sync::Mutex as StdMutex;
    use std::sync::mpsc as std_mpsc;

    fn delivery(reg: &Registry, n: u32) -> Delivery {
        Delivery::new(Arc::new(n), reg.snapshot_for(EventType::of::<u32>()))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_runs_in_submission_order() {
        let reg = Registry::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        reg.add(Handler::new(move |n: &u32| sink.lock().unwrap().push(*n)))
            .unwrap();

        let runner = SerialRunner::new(Arc::new(Reporter::new(None)), &Handle::current());
        for n in 0..100 {
            runner.submit(delivery(&reg, n)).unwrap();
        }
        runner.shutdown();
        assert!(runner.await_termination(Some(Duration::from_secs(5))).await);

        assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
        assert_eq!(runner.stats().completed, 100);
        assert!(runner.is_terminated());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejects_after_shutdown() {
        let reg = Registry::new();
        reg.add(Handler::new(|_: &u32| {})).unwrap();
        let runner = SerialRunner::new(Arc::new(Reporter::new(None)), &Handle::current());

        assert!(!runner.is_shutdown());
        runner.shutdown();
        assert!(runner.is_shutdown());
        assert_eq!(
            runner.submit(delivery(&reg, 1)),
            Err(DispatchError::Closed { operation: "post" })
        );
        assert_eq!(runner.stats().submitted, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_await_without_shutdown_times_out() {
        let runner = SerialRunner::new(Arc::new(Reporter::new(None)), &Handle::current());
        assert!(!runner.await_termination(Some(Duration::from_millis(20))).await);
        assert!(!runner.is_terminated());
        runner.shutdown();
        assert!(runner.await_termination(Some(Duration::from_secs(5))).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_now_discards_queued() {
        let reg = Registry::new();
        let (started_tx, started_rx) = std_mpsc::channel::<()>();
        let (release_tx, release_rx) = std_mpsc::channel::<()>();
        let started_tx = StdMutex::new(started_tx);
        let release_rx = StdMutex::new(release_rx);
        reg.add(Handler::new(move |_: &u32| {
            let _ = started_tx.lock().unwrap().send(());
            let _ = release_rx.lock().unwrap().recv();
        }))
        .unwrap();

        let runner = SerialRunner::new(Arc::new(Reporter::new(None)), &Handle::current());
        for n in 0..3 {
            runner.submit(delivery(&reg, n)).unwrap();
        }
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("first delivery started");

        runner.shutdown_now();
        release_tx.send(()).unwrap();
        assert!(runner.await_termination(Some(Duration::from_secs(5))).await);

        let stats = runner.stats();
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.discarded, 2);
        assert_eq!(stats.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_does_not_stop_worker() {
        let reg = Registry::new();
        reg.add(Handler::fallible(|n: &u32| {
            if *n % 2 == 0 { Err("even") } else { Ok(()) }
        }))
        .unwrap();

        let runner = SerialRunner::new(Arc::new(Reporter::new(None)), &Handle::current());
        for n in 0..6 {
            runner.submit(delivery(&reg, n)).unwrap();
        }
        runner.shutdown();
        assert!(runner.await_termination(None).await);

        let stats = runner.stats();
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.completed, 3);
    }
}
