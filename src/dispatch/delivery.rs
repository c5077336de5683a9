//! # Run a single delivery of one posted event.
//!
//! A [`Delivery`] is the unit of work handed to a runner: one event plus the
//! snapshot of subscriptions taken at `post` time.
//!
//! - **Invoke handlers in snapshot order** on the runner's thread
//! - **Stop at the first failure** (error or panic); later handlers are skipped
//! - **Report** the outcome: stats, tracing, failure hook
//!
//! ## Flow
//! ```text
//! Success:
//!   h1(ev) → h2(ev) → ... → hN(ev) → completed += 1
//!
//! Failure at hK:
//!   h1(ev) → ... → hK(ev) = Err / panic
//!     → failed += 1
//!     → tracing::error!(event, handler, skipped)
//!     → hook.on_failure(&DeliveryFailure)   (panic-isolated)
//! ```

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, trace};

use crate::dispatch::registry::Subscription;
use crate::error::HandlerError;
use crate::events::EventType;
use crate::failure::{DeliveryFailure, FailureHook};

/// One event and the subscriptions it must reach.
pub(crate) struct Delivery {
    event: Arc<dyn Any + Send + Sync>,
    targets: Arc<[Subscription]>,
}

impl Delivery {
    pub(crate) fn new(event: Arc<dyn Any + Send + Sync>, targets: Arc<[Subscription]>) -> Self {
        Self { event, targets }
    }

    /// Event type as recorded by the registry (carries the readable name).
    pub(crate) fn event_type(&self) -> EventType {
        self.targets
            .first()
            .map(Subscription::event_type)
            .unwrap_or_else(|| EventType::of_val(self.event.as_ref()))
    }

    /// Invokes every target in order; returns the number of handlers that ran.
    pub(crate) fn run(&self) -> Result<usize, DeliveryFailure> {
        let event = self.event.as_ref();
        for (position, sub) in self.targets.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| sub.invoke(event)))
                .unwrap_or_else(|panic| Err(HandlerError::from_panic(panic.as_ref())));

            if let Err(error) = outcome {
                return Err(DeliveryFailure {
                    event_type: sub.event_type(),
                    handler: sub.handler_name().to_string(),
                    subscription: sub.id(),
                    position,
                    skipped: self.targets.len() - position - 1,
                    error,
                });
            }
        }
        Ok(self.targets.len())
    }
}

/// Lock-free delivery counters shared between a runner and its workers.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) submitted: AtomicU64,
    pub(crate) completed: AtomicU64,
    pub(crate) failed: AtomicU64,
    pub(crate) discarded: AtomicU64,
}

impl Counters {
    pub(crate) fn snapshot(&self) -> DispatcherStats {
        DispatcherStats {
            submitted: self.submitted.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            discarded: self.discarded.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time delivery counters of a dispatcher.
///
/// - `submitted`: deliveries accepted by the runner (posts with at least one subscriber)
/// - `completed`: deliveries where every handler returned normally
/// - `failed`: deliveries aborted by a failing handler
/// - `discarded`: accepted deliveries dropped by `shutdown_now` before they started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Deliveries accepted by the runner.
    pub submitted: u64,
    /// Deliveries that reached every handler.
    pub completed: u64,
    /// Deliveries aborted by a handler failure.
    pub failed: u64,
    /// Deliveries dropped before starting.
    pub discarded: u64,
}

impl DispatcherStats {
    /// Deliveries accepted but not yet finished (or discarded).
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.completed + self.failed + self.discarded)
    }
}

/// Outcome reporting shared by every worker of a runner.
pub(crate) struct Reporter {
    pub(crate) counters: Counters,
    hook: Option<Arc<dyn FailureHook>>,
}

impl Reporter {
    pub(crate) fn new(hook: Option<Arc<dyn FailureHook>>) -> Self {
        Self {
            counters: Counters::default(),
            hook,
        }
    }

    /// Runs `delivery` and records its outcome.
    pub(crate) fn execute(&self, delivery: Delivery) {
        match delivery.run() {
            Ok(handlers) => {
                self.counters.completed.fetch_add(1, Ordering::AcqRel);
                trace!(event_type = %delivery.event_type(), handlers, "delivered");
            }
            Err(failure) => {
                self.counters.failed.fetch_add(1, Ordering::AcqRel);
                error!(
                    event_type = %failure.event_type,
                    handler = %failure.handler,
                    position = failure.position,
                    skipped = failure.skipped,
                    label = failure.error.as_label(),
                    "delivery aborted: {}",
                    failure.error
                );
                self.report(&failure);
            }
        }
    }

    /// Records a delivery dropped before it started.
    pub(crate) fn discard(&self, delivery: Delivery) {
        self.counters.discarded.fetch_add(1, Ordering::AcqRel);
        trace!(event_type = %delivery.event_type(), "delivery discarded");
    }

    fn report(&self, failure: &DeliveryFailure) {
        let Some(hook) = &self.hook else {
            return;
        };
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| hook.on_failure(failure))) {
            error!(
                hook = hook.name(),
                info = %HandlerError::from_panic(panic.as_ref()).as_message(),
                "failure hook panicked"
            );
        }
    }
}
