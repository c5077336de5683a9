//! # Reporting of aborted deliveries.
//!
//! A delivery stops at the first handler that fails. The failure is logged,
//! counted in [`DispatcherStats`](crate::DispatcherStats) and handed to the
//! optional [`FailureHook`] configured on the dispatcher.
//!
//! ## Contract
//! - The hook runs on the delivery thread, right after the failing handler.
//! - A panicking hook is caught and logged; it never stops the runner.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use typebus::{DeliveryFailure, FailureHook};
//!
//! struct Alert;
//!
//! impl FailureHook for Alert {
//!     fn on_failure(&self, failure: &DeliveryFailure) {
//!         eprintln!("{} failed on {}: {}", failure.handler, failure.event_type, failure.error);
//!     }
//! }
//!
//! let hook: Arc<dyn FailureHook> = Arc::new(Alert);
//! # let _ = hook;
//! ```

use uuid::Uuid;

use crate::error::HandlerError;
use crate::events::EventType;

/// Details of one aborted delivery.
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    /// Event type that was being delivered.
    pub event_type: EventType,
    /// Name of the failing handler.
    pub handler: String,
    /// Subscription id of the failing handler.
    pub subscription: Uuid,
    /// Zero-based position of the failing handler in the delivery order.
    pub position: usize,
    /// Number of handlers that did not receive the event because of the failure.
    pub skipped: usize,
    /// What went wrong.
    pub error: HandlerError,
}

/// Callback for aborted deliveries.
pub trait FailureHook: Send + Sync + 'static {
    /// Called once per aborted delivery.
    fn on_failure(&self, failure: &DeliveryFailure);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> FailureHook for F
where
    F: Fn(&DeliveryFailure) + Send + Sync + 'static,
{
    fn on_failure(&self, failure: &DeliveryFailure) {
        self(failure)
    }
}
