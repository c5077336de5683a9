//! Dispatch internals: registry, deliveries and lifecycle.
//!
//! Internal modules:
//! - [`registry`]: subscription membership keyed by event type;
//! - [`delivery`]: runs one posted event through its snapshot and reports the outcome;
//! - [`dispatcher`]: public API, routing and lifecycle;
//! - [`builder`]: dispatcher construction;
//! - [`shutdown`]: interruption of the termination wait.

mod builder;
mod delivery;
mod dispatcher;
mod registry;
mod shutdown;

pub use builder::DispatcherBuilder;
pub use delivery::DispatcherStats;
pub use dispatcher::{Dispatcher, State};
pub use registry::{Registry, Subscription, Token};

pub(crate) use delivery::{Delivery, Reporter};
