//! # Execution substrates for deliveries.
//!
//! A dispatcher owns exactly one runner, picked from its [`Mode`](crate::Mode)
//! at construction and never switched.
//!
//! ## Architecture
//! ```text
//! Dispatcher::post ─► Registry snapshot ─► Delivery ─► TaskRunner::submit
//!                                                          │
//!                                     ┌────────────────────┴───────────────────┐
//!                                     ▼                                        ▼
//!                              SerialRunner (Sync)                      PoolRunner (Async)
//!                         one worker, FIFO queue                one tracked task per delivery
//! ```

mod pool;
mod runner;
mod serial;

pub(crate) use pool::PoolRunner;
pub(crate) use runner::TaskRunner;
pub(crate) use serial::SerialRunner;
