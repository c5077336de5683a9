//! # typebus
//!
//! **typebus** is an in-process publish/subscribe dispatcher for Rust.
//!
//! Producers post typed events; consumers subscribe typed handlers; the
//! dispatcher routes each event to every handler registered for its exact
//! concrete type, either on one dedicated worker (`Mode::Sync`) or on an
//! elastic worker pool (`Mode::Async`).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   subscribe(Handler<E>)          post(event: E)               unsubscribe(&Token)
//!          │                              │                              │
//!          ▼                              ▼                              ▼
//! ┌───────────────────────────────────────────────────────────────────────────────┐
//! │  Dispatcher                                                                   │
//! │  - Registry  (Mutex<HashMap<EventType, Arc<[Subscription]>>>, copy-on-write)  │
//! │  - TaskRunner (selected once from Mode)                                       │
//! └──────────────────────────────────────┬────────────────────────────────────────┘
//!                                        │ snapshot non-empty → one Delivery
//!                      ┌─────────────────┴─────────────────┐
//!                      ▼                                   ▼
//!            ┌──────────────────┐                ┌──────────────────┐
//!            │   SerialRunner   │                │    PoolRunner    │
//!            │ (FIFO, 1 worker) │                │ (task/delivery)  │
//!            └────────┬─────────┘                └────────┬─────────┘
//!                     ▼                                   ▼
//!            h1(&ev) → h2(&ev) → ... → hN(&ev)   (snapshot order; stops at first failure)
//!                                   │
//!                                   └─► failure → tracing::error! + FailureHook
//! ```
//!
//! ### Lifecycle
//! ```text
//! Running ──shutdown()──► ShuttingDown ──queue drained──► Terminated
//!    │                          │
//!    └──shutdown_now()──────────┴─► queued deliveries discarded
//!
//! post / subscribe after shutdown → DispatchError::Closed
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                        |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Dispatch**      | Type-routed posting, serial or pooled delivery, drain/shutdown.| [`Dispatcher`], [`Mode`], [`State`]       |
//! | **Handlers**      | Identity-comparable closure wrappers.                         | [`Handler`]                               |
//! | **Membership**    | Ordered per-type subscriptions with stable snapshots.         | [`Registry`], [`Subscription`], [`Token`] |
//! | **Failures**      | Aborted-delivery reporting.                                   | [`FailureHook`], [`DeliveryFailure`]      |
//! | **Errors**        | Typed errors for callers and handlers.                        | [`DispatchError`], [`HandlerError`]       |
//! | **Configuration** | Centralize runtime settings.                                  | [`Config`], [`DispatcherBuilder`]         |
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use typebus::{Dispatcher, Handler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Dispatcher::new_async();
//!
//!     let words = Arc::new(Mutex::new(Vec::new()));
//!     let sink = Arc::clone(&words);
//!     bus.subscribe(Handler::new(move |s: &String| sink.lock().unwrap().push(s.clone())))?;
//!     bus.subscribe(Handler::new(|n: &i32| println!("number {n}")))?;
//!
//!     bus.post(String::from("hello"))?;
//!     bus.post(5i32)?;
//!
//!     bus.shutdown_and_await_termination().await?;
//!     assert_eq!(*words.lock().unwrap(), vec!["hello".to_string()]);
//!     Ok(())
//! }
//! ```
mod config;
mod dispatch;
mod error;
mod events;
mod failure;
mod handlers;
mod runners;

// ---- Public re-exports ----

pub use config::{Config, Mode};
pub use dispatch::{Dispatcher, DispatcherBuilder, DispatcherStats, Registry, State, Subscription, Token};
pub use error::{DispatchError, HandlerError};
pub use events::EventType;
pub use failure::{DeliveryFailure, FailureHook};
pub use handlers::Handler;
