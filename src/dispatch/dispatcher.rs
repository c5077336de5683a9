//! # Dispatcher: type-routed delivery of events to subscribed handlers.
//!
//! The [`Dispatcher`] owns a [`Registry`] of subscriptions and one execution
//! substrate (runner) selected by its [`Mode`]. It is the public face of the crate.
//!
//! ## Key responsibilities
//! - subscribe/unsubscribe handlers through the [`Registry`]
//! - translate `post(event)` into a registry snapshot plus **one** delivery task
//! - drive the lifecycle `Running → ShuttingDown → Terminated`
//!
//! ## High-level architecture
//! ```text
//! subscribe(Handler<E>) ──► Registry::add          (EventType::of::<E>())
//! unsubscribe(&Token)   ──► Registry::remove
//!
//! post(event)
//!   ├─ shut down?        → Err(Closed)
//!   ├─ snapshot_for(ty)  → empty? → Ok(())         (runner untouched)
//!   └─ runner.submit(Delivery{event, snapshot})
//!           │
//!           ├─ Mode::Sync  → SerialRunner: [queue] ─► single worker
//!           └─ Mode::Async → PoolRunner:   task per delivery ─► blocking pool
//!
//! Shutdown path:
//!   shutdown()                        → runner refuses new deliveries, queue drains
//!   await_termination(timeout)        → true once drained
//!   shutdown_and_await_termination()  → shutdown + wait without limit
//!       ├─ waiting future dropped     → shutdown_now()
//!       └─ OS signal (opt-in)         → shutdown_now(), Err(Interrupted)
//! ```
//!
//! ## Post-shutdown policy
//! `post` and `subscribe` return [`DispatchError::Closed`] once shutdown began.
//! `unsubscribe` keeps working so callers can clean up unconditionally.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use typebus::{Dispatcher, Handler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Dispatcher::new_sync();
//!
//!     let total = Arc::new(AtomicUsize::new(0));
//!     let sink = Arc::clone(&total);
//!     let token = bus.subscribe(Handler::new(move |n: &usize| {
//!         sink.fetch_add(*n, Ordering::SeqCst);
//!     }))?;
//!
//!     bus.post(2usize)?;
//!     bus.post(3usize)?;
//!     bus.unsubscribe(&token);
//!     bus.post(100usize)?;
//!
//!     bus.shutdown_and_await_termination().await?;
//!     assert_eq!(total.load(Ordering::SeqCst), 5);
//!     Ok(())
//! }
//! ```

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, trace, warn};

use super::builder::DispatcherBuilder;
use super::delivery::{Delivery, DispatcherStats};
use super::registry::{Registry, Token};
use super::shutdown::{self, ForceOnDrop};
use crate::config::{Config, Mode};
use crate::error::DispatchError;
use crate::events::EventType;
use crate::handlers::Handler;
use crate::runners::TaskRunner;

/// Lifecycle state of a [`Dispatcher`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Accepting subscriptions and posts.
    Running,
    /// Shutdown requested; accepted deliveries are still running.
    ShuttingDown,
    /// Every accepted delivery has finished.
    Terminated,
}

/// In-process publish/subscribe dispatcher routing events by their concrete type.
pub struct Dispatcher {
    cfg: Config,
    registry: Registry,
    runner: Box<dyn TaskRunner>,
}

impl Dispatcher {
    pub(crate) fn new_internal(cfg: Config, runner: Box<dyn TaskRunner>) -> Self {
        Self {
            cfg,
            registry: Registry::new(),
            runner,
        }
    }

    /// Creates a dispatcher running in `mode` with default settings.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime (see [`DispatcherBuilder::with_runtime`]).
    pub fn new(mode: Mode) -> Self {
        Self::builder(Config::with_mode(mode)).build()
    }

    /// Creates a [`Mode::Sync`] dispatcher.
    pub fn new_sync() -> Self {
        Self::new(Mode::Sync)
    }

    /// Creates a [`Mode::Async`] dispatcher.
    pub fn new_async() -> Self {
        Self::new(Mode::Async)
    }

    /// Starts building a dispatcher from `cfg`.
    pub fn builder(cfg: Config) -> DispatcherBuilder {
        DispatcherBuilder::new(cfg)
    }

    /// Subscribes `handler` to events of type `E`.
    ///
    /// Fails with [`DispatchError::DuplicateSubscriber`] if this handler is
    /// already subscribed to `E`, and with [`DispatchError::Closed`] after shutdown.
    pub fn subscribe<E: Any + Send + Sync>(
        &self,
        handler: Handler<E>,
    ) -> Result<Token, DispatchError> {
        if self.runner.is_shutdown() {
            warn!(event_type = %EventType::of::<E>(), handler = handler.name(), "subscribe after shutdown");
            return Err(DispatchError::Closed {
                operation: "subscribe",
            });
        }
        self.registry.add(handler)
    }

    /// Removes the subscription behind `token`.
    ///
    /// Idempotent; returns whether a subscription was removed.
    pub fn unsubscribe(&self, token: &Token) -> bool {
        self.registry.remove(token) > 0
    }

    /// Posts `event` to every handler subscribed to `E`.
    ///
    /// Returns as soon as the delivery is queued; it never waits for handlers.
    /// With no subscribers nothing is queued at all.
    ///
    /// Routing uses `E` itself: posting a `Box<dyn Any + Send + Sync>` here routes
    /// to handlers of the box type. Use [`post_dyn`](Self::post_dyn) to route
    /// by the boxed value's concrete type.
    pub fn post<E: Any + Send + Sync>(&self, event: E) -> Result<(), DispatchError> {
        self.dispatch(EventType::of::<E>(), Arc::new(event))
    }

    /// Posts a type-erased event, routing by the concrete type of the boxed value.
    ///
    /// The concrete type name is not recoverable from the box: logs name it
    /// after the subscribed type when there is one, and `"<dyn Any>"` otherwise.
    pub fn post_dyn(&self, event: Box<dyn Any + Send + Sync>) -> Result<(), DispatchError> {
        let event: Arc<dyn Any + Send + Sync> = Arc::from(event);
        let event_type = self.registry.resolve(EventType::of_val(event.as_ref()));
        self.dispatch(event_type, event)
    }

    fn dispatch(
        &self,
        event_type: EventType,
        event: Arc<dyn Any + Send + Sync>,
    ) -> Result<(), DispatchError> {
        if self.runner.is_shutdown() {
            warn!(event_type = %event_type, "post after shutdown");
            return Err(DispatchError::Closed { operation: "post" });
        }

        let targets = self.registry.snapshot_for(event_type);
        if targets.is_empty() {
            trace!(event_type = %event_type, "no subscribers");
            return Ok(());
        }

        self.runner.submit(Delivery::new(event, targets))
    }

    /// Delivery mode chosen at construction.
    pub fn mode(&self) -> Mode {
        self.cfg.mode
    }

    /// Configuration the dispatcher was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        if self.runner.is_terminated() {
            State::Terminated
        } else if self.runner.is_shutdown() {
            State::ShuttingDown
        } else {
            State::Running
        }
    }

    /// Delivery counters.
    pub fn stats(&self) -> DispatcherStats {
        self.runner.stats()
    }

    /// Subscription registry (read access to membership).
    ///
    /// Subscribing goes through [`subscribe`](Self::subscribe) only:
    /// ```compile_fail
    /// use typebus::{Dispatcher, Handler};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let bus = Dispatcher::new_sync();
    /// bus.registry().add(Handler::new(|_: &u8| {}));
    /// # }
    /// ```
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of handlers subscribed to `E`.
    pub fn subscriber_count<E: Any>(&self) -> usize {
        self.registry.len(EventType::of::<E>())
    }

    /// Stops accepting posts and subscriptions; queued deliveries still run.
    ///
    /// Returns immediately. Idempotent.
    pub fn shutdown(&self) {
        self.runner.shutdown();
    }

    /// Like [`shutdown`](Self::shutdown), and discards queued deliveries that
    /// have not started. Running handlers are not interrupted.
    pub fn shutdown_now(&self) {
        self.runner.shutdown_now();
    }

    /// True once shutdown began.
    pub fn is_shutdown(&self) -> bool {
        self.runner.is_shutdown()
    }

    /// True once shut down and every accepted delivery finished.
    pub fn is_terminated(&self) -> bool {
        self.runner.is_terminated()
    }

    /// Waits up to `timeout` for termination; returns whether it happened.
    ///
    /// A running dispatcher never terminates on its own: without a prior
    /// [`shutdown`](Self::shutdown) this returns `false` after `timeout`.
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        self.runner.await_termination(Some(timeout)).await
    }

    /// Shuts down and waits, without limit, for every accepted delivery.
    ///
    /// If the returned future is dropped before completion, pending deliveries
    /// are discarded (`shutdown_now`). With [`Config::handle_os_signals`], a
    /// termination signal does the same and yields [`DispatchError::Interrupted`].
    pub async fn shutdown_and_await_termination(&self) -> Result<(), DispatchError> {
        self.shutdown();
        let guard = ForceOnDrop::new(self.runner.as_ref());

        let interrupted = if self.cfg.handle_os_signals {
            tokio::select! {
                _ = self.runner.await_termination(None) => false,
                _ = shutdown::termination_signal() => true,
            }
        } else {
            self.runner.await_termination(None).await;
            false
        };
        guard.disarm();

        if interrupted {
            warn!(mode = self.cfg.mode.as_label(), "termination signal while draining");
            self.runner.shutdown_now();
            return Err(DispatchError::Interrupted);
        }

        info!(mode = self.cfg.mode.as_label(), stats = ?self.stats(), "terminated");
        Ok(())
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.runner.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lifecycle_transitions() {
        for mode in [Mode::Sync, Mode::Async] {
            let bus = Dispatcher::new(mode);
            assert_eq!(bus.mode(), mode);
            assert_eq!(bus.state(), State::Running);

            bus.shutdown();
            assert!(bus.is_shutdown());
            assert!(bus.await_termination(Duration::from_secs(5)).await);
            assert_eq!(bus.state(), State::Terminated);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_subscribe_rejected_after_shutdown_but_unsubscribe_allowed() {
        let bus = Dispatcher::new_sync();
        let token = bus.subscribe(Handler::new(|_: &u8| {})).unwrap();
        bus.shutdown();

        assert_eq!(
            bus.subscribe(Handler::new(|_: &u8| {})),
            Err(DispatchError::Closed {
                operation: "subscribe"
            })
        );
        assert!(bus.unsubscribe(&token));
        assert!(!bus.unsubscribe(&token));
        assert_eq!(bus.subscriber_count::<u8>(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_dyn_resolves_subscribed_type_name() {
        let bus = Dispatcher::new_sync();
        bus.subscribe(Handler::new(|_: &u16| {})).unwrap();

        let boxed: Box<dyn Any + Send + Sync> = Box::new(9u16);
        let key = bus.registry().resolve(EventType::of_val(boxed.as_ref()));
        assert_eq!(key.name(), "u16");

        bus.post_dyn(boxed).unwrap();
        bus.shutdown();
        assert!(bus.await_termination(Duration::from_secs(5)).await);
        assert_eq!(bus.stats().completed, 1);
        assert_eq!(
            bus.post_dyn(Box::new(1u16)),
            Err(DispatchError::Closed { operation: "post" })
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_registry_view_cannot_bypass_closed_subscribe() {
        let bus = Dispatcher::new_sync();
        bus.shutdown();
        assert!(bus.subscribe(Handler::new(|_: &u8| {})).is_err());
        assert!(bus.registry().is_empty());
        assert_eq!(bus.registry().len(EventType::of::<u8>()), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_await_termination_false_while_running() {
        let bus = Dispatcher::new_async();
        assert!(!bus.await_termination(Duration::from_millis(20)).await);
        assert_eq!(bus.state(), State::Running);
    }
}
