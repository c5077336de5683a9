//! # Example: failure_hook
//!
//! A validating handler rejects some events; the failure aborts that delivery
//! and is reported to a custom [`FailureHook`].
//!
//! Demonstrates how to:
//! - Build a dispatcher with [`DispatcherBuilder::with_failure_hook`].
//! - Use [`Handler::fallible`] for handlers that can reject an event.
//! - Observe that later handlers are skipped for the failed event only.
//!
//! ## Flow
//! ```text
//! post(Order)
//!     ├─► validate   ─► Err for empty orders ─► FailureHook::on_failure
//!     └─► fulfil     (skipped when validate failed)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=typebus=info cargo run --example failure_hook
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing_subscriber::EnvFilter;
use typebus::{
    Config, DeliveryFailure, Dispatcher, DispatcherBuilder, FailureHook, Handler, Mode,
};

#[derive(Debug)]
struct Order {
    id: u32,
    items: Vec<&'static str>,
}

/// Counts failures and prints each one.
#[derive(Default)]
struct Alerts {
    seen: AtomicUsize,
}

impl FailureHook for Alerts {
    fn on_failure(&self, failure: &DeliveryFailure) {
        self.seen.fetch_add(1, Ordering::Relaxed);
        println!(
            "[alert] {} rejected {} ({} handler(s) skipped): {}",
            failure.handler,
            failure.event_type,
            failure.skipped,
            failure.error.as_message()
        );
    }

    fn name(&self) -> &'static str {
        "alerts"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let alerts = Arc::new(Alerts::default());
    let builder: DispatcherBuilder = Dispatcher::builder(Config::with_mode(Mode::Async));
    let bus = builder.with_failure_hook(alerts.clone()).build();

    bus.subscribe(
        Handler::fallible(|o: &Order| {
            if o.items.is_empty() {
                return Err(format!("order {} has no items", o.id));
            }
            Ok(())
        })
        .named("validate"),
    )?;
    bus.subscribe(
        Handler::new(|o: &Order| println!("[fulfil] order {} -> {:?}", o.id, o.items)).named("fulfil"),
    )?;

    bus.post(Order { id: 1, items: vec!["book"] })?;
    bus.post(Order { id: 2, items: vec![] })?;
    bus.post(Order { id: 3, items: vec!["pen", "ink"] })?;

    bus.shutdown_and_await_termination().await?;
    println!(
        "alerts: {}, stats: {:?}",
        alerts.seen.load(Ordering::Relaxed),
        bus.stats()
    );
    Ok(())
}
