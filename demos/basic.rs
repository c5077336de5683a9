//! # Example: basic
//!
//! Two dispatchers, one per delivery mode, each routing `String` and `i32`
//! events to their own subscribers.
//!
//! Demonstrates how to:
//! - Subscribe typed [`Handler`]s and keep their [`Token`]s.
//! - Post events and let the dispatcher route them by concrete type.
//! - Unsubscribe, then drain with `shutdown_and_await_termination`.
//!
//! ## Flow
//! ```text
//! subscribe(Handler<String>), subscribe(Handler<i32>)
//!     ├─► post("hello")  ─► string handlers, in registration order
//!     ├─► post(42)       ─► int handler
//!     ├─► unsubscribe(token)
//!     ├─► post("again")  ─► remaining string handler only
//!     └─► shutdown_and_await_termination()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=typebus=debug cargo run --example basic
//! ```

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use typebus::{Dispatcher, Handler, Mode, Token};

fn wire(bus: &Dispatcher) -> anyhow::Result<Token> {
    let mode = bus.mode().as_label();

    let loud = bus.subscribe(
        Handler::new(move |s: &String| println!("[{mode}] loud  : {}", s.to_uppercase()))
            .named("loud"),
    )?;
    bus.subscribe(
        Handler::new(move |s: &String| println!("[{mode}] quiet : {s}")).named("quiet"),
    )?;
    bus.subscribe(
        Handler::new(move |n: &i32| {
            std::thread::sleep(Duration::from_millis(10));
            println!("[{mode}] number: {n}");
        })
        .named("number"),
    )?;
    Ok(loud)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    for mode in [Mode::Sync, Mode::Async] {
        let bus = Dispatcher::new(mode);
        let loud = wire(&bus)?;

        bus.post(String::from("hello"))?;
        for n in 0..3 {
            bus.post(n)?;
        }
        bus.unsubscribe(&loud);
        bus.post(String::from("again"))?;
        // Nobody listens for f64: nothing is queued.
        bus.post(1.5f64)?;

        bus.shutdown_and_await_termination().await?;
        println!("[{}] stats: {:?}", mode.as_label(), bus.stats());
    }
    Ok(())
}
