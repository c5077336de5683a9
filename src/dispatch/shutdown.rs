//! # Interruption sources for `shutdown_and_await_termination`.
//!
//! Waiting for a dispatcher to drain can be cut short in two ways:
//! - the waiting future is dropped → [`ForceOnDrop`] escalates to `shutdown_now`;
//! - the process receives a termination signal (opt-in via
//!   [`Config::handle_os_signals`](crate::Config::handle_os_signals)) → [`termination_signal`] resolves.
//!
//! ## Signals
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//!
//! **Windows platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].

use tracing::warn;

use crate::runners::TaskRunner;

/// Completes when the process receives a termination signal.
///
/// If the listeners cannot be registered the future never completes, so the
/// wait degrades to an uninterruptible one instead of aborting deliveries.
pub(crate) async fn termination_signal() {
    if let Err(e) = wait_for_signal().await {
        warn!(error = %e, "cannot listen for termination signals");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Calls `shutdown_now` on the runner unless disarmed before being dropped.
pub(crate) struct ForceOnDrop<'a> {
    runner: Option<&'a dyn TaskRunner>,
}

impl<'a> ForceOnDrop<'a> {
    pub(crate) fn new(runner: &'a dyn TaskRunner) -> Self {
        Self {
            runner: Some(runner),
        }
    }

    /// The wait completed normally; nothing to escalate.
    pub(crate) fn disarm(mut self) {
        self.runner = None;
    }
}

impl Drop for ForceOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(runner) = self.runner.take() {
            warn!(runner = runner.name(), "termination wait abandoned; forcing shutdown");
            runner.shutdown_now();
        }
    }
}
