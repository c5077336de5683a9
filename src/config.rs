//! # Dispatcher configuration.
//!
//! Provides [`Config`] centralized settings for a [`Dispatcher`](crate::Dispatcher)
//! and the delivery [`Mode`] it runs in.
//!
//! ## Sentinel values
//! - `max_workers = 0` → unlimited (no semaphore created; Tokio's blocking pool limit applies)
//! - `max_workers > Semaphore::MAX_PERMITS` → clamped to `Semaphore::MAX_PERMITS`

use tokio::sync::Semaphore;

/// How deliveries are executed.
///
/// Fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// One dedicated worker; deliveries run one at a time in `post` order.
    #[default]
    Sync,
    /// Elastic worker pool; deliveries of different posts may run concurrently.
    Async,
}

impl Mode {
    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Mode::Sync => "sync",
            Mode::Async => "async",
        }
    }
}

/// Dispatcher settings.
///
/// ## Field semantics
/// - `mode`: delivery mode (`Sync` by default)
/// - `max_workers`: cap on concurrently running deliveries in `Async` mode (`0` = unlimited);
///   ignored in `Sync` mode
/// - `handle_os_signals`: let `shutdown_and_await_termination` react to
///   SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows) by discarding pending deliveries
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Delivery mode.
    pub mode: Mode,

    /// Maximum number of deliveries running at the same time (`Async` only).
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` deliveries run simultaneously; the rest wait
    pub max_workers: usize,

    /// Whether waiting for termination also listens for OS termination signals.
    ///
    /// Off by default: a library should not claim process signals unless asked.
    pub handle_os_signals: bool,
}

impl Config {
    /// Config for the given mode with all other settings at their defaults.
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Returns the worker cap as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` concurrent deliveries, never above `Semaphore::MAX_PERMITS`
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_workers == 0 {
            None
        } else {
            Some(self.max_workers.min(Semaphore::MAX_PERMITS))
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `mode = Mode::Sync`
    /// - `max_workers = 0` (unlimited)
    /// - `handle_os_signals = false`
    fn default() -> Self {
        Self {
            mode: Mode::Sync,
            max_workers: 0,
            handle_os_signals: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.mode, Mode::Sync);
        assert_eq!(cfg.concurrency_limit(), None);
        assert!(!cfg.handle_os_signals);
    }

    #[test]
    fn test_concurrency_limit_sentinel() {
        let mut cfg = Config::with_mode(Mode::Async);
        assert_eq!(cfg.mode, Mode::Async);
        cfg.max_workers = 4;
        assert_eq!(cfg.concurrency_limit(), Some(4));
    }

    #[test]
    fn test_concurrency_limit_is_clamped_to_semaphore_capacity() {
        let cfg = Config {
            mode: Mode::Async,
            max_workers: usize::MAX,
            ..Config::default()
        };
        assert_eq!(cfg.concurrency_limit(), Some(Semaphore::MAX_PERMITS));
    }
}
