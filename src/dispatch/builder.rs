use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::info;

use super::{delivery::Reporter, dispatcher::Dispatcher};
use crate::{
    config::{Config, Mode},
    failure::FailureHook,
    runners::{PoolRunner, SerialRunner, TaskRunner},
};

/// Builder for constructing a [`Dispatcher`] with optional features.
pub struct DispatcherBuilder {
    cfg: Config,
    hook: Option<Arc<dyn FailureHook>>,
    runtime: Option<Handle>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            hook: None,
            runtime: None,
        }
    }

    /// Sets the hook receiving every aborted delivery.
    ///
    /// The hook runs on the delivery thread, right after the failing handler.
    pub fn with_failure_hook(mut self, hook: Arc<dyn FailureHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Runs deliveries on the given runtime instead of the current one.
    ///
    /// Required when building outside of a Tokio runtime context.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds and returns the Dispatcher instance.
    ///
    /// This consumes the builder and starts the runner selected by
    /// [`Config::mode`]:
    /// - `Mode::Sync` → single dedicated worker
    /// - `Mode::Async` → elastic pool (capped by `max_workers` if set)
    ///
    /// # Panics
    /// Panics if no runtime was given and this is called outside a Tokio runtime.
    pub fn build(self) -> Dispatcher {
        let runtime = self.runtime.unwrap_or_else(Handle::current);
        let reporter = Arc::new(Reporter::new(self.hook));

        let runner: Box<dyn TaskRunner> = match self.cfg.mode {
            Mode::Sync => Box::new(SerialRunner::new(reporter, &runtime)),
            Mode::Async => Box::new(PoolRunner::new(
                reporter,
                runtime,
                self.cfg.concurrency_limit(),
            )),
        };

        info!(
            mode = self.cfg.mode.as_label(),
            max_workers = ?self.cfg.concurrency_limit(),
            runner = runner.name(),
            "dispatcher started"
        );
        Dispatcher::new_internal(self.cfg, runner)
    }
}
