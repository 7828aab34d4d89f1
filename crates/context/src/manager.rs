//! Context manager: context construction and cancellable execution.

use crate::work::sleep_or_done;
use crate::{CancelHandle, CancelPolicy, Context, ContextError, Result, RunnerConfig};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

/// A unit of work handed to [`ContextManager::execute_with_context`].
pub type BoxedTask = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Context operations and cancellable execution.
#[async_trait]
pub trait ContextManager: Send + Sync {
    /// Create a child context with an explicit cancel trigger.
    fn create_cancellable_context(&self, parent: &Context) -> (Context, CancelHandle);

    /// Create a child context that expires after `timeout`.
    ///
    /// A non-zero timeout starts a timer task and panics outside a tokio
    /// runtime.
    fn create_timeout_context(&self, parent: &Context, timeout: Duration) -> (Context, CancelHandle);

    /// Create a child context carrying one extra key/value binding.
    fn add_value(&self, parent: &Context, key: &str, value: Value) -> Context;

    /// Look up a value; `None` if unbound or bound to `Value::Null`.
    fn get_value(&self, ctx: &Context, key: &str) -> Option<Value>;

    /// Run `task` concurrently and return whichever finishes first: the
    /// task's own result or the context's cancellation reason.
    async fn execute_with_context(&self, ctx: &Context, task: BoxedTask) -> Result<()>;

    /// Wait for `duration` unless the context is done first.
    async fn wait_for_completion(&self, ctx: &Context, duration: Duration) -> Result<()>;
}

/// Default context manager.
#[derive(Debug, Clone, Default)]
pub struct BasicContextManager {
    config: RunnerConfig,
}

impl BasicContextManager {
    /// Create a manager with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

#[async_trait]
impl ContextManager for BasicContextManager {
    fn create_cancellable_context(&self, parent: &Context) -> (Context, CancelHandle) {
        parent.with_cancel()
    }

    fn create_timeout_context(&self, parent: &Context, timeout: Duration) -> (Context, CancelHandle) {
        parent.with_timeout(timeout)
    }

    fn add_value(&self, parent: &Context, key: &str, value: Value) -> Context {
        parent.with_value(key, value)
    }

    fn get_value(&self, ctx: &Context, key: &str) -> Option<Value> {
        ctx.value(key).cloned()
    }

    async fn execute_with_context(&self, ctx: &Context, task: BoxedTask) -> Result<()> {
        if let Some(reason) = ctx.err() {
            debug!(context_id = %ctx.id(), %reason, "Context already done, task not started");
            return Err(reason.into());
        }

        let mut handle = tokio::spawn(task);

        tokio::select! {
            biased;

            reason = ctx.done() => {
                match self.config.on_cancel {
                    CancelPolicy::Detach => {
                        warn!(context_id = %ctx.id(), %reason, "Context done first, task left running");
                    }
                    CancelPolicy::Abort => {
                        handle.abort();
                        debug!(context_id = %ctx.id(), %reason, "Context done first, task aborted");
                    }
                }
                Err(reason.into())
            }

            joined = &mut handle => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(ContextError::Task(e)),
                Err(e) if e.is_panic() => Err(ContextError::TaskPanicked(panic_message(e.into_panic()))),
                Err(e) => Err(ContextError::Task(e.into())),
            },
        }
    }

    async fn wait_for_completion(&self, ctx: &Context, duration: Duration) -> Result<()> {
        sleep_or_done(ctx, duration).await
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
