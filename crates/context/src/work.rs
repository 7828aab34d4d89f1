//! Cancellable work helpers.

use crate::{CancelReason, Context, ContextError, Result, RunnerConfig};
use std::time::Duration;
use tracing::{debug, info};

/// Sleep for `duration` unless `ctx` is done first.
pub(crate) async fn sleep_or_done(ctx: &Context, duration: Duration) -> Result<()> {
    tokio::select! {
        biased;
        reason = ctx.done() => Err(reason.into()),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Simulate `duration` of work that stops early if `ctx` is done.
pub async fn simulate_work(ctx: &Context, duration: Duration, description: &str) -> Result<()> {
    info!(context_id = %ctx.id(), ?duration, "Starting work: {}", description);

    match sleep_or_done(ctx, duration).await {
        Ok(()) => {
            info!(context_id = %ctx.id(), "Completed work: {}", description);
            Ok(())
        }
        Err(e) => {
            info!(context_id = %ctx.id(), reason = %e, "Work cancelled: {}", description);
            Err(e)
        }
    }
}

/// Output of [`process_items`].
///
/// On interruption `items` holds the prefix processed so far and `error`
/// the reason; on completion `items` holds every processed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    /// Processed items, in input order
    pub items: Vec<String>,
    /// Why processing stopped early, if it did
    pub error: Option<CancelReason>,
}

impl BatchOutput {
    /// Whether every input item was processed.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Drop the partial output and keep only the outcome.
    pub fn into_result(self) -> Result<Vec<String>> {
        match self.error {
            None => Ok(self.items),
            Some(reason) => Err(ContextError::Cancelled(reason)),
        }
    }
}

/// Process `items` one at a time, checking `ctx` before each one.
///
/// Cancellation is only observed between items, so the returned prefix
/// includes the item that was in progress when `ctx` was cancelled.
///
/// Each item takes `config.item_delay` and becomes `processed_<item>`.
pub async fn process_items<S: AsRef<str>>(
    ctx: &Context,
    items: &[S],
    config: &RunnerConfig,
) -> BatchOutput {
    let mut processed = Vec::with_capacity(items.len());

    for item in items {
        let item = item.as_ref();

        if let Some(reason) = ctx.err() {
            debug!(context_id = %ctx.id(), done = processed.len(), %reason, "Batch interrupted");
            return BatchOutput { items: processed, error: Some(reason) };
        }

        // An item that has started always finishes.
        tokio::time::sleep(config.item_delay).await;
        processed.push(format!("processed_{item}"));
    }

    debug!(context_id = %ctx.id(), done = processed.len(), "Batch complete");
    BatchOutput { items: processed, error: None }
}
