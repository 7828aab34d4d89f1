//! Hierarchical cancellation context.
//!
//! A [`Context`] is an immutable node linked to its parent. Nodes created
//! with [`Context::with_cancel`], [`Context::with_timeout`] or
//! [`Context::with_deadline`] own a cancellation signal derived from the
//! parent's, so cancelling a node reaches every descendant. Nodes created
//! with [`Context::with_value`] add one key/value binding and share the
//! parent's signal.
//!
//! ```text
//! background ── cancel(A) ── value(user) ── timeout(B)
//!                  │                           │
//!          cancelling A cancels B    B may also expire on its own
//! ```

use crate::{CancelReason, ContextId};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Observable state of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Not cancelled
    Active,
    /// Cancelled by an explicit trigger
    Cancelled,
    /// Cancelled because a deadline passed
    Expired,
}

impl From<Option<CancelReason>> for ContextState {
    fn from(reason: Option<CancelReason>) -> Self {
        match reason {
            None => ContextState::Active,
            Some(CancelReason::Canceled) => ContextState::Cancelled,
            Some(CancelReason::DeadlineExceeded) => ContextState::Expired,
        }
    }
}

/// Cancellation signal owned by a cancellable node.
#[derive(Debug)]
struct Signal {
    id: ContextId,
    token: CancellationToken,
    reason: OnceLock<CancelReason>,
    deadline: Option<Instant>,
}

impl Signal {
    /// Record `reason` and fire the token. Returns false if the node was
    /// already done, in which case its reason is left untouched.
    fn cancel(&self, reason: CancelReason) -> bool {
        if self.token.is_cancelled() || self.reason.set(reason).is_err() {
            return false;
        }
        self.token.cancel();
        debug!(context_id = %self.id, %reason, "Context cancelled");
        true
    }
}

#[derive(Debug)]
struct Node {
    id: ContextId,
    parent: Option<Context>,
    token: CancellationToken,
    signal: Option<Arc<Signal>>,
    binding: Option<(String, Value)>,
}

/// A node in the context tree. Cloning is cheap and yields the same node.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Node>,
}

impl Context {
    /// The root context: never cancelled, no deadline, no values.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Node {
                id: ContextId::new(),
                parent: None,
                token: CancellationToken::new(),
                signal: None,
                binding: None,
            }),
        }
    }

    /// Derive a child that is cancelled when the returned handle fires.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        self.derive_signal(None)
    }

    /// Derive a child that expires once `timeout` has elapsed.
    ///
    /// A non-zero timeout starts a timer task, so this must be called from
    /// within a tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancelHandle) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child that expires at `deadline`.
    ///
    /// A deadline that has already passed yields an expired context
    /// without starting a timer.
    pub fn with_deadline(&self, deadline: Instant) -> (Context, CancelHandle) {
        let (ctx, handle) = self.derive_signal(Some(deadline));

        if deadline <= Instant::now() {
            handle.signal.cancel(CancelReason::DeadlineExceeded);
            return (ctx, handle);
        }

        // The timer exits as soon as the node is done, so an early cancel
        // releases it.
        let timer = handle.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.signal.token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    timer.signal.cancel(CancelReason::DeadlineExceeded);
                }
            }
        });

        (ctx, handle)
    }

    /// Derive a child exposing one extra key/value binding.
    ///
    /// Binding [`Value::Null`] hides any ancestor binding of the same key.
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<Value>) -> Context {
        let key = key.into();
        let id = ContextId::new();
        debug!(context_id = %id, parent_id = %self.inner.id, key = %key, "Attaching value");

        Context {
            inner: Arc::new(Node {
                id,
                parent: Some(self.clone()),
                token: self.inner.token.clone(),
                signal: None,
                binding: Some((key, value.into())),
            }),
        }
    }

    fn derive_signal(&self, deadline: Option<Instant>) -> (Context, CancelHandle) {
        let id = ContextId::new();
        let token = self.inner.token.child_token();
        let signal = Arc::new(Signal {
            id,
            token: token.clone(),
            reason: OnceLock::new(),
            deadline,
        });

        debug!(context_id = %id, parent_id = %self.inner.id, ?deadline, "Derived cancellable context");

        let ctx = Context {
            inner: Arc::new(Node {
                id,
                parent: Some(self.clone()),
                token,
                signal: Some(signal.clone()),
                binding: None,
            }),
        };

        (ctx, CancelHandle { signal })
    }

    /// Identifier of this node.
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// Why this context is done, or `None` while it is active.
    ///
    /// A node cancelled through an ancestor reports the ancestor's reason.
    /// The first reason observed for a node is recorded on it, so later
    /// reads never report a different one.
    pub fn err(&self) -> Option<CancelReason> {
        if !self.inner.token.is_cancelled() {
            return None;
        }
        Some(self.resolve_reason())
    }

    /// Reason of a done node. Must only be called once the token fired.
    fn resolve_reason(&self) -> CancelReason {
        let mut node = self;
        loop {
            if let Some(signal) = &node.inner.signal {
                return *signal.reason.get_or_init(|| {
                    node.inner
                        .parent
                        .as_ref()
                        .map_or(CancelReason::Canceled, |p| p.resolve_reason())
                });
            }
            match &node.inner.parent {
                Some(parent) => node = parent,
                None => return CancelReason::Canceled,
            }
        }
    }

    /// Whether this context is done.
    pub fn is_done(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Current state of this context.
    pub fn state(&self) -> ContextState {
        self.err().into()
    }

    /// Resolve once this context is done, yielding the reason.
    pub async fn done(&self) -> CancelReason {
        self.inner.token.cancelled().await;
        self.err().unwrap_or(CancelReason::Canceled)
    }

    /// Earliest deadline of this node and its ancestors.
    pub fn deadline(&self) -> Option<Instant> {
        let mut earliest: Option<Instant> = None;
        let mut node = Some(self);
        while let Some(current) = node {
            if let Some(deadline) = current.inner.signal.as_ref().and_then(|s| s.deadline) {
                earliest = Some(earliest.map_or(deadline, |e| e.min(deadline)));
            }
            node = current.inner.parent.as_ref();
        }
        earliest
    }

    /// Look up `key`, walking from this node towards the root.
    ///
    /// The nearest binding wins. A nearest binding of [`Value::Null`]
    /// reads as not found.
    pub fn value(&self, key: &str) -> Option<&Value> {
        let mut node = self;
        loop {
            if let Some((k, v)) = &node.inner.binding {
                if k == key {
                    return if v.is_null() { None } else { Some(v) };
                }
            }
            node = node.inner.parent.as_ref()?;
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

/// Explicit cancel trigger for a derived context.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    signal: Arc<Signal>,
}

impl CancelHandle {
    /// Cancel the context and all of its descendants.
    ///
    /// Idempotent; a context that is already done keeps its reason.
    pub fn cancel(&self) {
        self.signal.cancel(CancelReason::Canceled);
    }

    /// Whether the associated context is done, for any reason.
    pub fn is_cancelled(&self) -> bool {
        self.signal.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_background_is_active() {
        let ctx = Context::background();
        assert_eq!(ctx.err(), None);
        assert_eq!(ctx.state(), ContextState::Active);
        assert!(ctx.deadline().is_none());
        assert!(ctx.value("user").is_none());
    }

    #[test]
    fn test_cancel_is_monotonic() {
        let (ctx, cancel) = Context::background().with_cancel();
        assert!(!ctx.is_done());

        cancel.cancel();
        assert_eq!(ctx.err(), Some(CancelReason::Canceled));
        assert_eq!(ctx.state(), ContextState::Cancelled);

        cancel.cancel();
        assert_eq!(ctx.err(), Some(CancelReason::Canceled));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_parent_cancel_reaches_descendants() {
        let (parent, cancel) = Context::background().with_cancel();
        let valued = parent.with_value("k", "v");
        let (child, _child_cancel) = valued.with_cancel();
        let (grandchild, _) = child.with_cancel();

        cancel.cancel();
        assert_eq!(child.err(), Some(CancelReason::Canceled));
        assert_eq!(grandchild.err(), Some(CancelReason::Canceled));
        assert!(valued.is_done());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let (parent, _cancel) = Context::background().with_cancel();
        let (child, child_cancel) = parent.with_cancel();

        child_cancel.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_inherits_parent_expiry() {
        let (parent, _cancel) = Context::background().with_timeout(Duration::from_millis(50));
        let (child, _child_cancel) = parent.with_cancel();

        assert_eq!(child.done().await, CancelReason::DeadlineExceeded);
        assert_eq!(child.state(), ContextState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_reason_stable_after_parent_expires() {
        let (parent, _cancel) = Context::background().with_timeout(Duration::from_millis(50));
        let (child, child_cancel) = parent.with_cancel();

        child_cancel.cancel();
        parent.done().await;

        assert_eq!(parent.err(), Some(CancelReason::DeadlineExceeded));
        assert_eq!(child.err(), Some(CancelReason::Canceled));
    }

    #[test]
    fn test_observed_reason_survives_late_cancel() {
        let (parent, parent_cancel) = Context::background().with_cancel();
        let (child, child_cancel) = parent.with_cancel();

        // Parent expires while the child's own cancel is still in flight.
        parent_cancel.signal.cancel(CancelReason::DeadlineExceeded);
        assert_eq!(child.err(), Some(CancelReason::DeadlineExceeded));

        let _ = child_cancel.signal.reason.set(CancelReason::Canceled);
        child_cancel.cancel();
        assert_eq!(child.err(), Some(CancelReason::DeadlineExceeded));
        assert_eq!(child.state(), ContextState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_expires() {
        let start = Instant::now();
        let (ctx, _cancel) = Context::background().with_timeout(Duration::from_millis(100));
        assert!(!ctx.is_done());

        assert_eq!(ctx.done().await, CancelReason::DeadlineExceeded);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancelled_early_reports_canceled() {
        let (ctx, cancel) = Context::background().with_timeout(Duration::from_secs(10));
        cancel.cancel();

        assert_eq!(ctx.err(), Some(CancelReason::Canceled));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(ctx.err(), Some(CancelReason::Canceled));
    }

    #[test]
    fn test_zero_timeout_is_expired_immediately() {
        let (ctx, _cancel) = Context::background().with_timeout(Duration::ZERO);
        assert_eq!(ctx.err(), Some(CancelReason::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_earliest_of_chain() {
        let (outer, _a) = Context::background().with_timeout(Duration::from_secs(1));
        let (inner, _b) = outer.with_timeout(Duration::from_secs(5));
        let (tighter, _c) = outer.with_timeout(Duration::from_millis(200));

        assert_eq!(inner.deadline(), outer.deadline());
        assert!(tighter.deadline().unwrap() < outer.deadline().unwrap());
        assert_eq!(inner.with_value("k", 1).deadline(), outer.deadline());
    }

    #[test]
    fn test_value_lookup_walks_ancestors() {
        let root = Context::background().with_value("user", "alice");
        let (mid, _cancel) = root.with_cancel();
        let leaf = mid.with_value("requestID", "12345");

        assert_eq!(leaf.value("user"), Some(&json!("alice")));
        assert_eq!(leaf.value("requestID"), Some(&json!("12345")));
        assert!(root.value("requestID").is_none());
        assert!(leaf.value("missing").is_none());
    }

    #[test]
    fn test_local_value_shadows_ancestor() {
        let parent = Context::background().with_value("user", "alice");
        let child = parent.with_value("user", "bob");

        assert_eq!(child.value("user"), Some(&json!("bob")));
        assert_eq!(parent.value("user"), Some(&json!("alice")));
    }

    #[test]
    fn test_null_value_reads_as_missing() {
        let parent = Context::background().with_value("user", "alice");
        let child = parent.with_value("user", Value::Null);

        assert!(child.value("user").is_none());
        assert_eq!(parent.value("user"), Some(&json!("alice")));
    }
}
