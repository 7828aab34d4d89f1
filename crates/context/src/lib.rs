//! Cancellable task runner.
//!
//! A hierarchical context carries cancellation, deadlines and key/value
//! bindings down to its children. The [`ContextManager`] races units of
//! work against a context's cancellation.

#![warn(missing_docs)]

mod id;

pub mod config;
pub mod context;
pub mod error;
pub mod manager;
pub mod work;

pub use id::ContextId;
pub use config::{CancelPolicy, RunnerConfig};
pub use context::{CancelHandle, Context, ContextState};
pub use error::{CancelReason, ContextError, Result};
pub use manager::{BasicContextManager, BoxedTask, ContextManager};
pub use work::{process_items, simulate_work, BatchOutput};
