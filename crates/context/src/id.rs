//! Context node identifiers.

use ulid::Ulid;

/// Identifier of a context node, carried in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Ulid);

impl ContextId {
    pub(crate) fn new() -> Self {
        Self(Ulid::new())
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
