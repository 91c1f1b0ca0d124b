//! Identifiers for resources and loader invocations.

use core::fmt;
use std::sync::Arc;

/// Unique identifier of a resource controller.
///
/// Resource IDs are generated using nanoid, so controllers created anywhere in
/// the process never collide. They appear in tracing spans and hook events.
///
/// Internally uses `Arc<str>` for cheap cloning (reference count bump only).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    /// Creates a new resource ID with a unique nanoid.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Creates a resource ID from a specific string value.
    ///
    /// This is primarily useful for testing.
    #[must_use]
    pub fn from_string(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token identifying one loader invocation of a resource.
///
/// Tokens increase monotonically per resource. The scheduler only applies an
/// outcome whose token matches the invocation it is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvocationId(u64);

impl InvocationId {
    /// Creates an invocation token from its sequence number.
    #[must_use]
    pub fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Returns the sequence number; the first invocation is `1`.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invocation_{}", self.0)
    }
}
