//! Identity types for the graph.
//!
//! Pins are identified by a process-unique `PinId`. Identity, not address,
//! is what makes attachment idempotent and lets a node with several inputs
//! tell them apart.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PIN: AtomicU64 = AtomicU64::new(0);

/// Unique identifier of an input or output pin.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PinId(pub u64);

impl PinId {
    /// Allocate the next unused id.
    pub fn next() -> Self {
        PinId(NEXT_PIN.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinId({})", self.0)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Position of an edge in the registry's attach order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EdgeId(pub usize);

impl EdgeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}
