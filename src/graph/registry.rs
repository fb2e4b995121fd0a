//! Edge registry for introspection.
//!
//! The runtime never consults the registry: topology is whatever the output
//! pins hold. It exists so builders and tests can ask "is X attached to Y"
//! and take a snapshot of the wiring. No validation happens here; cycles
//! are legal.

use crate::graph::id::{EdgeId, PinId};
use crate::graph::item::FanOut;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One recorded edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: PinId,
    pub to: PinId,
}

/// Output pin as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPinInfo {
    pub id: PinId,
    pub item_type: &'static str,
    pub fan_out: FanOut,
}

/// Complete wiring snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologySnapshot {
    pub nodes: usize,
    pub output_pins: Vec<OutputPinInfo>,
    pub edges: Vec<Edge>,
}

#[derive(Default)]
struct Inner {
    outputs: Vec<OutputPinInfo>,
    edges: Vec<Edge>,
}

/// Attach-order record of every edge.
#[derive(Default)]
pub struct EdgeRegistry {
    inner: Mutex<Inner>,
}

impl EdgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register_output(&self, info: OutputPinInfo) {
        self.lock().outputs.push(info);
    }

    /// Record `from → to`; returns `None` if the edge already exists.
    pub(crate) fn record(&self, from: PinId, to: PinId) -> Option<EdgeId> {
        let mut inner = self.lock();
        if inner.edges.iter().any(|e| e.from == from && e.to == to) {
            return None;
        }
        let id = EdgeId(inner.edges.len());
        inner.edges.push(Edge { id, from, to });
        Some(id)
    }

    pub fn is_attached(&self, from: PinId, to: PinId) -> bool {
        self.lock()
            .edges
            .iter()
            .any(|e| e.from == from && e.to == to)
    }

    /// Input pins fed by `from`, in attach order.
    pub fn targets_of(&self, from: PinId) -> Vec<PinId> {
        self.lock()
            .edges
            .iter()
            .filter(|e| e.from == from)
            .map(|e| e.to)
            .collect()
    }

    /// Output pins feeding `to`, in attach order.
    pub fn sources_of(&self, to: PinId) -> Vec<PinId> {
        self.lock()
            .edges
            .iter()
            .filter(|e| e.to == to)
            .map(|e| e.from)
            .collect()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.lock().edges.clone()
    }

    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    pub(crate) fn snapshot(&self, nodes: usize) -> TopologySnapshot {
        let inner = self.lock();
        TopologySnapshot {
            nodes,
            output_pins: inner.outputs.clone(),
            edges: inner.edges.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
