//! Graph-builder API.
//!
//! A [`Graph`] is not a runtime entity (topology lives in the output pins);
//! it bundles what wiring code needs: the injected dispatcher, the edge
//! registry and keep-alive handles for the nodes, which live for the rest
//! of the process.
//!
//! ```text
//! let graph = Graph::new(pool);
//! let delay = Delay::new(&graph, Duration::from_millis(100));
//! let sink  = ChannelSink::new(&graph);
//! graph.attach(delay.output(), sink.input());
//! graph.inject(delay.input(), item);
//! ```

use crate::config::EngineConfig;
use crate::dispatch::{Dispatcher, WorkerPool};
use crate::error::Result;
use crate::graph::item::Item;
use crate::graph::pin::{InputPin, OutputPin};
use crate::graph::registry::{EdgeRegistry, TopologySnapshot};
use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub struct Graph {
    dispatcher: Arc<dyn Dispatcher>,
    registry: Arc<EdgeRegistry>,
    nodes: Arc<Mutex<Vec<Arc<dyn Any + Send + Sync>>>>,
}

impl Graph {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            registry: Arc::new(EdgeRegistry::new()),
            nodes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Build a graph on a fresh [`WorkerPool`] configured from `config`.
    /// The pool handle is returned so callers can observe or stop it.
    pub fn from_config(config: &EngineConfig) -> Result<(Self, WorkerPool)> {
        config.validate()?;
        let pool = WorkerPool::new(config.dispatcher.clone(), config.supervision)?;
        Ok((Self::new(Arc::new(pool.clone())), pool))
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub fn registry(&self) -> &EdgeRegistry {
        &self.registry
    }

    /// New output pin bound to this graph's dispatcher and registry.
    pub fn output<T: Item>(&self) -> OutputPin<T> {
        OutputPin::with_registry(Arc::clone(&self.dispatcher), Arc::clone(&self.registry))
    }

    /// Keep `node` alive for the lifetime of the graph and hand it back.
    pub fn adopt<N: Send + Sync + 'static>(&self, node: Arc<N>) -> Arc<N> {
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&node) as Arc<dyn Any + Send + Sync>);
        node
    }

    pub fn node_count(&self) -> usize {
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wire `from → to`. No-op if the edge already exists.
    pub fn attach<T: Item>(&self, from: &OutputPin<T>, to: &InputPin<T>) {
        from.attach(to);
    }

    /// Externally held output pin already attached to `to`, for priming or
    /// repeatedly feeding a pipeline from outside.
    pub fn injector<T: Item>(&self, to: &InputPin<T>) -> OutputPin<T> {
        let pin = self.output();
        pin.attach(to);
        pin
    }

    /// Schedule a single bootstrap delivery of `item` into `to`.
    pub fn inject<T: Item>(&self, to: &InputPin<T>, item: T) {
        tracing::debug!("Injecting bootstrap item into {}", to.id());
        let pin = to.clone();
        self.dispatcher.dispatch(Box::new(move || pin.deliver(item)));
    }

    pub fn topology(&self) -> TopologySnapshot {
        self.registry.snapshot(self.node_count())
    }
}
