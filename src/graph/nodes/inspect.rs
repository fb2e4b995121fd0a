//! Pass-through side effect.

use crate::graph::builder::Graph;
use crate::graph::item::Item;
use crate::graph::node::Filter;
use crate::graph::pin::{InputPin, OutputPin};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Effect<T> = Box<dyn FnMut(&T) + Send>;

/// Pass-through that runs a side effect on every item first.
///
/// The effect runs under the node's lock, one item at a time, so it may keep
/// its own mutable state (a display handle, a counter, a file).
pub struct Inspect<T> {
    effect: Mutex<Effect<T>>,
    input: InputPin<T>,
    output: OutputPin<T>,
}

impl<T: Item> Inspect<T> {
    pub fn new(graph: &Graph, effect: impl FnMut(&T) + Send + 'static) -> Arc<Self> {
        let node = Arc::new_cyclic(|me: &Weak<Self>| Self {
            effect: Mutex::new(Box::new(effect)),
            input: InputPin::new(me.clone()),
            output: graph.output(),
        });
        graph.adopt(node)
    }

    pub fn input(&self) -> &InputPin<T> {
        &self.input
    }

    pub fn output(&self) -> &OutputPin<T> {
        &self.output
    }
}

impl<T: Item> Filter<T> for Inspect<T> {
    fn receive(&self, _pin: &InputPin<T>, item: T) -> anyhow::Result<()> {
        {
            let mut effect = self.effect.lock().unwrap_or_else(PoisonError::into_inner);
            (*effect)(&item);
        }
        self.output.send(item);
        Ok(())
    }
}
