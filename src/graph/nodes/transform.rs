//! Stateless map from one item type to another.

use crate::graph::builder::Graph;
use crate::graph::item::Item;
use crate::graph::node::Filter;
use crate::graph::pin::{InputPin, OutputPin};
use std::sync::{Arc, Weak};

type MapFn<I, O> = Box<dyn Fn(I) -> O + Send + Sync>;

/// Applies a total function to every item and forwards the result.
pub struct Transform<I, O = I> {
    map: MapFn<I, O>,
    input: InputPin<I>,
    output: OutputPin<O>,
}

impl<I: Item, O: Item> Transform<I, O> {
    pub fn new(graph: &Graph, map: impl Fn(I) -> O + Send + Sync + 'static) -> Arc<Self> {
        let node = Arc::new_cyclic(|me: &Weak<Self>| Self {
            map: Box::new(map),
            input: InputPin::new(me.clone()),
            output: graph.output(),
        });
        graph.adopt(node)
    }

    pub fn input(&self) -> &InputPin<I> {
        &self.input
    }

    pub fn output(&self) -> &OutputPin<O> {
        &self.output
    }
}

impl<I: Item, O: Item> Filter<I> for Transform<I, O> {
    fn receive(&self, _pin: &InputPin<I>, item: I) -> anyhow::Result<()> {
        self.output.send((self.map)(item));
        Ok(())
    }
}
