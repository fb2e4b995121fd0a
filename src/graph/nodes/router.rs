//! Predicate split: each item goes out on `success` or `failure`.

use crate::graph::builder::Graph;
use crate::graph::item::Item;
use crate::graph::node::Filter;
use crate::graph::pin::{InputPin, OutputPin};
use std::sync::{Arc, Weak};

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Forwards each item unchanged to `success` or `failure`, never both.
pub struct Router<T> {
    predicate: Predicate<T>,
    input: InputPin<T>,
    success: OutputPin<T>,
    failure: OutputPin<T>,
}

impl<T: Item> Router<T> {
    pub fn new(graph: &Graph, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Arc<Self> {
        let node = Arc::new_cyclic(|me: &Weak<Self>| Self {
            predicate: Box::new(predicate),
            input: InputPin::new(me.clone()),
            success: graph.output(),
            failure: graph.output(),
        });
        graph.adopt(node)
    }

    pub fn input(&self) -> &InputPin<T> {
        &self.input
    }

    pub fn success(&self) -> &OutputPin<T> {
        &self.success
    }

    pub fn failure(&self) -> &OutputPin<T> {
        &self.failure
    }
}

impl<T: Item> Filter<T> for Router<T> {
    fn receive(&self, _pin: &InputPin<T>, item: T) -> anyhow::Result<()> {
        if (self.predicate)(&item) {
            self.success.send(item);
        } else {
            self.failure.send(item);
        }
        Ok(())
    }
}
