//! N-input combiner.
//!
//! Holds the latest value per input. Once every input has a value, all of
//! them are taken in input order, the held state is cleared and one composed
//! item is emitted. The check and the clear happen under one lock, so two
//! racing deliveries that complete the set cannot both fire.

use crate::error::{GraphError, Result};
use crate::graph::builder::Graph;
use crate::graph::item::Item;
use crate::graph::node::Filter;
use crate::graph::pin::{InputPin, OutputPin};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type ComposeFn<T, O> = Box<dyn Fn(Vec<T>) -> O + Send + Sync>;

pub struct Combine<T, O> {
    compose: ComposeFn<T, O>,
    inputs: Vec<InputPin<T>>,
    /// Latest value per input, indexed like `inputs`.
    held: Mutex<Vec<Option<T>>>,
    output: OutputPin<O>,
}

impl<T: Item, O: Item> Combine<T, O> {
    pub fn new(
        graph: &Graph,
        arity: usize,
        compose: impl Fn(Vec<T>) -> O + Send + Sync + 'static,
    ) -> Result<Arc<Self>> {
        if arity == 0 {
            return Err(GraphError::Config("combine needs at least one input".into()));
        }
        let node = Arc::new_cyclic(|me: &Weak<Self>| Self {
            compose: Box::new(compose),
            inputs: (0..arity).map(|_| InputPin::new(me.clone())).collect(),
            held: Mutex::new((0..arity).map(|_| None).collect()),
            output: graph.output(),
        });
        Ok(graph.adopt(node))
    }

    pub fn input(&self, index: usize) -> Option<&InputPin<T>> {
        self.inputs.get(index)
    }

    pub fn inputs(&self) -> &[InputPin<T>] {
        &self.inputs
    }

    pub fn output(&self) -> &OutputPin<O> {
        &self.output
    }

    /// Inputs currently holding a value.
    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|v| v.is_some()).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Option<T>>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Item, O: Item> Filter<T> for Combine<T, O> {
    fn receive(&self, pin: &InputPin<T>, item: T) -> anyhow::Result<()> {
        let index = self
            .inputs
            .iter()
            .position(|p| p == pin)
            .ok_or(GraphError::UnknownPin(pin.id()))?;

        let complete = {
            let mut held = self.lock();
            held[index] = Some(item);
            if held.iter().all(Option::is_some) {
                Some(held.iter_mut().filter_map(Option::take).collect::<Vec<T>>())
            } else {
                None
            }
        };

        if let Some(values) = complete {
            self.output.send((self.compose)(values));
        }
        Ok(())
    }
}
