//! Recording node for integration tests

use pingraph::{Filter, Graph, InputPin, Item};
use std::sync::{Arc, Mutex, Weak};
use std::thread::ThreadId;
use std::time::Instant;

/// One observed delivery
pub struct Delivery<T> {
    pub at: Instant,
    pub thread: ThreadId,
    pub item: T,
}

/// Sink that records every delivery with its arrival time
pub struct Recorder<T> {
    deliveries: Mutex<Vec<Delivery<T>>>,
    input: InputPin<T>,
}

impl<T: Item> Recorder<T> {
    pub fn new(graph: &Graph) -> Arc<Self> {
        let node = Arc::new_cyclic(|me: &Weak<Self>| Self {
            deliveries: Mutex::new(Vec::new()),
            input: InputPin::new(me.clone()),
        });
        graph.adopt(node)
    }

    pub fn input(&self) -> &InputPin<T> {
        &self.input
    }

    pub fn len(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn take(&self) -> Vec<Delivery<T>> {
        std::mem::take(&mut *self.deliveries.lock().unwrap())
    }

    /// Block until at least `n` deliveries arrived or the timeout passes
    pub fn wait_for(&self, n: usize) -> bool {
        let deadline = Instant::now() + super::test_timeout();
        while self.len() < n {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        true
    }
}

impl<T: Item> Filter<T> for Recorder<T> {
    fn receive(&self, _pin: &InputPin<T>, item: T) -> anyhow::Result<()> {
        self.deliveries.lock().unwrap().push(Delivery {
            at: Instant::now(),
            thread: std::thread::current().id(),
            item,
        });
        Ok(())
    }
}
