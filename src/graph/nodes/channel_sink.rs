//! ChannelSink node: hands items to code outside the graph via a crossbeam
//! channel.

use crate::graph::builder::Graph;
use crate::graph::item::Item;
use crate::graph::node::Filter;
use crate::graph::pin::InputPin;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

pub struct ChannelSink<T> {
    tx: Sender<T>,
    dropped: AtomicU64,
    input: InputPin<T>,
}

impl<T: Item> ChannelSink<T> {
    pub fn new(graph: &Graph) -> (Arc<Self>, Receiver<T>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::with_sender(graph, tx), rx)
    }

    /// Sink that drops items instead of blocking once `capacity` are waiting.
    pub fn bounded(graph: &Graph, capacity: usize) -> (Arc<Self>, Receiver<T>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::with_sender(graph, tx), rx)
    }

    pub fn with_sender(graph: &Graph, tx: Sender<T>) -> Arc<Self> {
        let node = Arc::new_cyclic(|me: &Weak<Self>| Self {
            tx,
            dropped: AtomicU64::new(0),
            input: InputPin::new(me.clone()),
        });
        graph.adopt(node)
    }

    pub fn input(&self) -> &InputPin<T> {
        &self.input
    }

    /// Items lost to a full or disconnected channel.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T: Item> Filter<T> for ChannelSink<T> {
    fn receive(&self, _pin: &InputPin<T>, item: T) -> anyhow::Result<()> {
        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    tracing::warn!("ChannelSink dropped {} items due to backpressure", dropped);
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("ChannelSink receiver gone, item dropped");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::StepDispatcher;

    #[test]
    fn test_bounded_counts_drops() {
        let dispatcher = Arc::new(StepDispatcher::new());
        let graph = Graph::new(dispatcher.clone());
        let (sink, rx) = ChannelSink::bounded(&graph, 2);
        let feed = graph.injector(sink.input());
        for i in 0..5u8 {
            feed.send(i);
        }
        dispatcher.run_until_idle();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sink.dropped(), 3);
    }

    #[test]
    fn test_disconnected_receiver_is_not_an_error() {
        let dispatcher = Arc::new(StepDispatcher::new());
        let graph = Graph::new(dispatcher.clone());
        let (sink, rx) = ChannelSink::new(&graph);
        drop(rx);
        graph.inject(sink.input(), 1u32);
        assert_eq!(dispatcher.step(), Some(true));
        assert_eq!(sink.dropped(), 1);
    }
}
