//! Source adapter: pull-style generation inside the push graph.
//!
//! The adapter owns one trigger input and one output. Every delivery to the
//! trigger is dropped on arrival, then the wrapped [`Source`] is asked for a
//! new item, which is sent on the output. Wiring the output back into the
//! trigger (directly or through other nodes) gives a self-sustaining loop;
//! each hop is a fresh dispatcher job, so the loop never grows a stack.
//!
//! The trigger type defaults to the source's own item type so the output can
//! be fed straight back. Any other [`Item`] type works as a trigger too.

use crate::graph::builder::Graph;
use crate::graph::item::Item;
use crate::graph::node::{Filter, FnSource, Source};
use crate::graph::pin::{InputPin, OutputPin};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

pub struct SourceAdapter<S: Source, G: Item = <S as Source>::Item> {
    source: S,
    input: InputPin<G>,
    output: OutputPin<S::Item>,
    generated: AtomicU64,
}

impl<S: Source, G: Item> SourceAdapter<S, G> {
    pub fn new(graph: &Graph, source: S) -> Arc<Self> {
        let node = Arc::new_cyclic(|me: &Weak<Self>| Self {
            source,
            input: InputPin::new(me.clone()),
            output: graph.output(),
            generated: AtomicU64::new(0),
        });
        graph.adopt(node)
    }

    pub fn input(&self) -> &InputPin<G> {
        &self.input
    }

    pub fn output(&self) -> &OutputPin<S::Item> {
        &self.output
    }

    /// Successful `generate` calls so far.
    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    /// Schedule one generation without a trigger item.
    pub fn start(self: &Arc<Self>, graph: &Graph) {
        let me = Arc::downgrade(self);
        graph.dispatcher().dispatch(Box::new(move || match me.upgrade() {
            Some(node) => node.fire(),
            None => Ok(()),
        }));
    }

    fn fire(&self) -> anyhow::Result<()> {
        let item = self.source.generate()?;
        let count = self.generated.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("{} generated item #{}", self.output.id(), count);
        self.output.send(item);
        Ok(())
    }
}

impl<F, T> SourceAdapter<FnSource<F>>
where
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    T: Item,
{
    /// Adapter over a closure, triggered by its own item type.
    pub fn from_fn(graph: &Graph, f: F) -> Arc<Self> {
        Self::new(graph, FnSource::new(f))
    }
}

impl<S: Source, G: Item> Filter<G> for SourceAdapter<S, G> {
    fn receive(&self, _pin: &InputPin<G>, trigger: G) -> anyhow::Result<()> {
        drop(trigger);
        self.fire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::StepDispatcher;
    use crate::graph::nodes::ChannelSink;
    use std::sync::atomic::AtomicUsize;

    /// Counts how many times it has been dropped.
    struct Token(Arc<AtomicUsize>);

    impl Drop for Token {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Item for Token {
        const FAN_OUT: crate::graph::FanOut = crate::graph::FanOut::ClonePerBranch;

        fn fork(&self) -> Self {
            Token(Arc::clone(&self.0))
        }
    }

    #[test]
    fn test_trigger_generates_one_item() {
        let dispatcher = Arc::new(StepDispatcher::new());
        let graph = Graph::new(dispatcher.clone());
        let counter = AtomicU64::new(100);
        let source = SourceAdapter::from_fn(&graph, move || -> anyhow::Result<u64> {
            Ok(counter.fetch_add(1, Ordering::SeqCst))
        });
        let (sink, rx) = ChannelSink::new(&graph);
        graph.attach(source.output(), sink.input());

        graph.inject(source.input(), 0u64);
        dispatcher.run_until_idle();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![100]);
        assert_eq!(source.generated(), 1);
    }

    #[test]
    fn test_trigger_is_released_before_generate() {
        let dispatcher = Arc::new(StepDispatcher::new());
        let graph = Graph::new(dispatcher.clone());
        let drops = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&drops);
        let source: Arc<SourceAdapter<_, Token>> =
            SourceAdapter::new(&graph, FnSource::new(move || -> anyhow::Result<usize> {
                Ok(seen.load(Ordering::SeqCst))
            }));
        let (sink, rx) = ChannelSink::new(&graph);
        graph.attach(source.output(), sink.input());

        graph.inject(source.input(), Token(Arc::clone(&drops)));
        dispatcher.run_until_idle();
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[test]
    fn test_start_without_trigger() {
        let dispatcher = Arc::new(StepDispatcher::new());
        let graph = Graph::new(dispatcher.clone());
        let source = SourceAdapter::from_fn(&graph, || -> anyhow::Result<u8> { Ok(7) });
        let (sink, rx) = ChannelSink::new(&graph);
        graph.attach(source.output(), sink.input());

        source.start(&graph);
        dispatcher.run_until_idle();
        assert_eq!(rx.try_recv().unwrap(), 7);
    }

    #[test]
    fn test_generate_error_truncates_branch() {
        let dispatcher = Arc::new(StepDispatcher::new());
        let graph = Graph::new(dispatcher.clone());
        let source = SourceAdapter::from_fn(&graph, || -> anyhow::Result<u8> {
            anyhow::bail!("device gone")
        });
        let (sink, rx) = ChannelSink::new(&graph);
        graph.attach(source.output(), sink.input());

        graph.inject(source.input(), 0u8);
        dispatcher.run_until_idle();
        assert!(rx.try_recv().is_err());
        assert_eq!(source.generated(), 0);
        assert_eq!(dispatcher.failures(), 1);
    }

    #[test]
    fn test_self_cycle_steps() {
        let dispatcher = Arc::new(StepDispatcher::new());
        let graph = Graph::new(dispatcher.clone());
        let source = SourceAdapter::from_fn(&graph, || -> anyhow::Result<()> { Ok(()) });
        graph.attach(source.output(), source.input());

        graph.inject(source.input(), ());
        assert_eq!(dispatcher.run_steps(50), 50);
        assert_eq!(source.generated(), 50);
        assert_eq!(dispatcher.pending(), 1);
    }
}
