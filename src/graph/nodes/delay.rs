//! Rate-limited pass-through.

use crate::graph::builder::Graph;
use crate::graph::item::Item;
use crate::graph::node::Filter;
use crate::graph::pin::{InputPin, OutputPin};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

/// Spaces deliveries at least `interval` apart.
///
/// A backlog is drained one item per interval. Time spent idle is not owed:
/// after a gap longer than the interval the next item goes straight through.
pub struct Delay<T> {
    interval: Duration,
    /// Guards the next allowed forwarding time.
    next_allowed: Mutex<Instant>,
    input: InputPin<T>,
    output: OutputPin<T>,
}

/// One scheduling step: how long this delivery waits, and the next allowed
/// time after it.
pub fn schedule(now: Instant, next_allowed: Instant, interval: Duration) -> (Duration, Instant) {
    let wait = next_allowed.saturating_duration_since(now);
    (wait, now.max(next_allowed) + interval)
}

impl<T: Item> Delay<T> {
    pub fn new(graph: &Graph, interval: Duration) -> Arc<Self> {
        let node = Arc::new_cyclic(|me: &Weak<Self>| Self {
            interval,
            next_allowed: Mutex::new(Instant::now()),
            input: InputPin::new(me.clone()),
            output: graph.output(),
        });
        graph.adopt(node)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn input(&self) -> &InputPin<T> {
        &self.input
    }

    pub fn output(&self) -> &OutputPin<T> {
        &self.output
    }

    fn reserve(&self) -> Duration {
        let mut next = self
            .next_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (wait, following) = schedule(Instant::now(), *next, self.interval);
        *next = following;
        wait
    }
}

impl<T: Item> Filter<T> for Delay<T> {
    fn receive(&self, _pin: &InputPin<T>, item: T) -> anyhow::Result<()> {
        // Slot is reserved under the lock; the wait itself happens outside it
        // so concurrent deliveries each sleep for their own slot.
        let wait = self.reserve();
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        self.output.send(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::StepDispatcher;
    use crate::graph::nodes::ChannelSink;
    use proptest::prelude::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    #[test]
    fn test_first_delivery_does_not_wait() {
        let earlier = Instant::now();
        let now = earlier + Duration::from_secs(1);
        let (wait, next) = schedule(now, earlier, INTERVAL);
        assert_eq!(wait, Duration::ZERO);
        assert_eq!(next, now + INTERVAL);
    }

    #[test]
    fn test_backlog_is_spaced() {
        let now = Instant::now();
        let mut next = now;
        let mut waits = Vec::new();
        for _ in 0..5 {
            let (wait, following) = schedule(now, next, INTERVAL);
            waits.push(wait);
            next = following;
        }
        assert_eq!(
            waits,
            (0..5u32).map(|i| INTERVAL * i).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_idle_gap_is_not_owed() {
        let start = Instant::now();
        let (_, next) = schedule(start, start, INTERVAL);
        let later = start + INTERVAL * 5;
        let (wait, following) = schedule(later, next, INTERVAL);
        assert_eq!(wait, Duration::ZERO);
        assert_eq!(following, later + INTERVAL);
    }

    #[test]
    fn test_forwards_unchanged() {
        let dispatcher = Arc::new(StepDispatcher::new());
        let graph = Graph::new(dispatcher.clone());
        let delay = Delay::new(&graph, Duration::from_millis(1));
        let (sink, rx) = ChannelSink::new(&graph);
        graph.attach(delay.output(), sink.input());

        graph.inject(delay.input(), "frame".to_string());
        dispatcher.run_until_idle();
        assert_eq!(rx.try_recv().unwrap(), "frame");
    }

    proptest! {
        #[test]
        fn prop_next_allowed_never_goes_back(
            offsets in prop::collection::vec(0u64..500, 1..50),
            interval_ms in 1u64..200,
        ) {
            let interval = Duration::from_millis(interval_ms);
            let base = Instant::now();
            let mut now = base;
            let mut next = base;
            for offset in offsets {
                now += Duration::from_millis(offset);
                let (wait, following) = schedule(now, next, interval);
                prop_assert!(following >= next);
                prop_assert!(following >= now + interval);
                prop_assert_eq!(now + wait, now.max(next));
                next = following;
            }
        }
    }
}
