//! Input and output pins.
//!
//! An [`InputPin`] belongs to exactly one node for its whole life and hands
//! deliveries to that node's [`Filter::receive`]. An [`OutputPin`] holds an
//! ordered set of attached input pins and fans every sent item out to all of
//! them, each delivery scheduled as its own job on the dispatcher.
//!
//! # Fan-out
//!
//! | attachments | delivery                                                         |
//! |-------------|------------------------------------------------------------------|
//! | 0           | item dropped, nothing scheduled                                  |
//! | 1           | item moved into one job                                          |
//! | N ≥ 2       | first attachment gets the original, the rest get `Item::fork()`  |
//!
//! All forks are taken before any job is scheduled, so a consumer that starts
//! mutating the original can never race a fork still being made from it.

use crate::dispatch::Dispatcher;
use crate::error::{GraphError, Result};
use crate::graph::id::PinId;
use crate::graph::item::{FanOut, Item};
use crate::graph::node::Filter;
use crate::graph::registry::{EdgeRegistry, OutputPinInfo};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Connection point that delivers into its owning node.
pub struct InputPin<T> {
    id: PinId,
    owner: Weak<dyn Filter<T>>,
}

impl<T> InputPin<T> {
    /// Bind a new pin to `owner`. Typically called inside `Arc::new_cyclic`.
    pub fn new(owner: Weak<dyn Filter<T>>) -> Self {
        Self {
            id: PinId::next(),
            owner,
        }
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    /// Hand `item` to the owner. An item for an owner that no longer exists
    /// is discarded.
    pub fn deliver(&self, item: T) -> anyhow::Result<()> {
        match self.owner.upgrade() {
            Some(owner) => owner.receive(self, item),
            None => {
                tracing::debug!("{} has no live owner, item discarded", self.id);
                Ok(())
            }
        }
    }
}

impl<T: 'static> InputPin<T> {
    /// Untyped entry point for callers holding erased payloads.
    pub fn deliver_any(&self, item: Box<dyn Any + Send>) -> Result<()> {
        let item = item.downcast::<T>().map_err(|_| GraphError::TypeMismatch {
            pin: self.id,
            expected: std::any::type_name::<T>(),
        })?;
        self.deliver(*item).map_err(|e| {
            GraphError::Dispatch(format!("delivery on {} failed: {:#}", self.id, e))
        })
    }
}

impl<T> Clone for InputPin<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            owner: Weak::clone(&self.owner),
        }
    }
}

impl<T> PartialEq for InputPin<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for InputPin<T> {}

impl<T> fmt::Debug for InputPin<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputPin({})", self.id.0)
    }
}

/// Connection point that fans items out to every attached input pin.
pub struct OutputPin<T> {
    id: PinId,
    /// Copy-on-write so `send` never holds the lock while scheduling.
    attachments: RwLock<Arc<[InputPin<T>]>>,
    dispatcher: Arc<dyn Dispatcher>,
    registry: Option<Arc<EdgeRegistry>>,
}

impl<T: Item> OutputPin<T> {
    /// Output pin scheduling on `dispatcher`, not tracked by any registry.
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            id: PinId::next(),
            attachments: RwLock::new(Arc::from(Vec::new())),
            dispatcher,
            registry: None,
        }
    }

    /// Output pin whose edges are recorded in `registry`.
    pub fn with_registry(dispatcher: Arc<dyn Dispatcher>, registry: Arc<EdgeRegistry>) -> Self {
        let mut pin = Self::new(dispatcher);
        registry.register_output(OutputPinInfo {
            id: pin.id,
            item_type: std::any::type_name::<T>(),
            fan_out: T::FAN_OUT,
        });
        pin.registry = Some(registry);
        pin
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    pub fn fan_out(&self) -> FanOut {
        T::FAN_OUT
    }

    /// Attach `pin`. Attaching a pin that is already present does nothing.
    pub fn attach(&self, pin: &InputPin<T>) {
        let mut attachments = self
            .attachments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if attachments.iter().any(|p| p == pin) {
            tracing::trace!("{} already attached to {}", pin.id, self.id);
            return;
        }

        let mut next = attachments.to_vec();
        next.push(pin.clone());
        *attachments = Arc::from(next);
        drop(attachments);

        if let Some(registry) = &self.registry {
            registry.record(self.id, pin.id);
        }
        tracing::debug!("Attached {} -> {}", self.id, pin.id);
    }

    pub fn is_attached(&self, pin: &InputPin<T>) -> bool {
        self.snapshot().iter().any(|p| p == pin)
    }

    /// Attached pins in attach order.
    pub fn attachments(&self) -> Vec<InputPin<T>> {
        self.snapshot().to_vec()
    }

    pub fn attachment_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Schedule one delivery of `item` per attachment and return immediately.
    pub fn send(&self, item: T) {
        let targets = self.snapshot();
        let Some((first, rest)) = targets.split_first() else {
            tracing::trace!("{} has no attachments, item dropped", self.id);
            return;
        };

        if !rest.is_empty() {
            tracing::trace!(
                "{} fanning out to {} pins ({:?})",
                self.id,
                targets.len(),
                T::FAN_OUT
            );
        }
        let forks: Vec<T> = rest.iter().map(|_| item.fork()).collect();
        for (pin, fork) in rest.iter().zip(forks) {
            self.schedule(pin.clone(), fork);
        }
        self.schedule(first.clone(), item);
    }

    fn schedule(&self, pin: InputPin<T>, item: T) {
        self.dispatcher.dispatch(Box::new(move || pin.deliver(item)));
    }

    fn snapshot(&self) -> Arc<[InputPin<T>]> {
        Arc::clone(&self.attachments.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<T> fmt::Debug for OutputPin<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputPin({})", self.id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{MockDispatcher, StepDispatcher};
    use std::sync::Mutex;

    /// Records every delivery with the pin it arrived on.
    struct Capture<T> {
        received: Mutex<Vec<(PinId, T)>>,
        input: InputPin<T>,
    }

    impl<T: Send + 'static> Capture<T> {
        fn new() -> Arc<Self> {
            Arc::new_cyclic(|me: &Weak<Self>| Self {
                received: Mutex::new(Vec::new()),
                input: InputPin::new(me.clone()),
            })
        }

        fn take(&self) -> Vec<(PinId, T)> {
            std::mem::take(&mut *self.received.lock().unwrap())
        }
    }

    impl<T: Send + 'static> Filter<T> for Capture<T> {
        fn receive(&self, pin: &InputPin<T>, item: T) -> anyhow::Result<()> {
            self.received.lock().unwrap().push((pin.id(), item));
            Ok(())
        }
    }

    fn step() -> Arc<StepDispatcher> {
        Arc::new(StepDispatcher::new())
    }

    #[test]
    fn test_attach_twice_delivers_once() {
        let dispatcher = step();
        let capture = Capture::<u32>::new();
        let out = OutputPin::<u32>::new(dispatcher.clone());
        out.attach(&capture.input);
        out.attach(&capture.input);
        assert_eq!(out.attachment_count(), 1);

        out.send(7);
        assert_eq!(dispatcher.run_until_idle(), 1);
        assert_eq!(capture.take(), vec![(capture.input.id(), 7)]);
    }

    #[test]
    fn test_send_without_attachments_schedules_nothing() {
        let mut mock = MockDispatcher::new();
        mock.expect_dispatch().times(0);
        let out = OutputPin::<u32>::new(Arc::new(mock));
        out.send(1);
    }

    #[test]
    fn test_one_job_per_attachment() {
        let mut mock = MockDispatcher::new();
        mock.expect_dispatch().times(3).return_const(());
        let out = OutputPin::<String>::new(Arc::new(mock));
        let captures: Vec<_> = (0..3).map(|_| Capture::<String>::new()).collect();
        for p in &captures {
            out.attach(&p.input);
        }
        out.send("frame".to_string());
    }

    #[test]
    fn test_send_does_not_run_deliveries_inline() {
        let dispatcher = step();
        let capture = Capture::<u8>::new();
        let out = OutputPin::<u8>::new(dispatcher.clone());
        out.attach(&capture.input);
        out.send(1);
        assert!(capture.take().is_empty());
        assert_eq!(dispatcher.pending(), 1);
    }

    #[test]
    fn test_attachment_order_is_stable() {
        let out = OutputPin::<u8>::new(step());
        let a = Capture::<u8>::new();
        let b = Capture::<u8>::new();
        let c = Capture::<u8>::new();
        out.attach(&b.input);
        out.attach(&a.input);
        out.attach(&c.input);
        out.attach(&b.input);
        let ids: Vec<_> = out.attachments().iter().map(InputPin::id).collect();
        assert_eq!(ids, vec![b.input.id(), a.input.id(), c.input.id()]);
    }

    #[test]
    fn test_first_attachment_gets_original() {
        let dispatcher = step();
        let out = OutputPin::<Box<Vec<u8>>>::new(dispatcher.clone());
        let captures: Vec<_> = (0..3).map(|_| Capture::<Box<Vec<u8>>>::new()).collect();
        for p in &captures {
            out.attach(&p.input);
        }

        let original = Box::new(vec![1u8, 2, 3]);
        let address = &*original as *const Vec<u8> as usize;
        out.send(original);
        dispatcher.run_until_idle();

        let mut received: Vec<_> = captures.iter().map(|p| p.take().remove(0).1).collect();
        let addr = |b: &Box<Vec<u8>>| &**b as *const Vec<u8> as usize;
        assert_eq!(addr(&received[0]), address);
        assert_ne!(addr(&received[1]), address);
        assert_ne!(addr(&received[2]), address);

        received[1][0] = 99;
        assert_eq!(received[0][0], 1);
        assert_eq!(received[2][0], 1);
    }

    #[test]
    fn test_shared_items_alias() {
        let dispatcher = step();
        let out = OutputPin::<Arc<String>>::new(dispatcher.clone());
        let a = Capture::<Arc<String>>::new();
        let b = Capture::<Arc<String>>::new();
        out.attach(&a.input);
        out.attach(&b.input);
        assert_eq!(out.fan_out(), FanOut::Shared);

        let value = Arc::new("shared".to_string());
        out.send(Arc::clone(&value));
        dispatcher.run_until_idle();
        assert!(Arc::ptr_eq(&a.take()[0].1, &value));
        assert!(Arc::ptr_eq(&b.take()[0].1, &value));
    }

    #[test]
    fn test_registry_records_edges() {
        let registry = Arc::new(EdgeRegistry::new());
        let out = OutputPin::<u8>::with_registry(step(), registry.clone());
        let capture = Capture::<u8>::new();
        out.attach(&capture.input);
        out.attach(&capture.input);
        assert!(registry.is_attached(out.id(), capture.input.id()));
        assert_eq!(registry.edge_count(), 1);
    }

    #[test]
    fn test_deliver_any_type_mismatch() {
        let capture = Capture::<u32>::new();
        let err = capture.input.deliver_any(Box::new("wrong")).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
        assert!(capture.take().is_empty());

        capture.input.deliver_any(Box::new(5u32)).unwrap();
        assert_eq!(capture.take()[0].1, 5);
    }

    #[test]
    fn test_dead_owner_discards() {
        let capture = Capture::<u8>::new();
        let pin = capture.input.clone();
        drop(capture);
        assert!(pin.deliver(1).is_ok());
    }
}
