//! Node contracts.
//!
//! - **`Filter<T>`**: anything that accepts deliveries on its `InputPin<T>`s.
//!   A node with inputs of different types implements `Filter` once per type.
//! - **`Source`**: a pull-style generator, lifted into the push model by
//!   [`SourceAdapter`](crate::graph::SourceAdapter).
//!
//! `receive` takes `&self`: deliveries to the same node run concurrently on
//! different workers, so any private state lives behind the node's own lock.

use crate::graph::item::Item;
use crate::graph::pin::InputPin;

/// Receive contract shared by every node.
pub trait Filter<T>: Send + Sync {
    /// Handle one item delivered on `pin`.
    ///
    /// The node may call `send` on any output it owns, zero or more times,
    /// now or later from retained state. Returning `Err` (or panicking) loses
    /// this unit of work only; the dispatcher's supervision policy decides
    /// what gets logged.
    fn receive(&self, pin: &InputPin<T>, item: T) -> anyhow::Result<()>;
}

/// Pull-style generator.
pub trait Source: Send + Sync + 'static {
    type Item: Item;

    /// Produce the next item. May block for as long as it needs.
    fn generate(&self) -> anyhow::Result<Self::Item>;
}

/// Closure-backed [`Source`].
pub struct FnSource<F> {
    f: F,
}

impl<F> FnSource<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, T> Source for FnSource<F>
where
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    T: Item,
{
    type Item = T;

    fn generate(&self) -> anyhow::Result<T> {
        (self.f)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_fn_source_generates() {
        let counter = AtomicU64::new(0);
        let source = FnSource::new(move || -> anyhow::Result<u64> {
            Ok(counter.fetch_add(1, Ordering::SeqCst))
        });
        assert_eq!(source.generate().unwrap(), 0);
        assert_eq!(source.generate().unwrap(), 1);
    }

    #[test]
    fn test_fn_source_propagates_error() {
        let source = FnSource::new(|| -> anyhow::Result<u8> { anyhow::bail!("offline") });
        let err = source.generate().unwrap_err();
        assert_eq!(err.to_string(), "offline");
    }
}
