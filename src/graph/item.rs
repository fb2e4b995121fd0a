//! Payload capability: how an item is handed to several consumers.
//!
//! Every type that flows across an edge declares its fan-out policy up front
//! by implementing [`Item`]. There is no runtime probing for cloneability, so
//! a mutable type cannot be silently shared between branches: without an
//! `Item` impl it cannot be sent at all.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fan-out policy for an item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// Every branch sees the same value. Consumers must treat it as read-only;
    /// the engine cannot enforce that.
    Shared,
    /// The first attachment gets the original, every other branch an
    /// independent deep copy.
    ClonePerBranch,
}

/// A value that can travel across an edge.
pub trait Item: Send + Sized + 'static {
    /// Policy the output pin applies when it has more than one attachment.
    const FAN_OUT: FanOut;

    /// Produce the value handed to one extra branch.
    ///
    /// Output pins call this once per extra attachment whatever the policy,
    /// so `fork` alone decides what a branch receives and `FAN_OUT` must
    /// describe it truthfully. For [`FanOut::Shared`] it must alias the same
    /// value (a copy of a `Copy` type, `Arc::clone`). For
    /// [`FanOut::ClonePerBranch`] it must be deep enough that mutating the
    /// result is never observable through `self`.
    fn fork(&self) -> Self;
}

/// Declare the fan-out policy of one or more types.
///
/// `clone_per_branch` accepts any `Clone` type. `shared` accepts only `Copy`
/// types; anything else that should be shared goes behind an `Arc`.
///
/// ```
/// #[derive(Clone)]
/// struct Frame { pixels: Vec<u8> }
///
/// pingraph::impl_item!(clone_per_branch: Frame);
/// ```
///
/// ```compile_fail
/// #[derive(Clone)]
/// struct Frame { pixels: Vec<u8> }
///
/// pingraph::impl_item!(shared: Frame);
/// ```
#[macro_export]
macro_rules! impl_item {
    (shared: $($t:ty),+ $(,)?) => {
        $(
            impl $crate::graph::Item for $t {
                const FAN_OUT: $crate::graph::FanOut = $crate::graph::FanOut::Shared;

                fn fork(&self) -> Self {
                    *self
                }
            }
        )+
    };
    (clone_per_branch: $($t:ty),+ $(,)?) => {
        $(
            impl $crate::graph::Item for $t {
                const FAN_OUT: $crate::graph::FanOut = $crate::graph::FanOut::ClonePerBranch;

                fn fork(&self) -> Self {
                    ::std::clone::Clone::clone(self)
                }
            }
        )+
    };
}

impl_item!(shared: (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, &'static str);
impl_item!(clone_per_branch: String);

impl<U: ?Sized + Send + Sync + 'static> Item for Arc<U> {
    const FAN_OUT: FanOut = FanOut::Shared;

    fn fork(&self) -> Self {
        Arc::clone(self)
    }
}

impl<T: Clone + Send + 'static> Item for Vec<T> {
    const FAN_OUT: FanOut = FanOut::ClonePerBranch;

    fn fork(&self) -> Self {
        self.clone()
    }
}

impl<T: Clone + Send + 'static> Item for Box<T> {
    const FAN_OUT: FanOut = FanOut::ClonePerBranch;

    fn fork(&self) -> Self {
        self.clone()
    }
}

impl<T: Item> Item for Option<T> {
    const FAN_OUT: FanOut = T::FAN_OUT;

    fn fork(&self) -> Self {
        self.as_ref().map(Item::fork)
    }
}
