//! Reusable node implementations.
//!
//! Each constructor takes the [`Graph`](crate::graph::Graph), builds the node
//! around its own pins and registers it for keep-alive.
//!
//! | Node          | Inputs | Outputs              | State                     |
//! |---------------|--------|----------------------|---------------------------|
//! | `Delay`       | 1      | 1                    | next allowed time         |
//! | `Transform`   | 1      | 1                    | none                      |
//! | `Router`      | 1      | `success`, `failure` | none                      |
//! | `Combine`     | N      | 1                    | latest value per input    |
//! | `Inspect`     | 1      | 1                    | the side effect itself    |
//! | `ChannelSink` | 1      | channel              | drop counter              |

pub mod channel_sink;
pub mod combine;
pub mod delay;
pub mod inspect;
pub mod router;
pub mod transform;

pub use channel_sink::ChannelSink;
pub use combine::Combine;
pub use delay::Delay;
pub use inspect::Inspect;
pub use router::Router;
pub use transform::Transform;
