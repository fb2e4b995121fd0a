//! Typed push-based object-flow graph.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────┐ send  ┌───────────┐ one job per attachment ┌──────────┐
//!  │ node A │──────▶│ OutputPin │───────────────────────▶│ InputPin │──▶ node B::receive
//!  └────────┘       └───────────┘        Dispatcher      └──────────┘
//! ```
//!
//! Nodes own their pins. An output pin holds its attachments; there is no
//! central graph at runtime. [`Graph`] is only the builder: it carries the
//! dispatcher every pin schedules on, the edge registry, and keep-alive
//! handles for nodes.
//!
//! Every edge is statically typed (`OutputPin<T>` only attaches to
//! `InputPin<T>`), so a mismatched delivery cannot be wired. The only untyped
//! entry point is [`InputPin::deliver_any`].

pub mod builder;
pub mod id;
pub mod item;
pub mod node;
pub mod nodes;
pub mod pin;
pub mod registry;
pub mod source;

pub use builder::Graph;
pub use id::{EdgeId, PinId};
pub use item::{FanOut, Item};
pub use node::{Filter, FnSource, Source};
pub use nodes::{ChannelSink, Combine, Delay, Inspect, Router, Transform};
pub use pin::{InputPin, OutputPin};
pub use registry::{Edge, EdgeRegistry, OutputPinInfo, TopologySnapshot};
pub use source::SourceAdapter;
