//! # pingraph: push-based object-flow graph engine
//!
//! Nodes exchange typed items through pins. Calling `send` on an output pin
//! schedules one delivery per attached input pin on a shared [`Dispatcher`]
//! and returns at once; each delivery runs the receiving node's
//! [`Filter::receive`] as an independent job. Because every edge traversal is
//! its own job, feedback cycles are legal and never grow a call stack.
//!
//! ## Architecture
//!
//! - **Graph**: pins, node contracts, builder and edge registry
//! - **Nodes**: delay, transform, router, combiner, inspector, channel sink
//! - **Dispatch**: growable worker pool, deterministic step queue, tokio
//!   blocking pool, all under one supervision policy
//! - **Config**: TOML/JSON engine settings with platform default location
//!
//! ## Configuration
//!
//! Engine settings are read from `$PINGRAPH_CONFIG` if set, otherwise from
//! the platform config directory:
//!
//! - **Linux**: `~/.config/pingraph/engine.toml`
//! - **macOS**: `~/Library/Application Support/pingraph/engine.toml`
//! - **Windows**: `%APPDATA%\pingraph\engine.toml`
//!
//! ## Example
//!
//! ```no_run
//! use pingraph::{ChannelSink, Delay, EngineConfig, Graph};
//! use std::time::Duration;
//!
//! fn main() -> pingraph::Result<()> {
//!     let (graph, pool) = Graph::from_config(&EngineConfig::default())?;
//!
//!     let delay = Delay::new(&graph, Duration::from_millis(100));
//!     let (sink, rx) = ChannelSink::new(&graph);
//!     graph.attach(delay.output(), sink.input());
//!
//!     let feed = graph.injector(delay.input());
//!     for frame in 0..5u32 {
//!         feed.send(frame);
//!     }
//!     for _ in 0..5 {
//!         println!("{:?}", rx.recv());
//!     }
//!     pool.shutdown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod telemetry;

// Re-export commonly used types
pub use config::EngineConfig;
pub use dispatch::{Dispatcher, StepDispatcher, WorkerPool};
pub use error::{GraphError, Result};
pub use graph::{
    ChannelSink, Combine, Delay, FanOut, Filter, Graph, InputPin, Inspect, Item, OutputPin,
    Router, Source, SourceAdapter, Transform,
};
