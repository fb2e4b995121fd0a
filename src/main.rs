//! pingraph demo: a self-feeding counter loop.
//!
//! ```text
//!   ┌──────────────► source ──► delay ──► router ─┬─ even ─► inspect ─┐
//!   │                                             └─ odd ──► inspect ─┤
//!   └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `pingraph [config.toml] [--items N] [--interval-ms MS]`

use anyhow::Context;
use pingraph::{
    config::EngineConfig, telemetry, Delay, Graph, Inspect, Router, SourceAdapter,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const DEFAULT_ITEMS: u64 = 20;
const DEFAULT_INTERVAL_MS: u64 = 50;

struct Args {
    config: Option<PathBuf>,
    items: u64,
    interval: Duration,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Self {
            config: None,
            items: DEFAULT_ITEMS,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--items" => {
                    let value = args.next().context("--items needs a value")?;
                    parsed.items = value.parse().context("--items must be a number")?;
                }
                "--interval-ms" => {
                    let value = args.next().context("--interval-ms needs a value")?;
                    parsed.interval =
                        Duration::from_millis(value.parse().context("--interval-ms must be a number")?);
                }
                _ if parsed.config.is_none() && !arg.starts_with("--") => {
                    parsed.config = Some(PathBuf::from(arg));
                }
                _ => anyhow::bail!("unexpected argument '{}'", arg),
            }
        }
        Ok(parsed)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => EngineConfig::load_or_default(),
    };
    let _log_guard = telemetry::init(&config.logging)?;

    tracing::info!("Starting pingraph demo ({} items)", args.items);

    let (graph, pool) = Graph::from_config(&config)?;

    let counter = AtomicU64::new(0);
    let source = SourceAdapter::from_fn(&graph, move || -> anyhow::Result<u64> {
        Ok(counter.fetch_add(1, Ordering::Relaxed))
    });
    let delay = Delay::new(&graph, args.interval);
    let router = Router::new(&graph, |n: &u64| n % 2 == 0);

    let (seen_tx, seen_rx) = crossbeam_channel::unbounded();
    let even_tx = seen_tx.clone();
    let even = Inspect::new(&graph, move |n: &u64| {
        tracing::info!("even: {}", n);
        let _ = even_tx.send(*n);
    });
    let odd = Inspect::new(&graph, move |n: &u64| {
        tracing::info!("odd:  {}", n);
        let _ = seen_tx.send(*n);
    });

    graph.attach(source.output(), delay.input());
    graph.attach(delay.output(), router.input());
    graph.attach(router.success(), even.input());
    graph.attach(router.failure(), odd.input());
    graph.attach(even.output(), source.input());
    graph.attach(odd.output(), source.input());

    let topology = graph.topology();
    tracing::debug!("Topology: {}", serde_json::to_string(&topology)?);
    tracing::info!(
        "Wired {} nodes with {} edges",
        topology.nodes,
        topology.edges.len()
    );

    graph.inject(source.input(), 0);

    let timeout = args.interval * 10 + Duration::from_secs(5);
    for _ in 0..args.items {
        seen_rx
            .recv_timeout(timeout)
            .context("Loop stalled before producing every item")?;
    }

    pool.shutdown();
    let stats = pool.stats();
    tracing::info!(
        "Generated {} items; pool ran {} jobs ({} failed, {} dropped) on {} workers",
        source.generated(),
        stats.completed,
        stats.failed,
        stats.dropped,
        stats.workers
    );

    Ok(())
}
