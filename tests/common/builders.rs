//! Test data builders for engine configuration and graphs

use pingraph::config::{DispatcherConfig, EngineConfig, Overflow, QueuePolicy, Supervision};
use pingraph::{Graph, StepDispatcher, WorkerPool};
use std::sync::Arc;

/// Builder for creating test EngineConfigs
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn workers(mut self, min: usize, max: usize) -> Self {
        self.config.dispatcher.min_workers = min;
        self.config.dispatcher.max_workers = max;
        self
    }

    pub fn bounded(mut self, capacity: usize, overflow: Overflow) -> Self {
        self.config.dispatcher.queue = QueuePolicy::Bounded { capacity, overflow };
        self
    }

    pub fn supervision(mut self, supervision: Supervision) -> Self {
        self.config.supervision = supervision;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

/// Graph on a deterministic step dispatcher
pub fn step_graph() -> (Graph, Arc<StepDispatcher>) {
    let dispatcher = Arc::new(StepDispatcher::new());
    (Graph::new(dispatcher.clone()), dispatcher)
}

/// Graph on a small fixed-size pool
pub fn pool_graph(workers: usize) -> (Graph, WorkerPool) {
    let config = ConfigBuilder::new().workers(workers, workers).build();
    Graph::from_config(&config).unwrap()
}

/// Graph on a growable pool
pub fn growable_graph(min: usize, max: usize) -> (Graph, WorkerPool) {
    let pool = WorkerPool::new(
        DispatcherConfig {
            min_workers: min,
            max_workers: max,
            ..DispatcherConfig::default()
        },
        Supervision::LogAndDrop,
    )
    .unwrap();
    (Graph::new(Arc::new(pool.clone())), pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .workers(2, 8)
            .bounded(16, Overflow::DropNewest)
            .supervision(Supervision::HaltDispatcher)
            .build();

        assert_eq!(config.dispatcher.min_workers, 2);
        assert_eq!(config.dispatcher.max_workers, 8);
        assert!(config.validate().is_ok());
        assert_eq!(config.supervision, Supervision::HaltDispatcher);
    }
}
