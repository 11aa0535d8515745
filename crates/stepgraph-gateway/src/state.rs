use std::sync::Arc;

use stepgraph_core::config::GatewayConfig;
use stepgraph_engine::StepRegistry;

use crate::store::{GraphStore, RunStore};

/// Shared application state for axum handlers.
pub struct AppState {
    pub registry: Arc<StepRegistry>,
    pub graphs: GraphStore,
    pub runs: RunStore,
}

impl AppState {
    pub fn new(config: &GatewayConfig, registry: Arc<StepRegistry>) -> Self {
        Self {
            registry,
            graphs: GraphStore::new(config.id_length),
            runs: RunStore::new(config.id_length),
        }
    }
}
