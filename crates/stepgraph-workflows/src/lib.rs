pub mod code_review;

use stepgraph_core::config::WorkflowsConfig;
use stepgraph_engine::StepRegistry;

pub use code_review::{code_review_graph, QualityGate};

/// Registry with every built-in step and router.
pub fn builtin_registry(config: &WorkflowsConfig) -> StepRegistry {
    let mut registry = StepRegistry::new();
    code_review::register(&mut registry, config);
    registry
}
