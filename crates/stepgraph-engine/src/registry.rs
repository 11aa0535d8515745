use std::collections::HashMap;
use std::sync::Arc;

use stepgraph_core::traits::Router;

use crate::graph::Step;

/// Caller-owned registry of step and router implementations, keyed by
/// function name. Graph descriptions resolve their functions through it.
pub struct StepRegistry {
    steps: HashMap<String, Step>,
    routers: HashMap<String, Arc<dyn Router>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            routers: HashMap::new(),
        }
    }

    /// Register a step, replacing any previous one with the same name.
    pub fn register_step(&mut self, name: impl Into<String>, step: Step) {
        self.steps.insert(name.into(), step);
    }

    /// Register a router, replacing any previous one with the same name.
    pub fn register_router(&mut self, name: impl Into<String>, router: impl Router) {
        self.routers.insert(name.into(), Arc::new(router));
    }

    /// Unregister a step by name.
    pub fn unregister_step(&mut self, name: &str) -> bool {
        self.steps.remove(name).is_some()
    }

    pub fn step(&self, name: &str) -> Option<Step> {
        self.steps.get(name).cloned()
    }

    pub fn router(&self, name: &str) -> Option<Arc<dyn Router>> {
        self.routers.get(name).cloned()
    }

    /// Registered step names, sorted.
    pub fn step_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Registered router names, sorted.
    pub fn router_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.steps.len() + self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.routers.is_empty()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}
