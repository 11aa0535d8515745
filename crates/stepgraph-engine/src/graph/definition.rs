use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use stepgraph_core::context::RunContext;
use stepgraph_core::error::Result;
use stepgraph_core::traits::Router;

use super::step::Step;

/// Reserved step name that ends a run. Never looked up as a step.
pub const END: &str = "END";

/// Outgoing transition of a step, in precedence order.
pub enum Transition<'a> {
    /// A router decides the successor at run time.
    Conditional(&'a Arc<dyn Router>),
    /// Fixed successor.
    Linear(&'a str),
    /// No outgoing edge; the run ends after this step.
    Terminal,
}

/// Static description of a graph: steps, entry point, and transitions.
///
/// Successor names are not checked against the registered steps here; the
/// executor resolves them lazily when a run reaches them.
#[derive(Clone, Default)]
pub struct GraphDefinition {
    steps: HashMap<String, Step>,
    edges: HashMap<String, String>,
    conditional_edges: HashMap<String, Arc<dyn Router>>,
    entry_point: Option<String>,
}

impl GraphDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step under `name`, replacing any previous one.
    pub fn add_node(&mut self, name: impl Into<String>, step: Step) -> &mut Self {
        self.steps.insert(name.into(), step);
        self
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry_point = Some(name.into());
        self
    }

    /// Add a linear edge. A source has at most one; re-adding replaces it.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.insert(from.into(), to.into());
        self
    }

    /// Add a conditional edge from a closure. Takes precedence over a linear
    /// edge from the same source.
    pub fn add_conditional_edge<F>(&mut self, from: impl Into<String>, router: F) -> &mut Self
    where
        F: Fn(&mut RunContext) -> Result<String> + Send + Sync + 'static,
    {
        self.add_router(from, Arc::new(router))
    }

    /// Add a conditional edge from a shared router, e.g. one taken from a
    /// `StepRegistry`.
    pub fn add_router(&mut self, from: impl Into<String>, router: Arc<dyn Router>) -> &mut Self {
        self.conditional_edges.insert(from.into(), router);
        self
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    pub fn contains_step(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Registered step names, sorted.
    pub fn step_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Linear successor of `from`, if any.
    pub fn edge(&self, from: &str) -> Option<&str> {
        self.edges.get(from).map(|s| s.as_str())
    }

    pub fn has_conditional_edge(&self, from: &str) -> bool {
        self.conditional_edges.contains_key(from)
    }

    /// Outgoing transition of `from`: conditional, then linear, then terminal.
    pub fn transition(&self, from: &str) -> Transition<'_> {
        if let Some(router) = self.conditional_edges.get(from) {
            Transition::Conditional(router)
        } else if let Some(to) = self.edges.get(from) {
            Transition::Linear(to.as_str())
        } else {
            Transition::Terminal
        }
    }

    pub fn terminal_marker(&self) -> &'static str {
        END
    }
}

impl fmt::Debug for GraphDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut conditional: Vec<&str> =
            self.conditional_edges.keys().map(|s| s.as_str()).collect();
        conditional.sort_unstable();
        f.debug_struct("GraphDefinition")
            .field("steps", &self.step_names())
            .field("edges", &self.edges)
            .field("conditional_edges", &conditional)
            .field("entry_point", &self.entry_point)
            .finish()
    }
}
