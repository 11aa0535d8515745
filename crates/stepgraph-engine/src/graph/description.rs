use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use stepgraph_core::error::{Result, StepGraphError};
use stepgraph_core::traits::Router;

use super::definition::GraphDefinition;
use super::edge::{Condition, ConditionOp, ExprRouter};
use crate::registry::StepRegistry;

/// A step in a graph description: the step's name in this graph and the
/// registry function that implements it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    pub function_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDescription {
    pub from_node: String,
    pub to_node: String,
}

/// How a conditional edge picks its successor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteDescription {
    /// A router registered by name.
    Named { router: String },
    /// A threshold rule given field by field.
    Rule {
        key: String,
        op: ConditionOp,
        value: Value,
        then: String,
        otherwise: String,
    },
    /// The same rule written as a `key OP value` expression.
    Expression {
        condition: String,
        then: String,
        otherwise: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalEdgeDescription {
    pub from_node: String,
    #[serde(flatten)]
    pub route: RouteDescription,
}

/// Serializable description of a graph, resolved against a `StepRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDescription {
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub edges: Vec<EdgeDescription>,
    #[serde(default)]
    pub conditional_edges: Vec<ConditionalEdgeDescription>,
    pub entry_point: String,
}

impl GraphDescription {
    /// Assemble a `GraphDefinition`.
    ///
    /// Unknown function or router names fail here with `UnknownFunction`;
    /// malformed conditions fail with `InvalidCondition`. Edge targets are
    /// left unchecked, as for hand-built graphs.
    pub fn build(&self, registry: &StepRegistry) -> Result<GraphDefinition> {
        let mut graph = GraphDefinition::new();

        for node in &self.nodes {
            let step = registry
                .step(&node.function_name)
                .ok_or_else(|| StepGraphError::UnknownFunction(node.function_name.clone()))?;
            graph.add_node(node.name.clone(), step);
        }

        for edge in &self.edges {
            graph.add_edge(edge.from_node.clone(), edge.to_node.clone());
        }

        for cond in &self.conditional_edges {
            let router: Arc<dyn Router> = match &cond.route {
                RouteDescription::Named { router } => registry
                    .router(router)
                    .ok_or_else(|| StepGraphError::UnknownFunction(router.clone()))?,
                RouteDescription::Rule {
                    key,
                    op,
                    value,
                    then,
                    otherwise,
                } => Arc::new(ExprRouter::new(
                    Condition::new(key.clone(), *op, value.clone()),
                    then.clone(),
                    otherwise.clone(),
                )),
                RouteDescription::Expression {
                    condition,
                    then,
                    otherwise,
                } => Arc::new(ExprRouter::parse(condition, then.clone(), otherwise.clone())?),
            };
            graph.add_router(cond.from_node.clone(), router);
        }

        graph.set_entry_point(self.entry_point.clone());

        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            conditional_edges = self.conditional_edges.len(),
            entry = %self.entry_point,
            "Assembled graph from description"
        );

        Ok(graph)
    }
}
