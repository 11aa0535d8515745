//! Graph step executor.
//!
//! A graph is a set of named `Step`s, an entry point, linear edges (fixed
//! successor) and conditional edges (a `Router` picks the successor from the
//! run context). The `GraphExecutor` walks the graph from the entry point,
//! running one step at a time against a fresh `RunContext`, until it reaches
//! the `END` marker, a step with no outgoing edge, or `MAX_STEPS` executions.

pub mod definition;
pub mod description;
pub mod edge;
pub mod executor;
pub mod step;

pub use definition::{GraphDefinition, Transition, END};
pub use description::{
    ConditionalEdgeDescription, EdgeDescription, GraphDescription, NodeDescription,
    RouteDescription,
};
pub use edge::{Condition, ConditionOp, ExprRouter};
pub use executor::{GraphExecutor, MAX_STEPS};
pub use step::Step;
