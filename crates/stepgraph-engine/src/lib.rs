pub mod graph;
pub mod registry;

pub use graph::{
    ConditionalEdgeDescription, Condition, ConditionOp, EdgeDescription, ExprRouter,
    GraphDefinition, GraphDescription, GraphExecutor, NodeDescription, RouteDescription, Step,
    Transition, END, MAX_STEPS,
};
pub use registry::StepRegistry;
