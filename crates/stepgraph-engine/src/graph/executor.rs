use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use stepgraph_core::context::{RunContext, RunResult, State};
use stepgraph_core::error::{Result, StepGraphError};
use stepgraph_core::traits::Router;

use super::definition::{GraphDefinition, Transition, END};

/// Maximum step executions per run. Reaching it ends the run normally.
pub const MAX_STEPS: usize = 20;

/// Runs a `GraphDefinition`.
///
/// Starting from the entry point, the executor runs one step at a time
/// against a fresh `RunContext`, then follows the step's conditional edge,
/// its linear edge, or stops when it has neither. A run ends at `END`, at a
/// step with no outgoing edge, or after `MAX_STEPS` executions. All three
/// report `completed`.
///
/// The definition is shared read-only, so one executor may serve concurrent
/// runs.
#[derive(Debug, Clone)]
pub struct GraphExecutor {
    graph: Arc<GraphDefinition>,
}

impl GraphExecutor {
    pub fn new(graph: impl Into<Arc<GraphDefinition>>) -> Self {
        Self {
            graph: graph.into(),
        }
    }

    /// Execute the graph from its entry point with `initial_state`.
    ///
    /// Fails with `Configuration` before anything runs if no entry point is
    /// set, and with `NodeNotFound` when execution reaches an unregistered
    /// step name. Errors returned by steps or routers are passed through
    /// unchanged. An aborted run produces no result.
    pub async fn run(&self, initial_state: State) -> Result<RunResult> {
        let entry = self
            .graph
            .entry_point()
            .ok_or_else(|| StepGraphError::Configuration("No entry point defined.".into()))?;

        let start = Instant::now();
        let mut ctx = RunContext::new(initial_state);
        let mut current = entry.to_string();
        ctx.log(format!("Starting workflow at {}", current));
        info!(entry = %current, "Starting graph run");

        let mut steps_executed = 0;

        while current != END && steps_executed < MAX_STEPS {
            let step = self
                .graph
                .step(&current)
                .ok_or_else(|| StepGraphError::NodeNotFound(current.clone()))?;

            ctx.log(format!("Executing: {}", current));
            debug!(step = %current, suspending = step.is_suspending(), "Executing step");

            if let Err(e) = step.execute(&mut ctx).await {
                error!(step = %current, error = %e, "Step failed, aborting run");
                return Err(e);
            }
            steps_executed += 1;

            current = self.next_step(&current, &mut ctx)?;
        }

        if current != END && steps_executed >= MAX_STEPS {
            warn!(
                next = %current,
                max_steps = MAX_STEPS,
                "Step cap reached, ending run"
            );
        }

        ctx.complete();

        info!(
            steps_executed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Graph run complete"
        );

        Ok(ctx.into_result(steps_executed))
    }

    /// Resolve the successor of `current`. Router results are not checked
    /// here; an unknown name fails on the next lookup.
    fn next_step(&self, current: &str, ctx: &mut RunContext) -> Result<String> {
        match self.graph.transition(current) {
            Transition::Conditional(router) => {
                let next = router.route(ctx)?;
                ctx.log(format!("Condition met. Routing to: {}", next));
                debug!(from = %current, to = %next, "Conditional transition");
                Ok(next)
            }
            Transition::Linear(next) => {
                debug!(from = %current, to = %next, "Linear transition");
                Ok(next.to_string())
            }
            Transition::Terminal => {
                debug!(step = %current, "No outgoing edge, run complete");
                Ok(END.to_string())
            }
        }
    }
}

impl From<GraphDefinition> for GraphExecutor {
    fn from(graph: GraphDefinition) -> Self {
        Self::new(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::step::Step;
    use serde_json::json;
    use stepgraph_core::context::RunStatus;
    use stepgraph_test_utils::{
        state_of, Counter, DelayedIncrement, Fail, FixedRoute, Increment, Record,
    };

    fn executing_entries(logs: &[String]) -> usize {
        logs.iter().filter(|l| l.starts_with("Executing: ")).count()
    }

    fn self_loop(increment: i64) -> GraphDefinition {
        let mut graph = GraphDefinition::new();
        graph
            .add_node("S", Step::immediate(Increment::new("score", increment)))
            .set_entry_point("S")
            .add_conditional_edge("S", |ctx| {
                Ok(if ctx.get_i64("score").unwrap_or(0) >= 90 {
                    END.to_string()
                } else {
                    "S".to_string()
                })
            });
        graph
    }

    #[tokio::test]
    async fn test_linear_two_steps() {
        let mut graph = GraphDefinition::new();
        graph
            .add_node("A", Step::immediate(Record::new("a_ran")))
            .add_node("B", Step::immediate(Record::new("b_ran")))
            .add_edge("A", "B")
            .set_entry_point("A");

        let result = GraphExecutor::new(graph).run(State::new()).await.unwrap();

        assert_eq!(result.steps_executed, 2);
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.final_state["a_ran"], json!(true));
        assert_eq!(result.final_state["b_ran"], json!(true));
        assert_eq!(
            result.logs,
            vec!["Starting workflow at A", "Executing: A", "Executing: B"]
        );
    }

    #[tokio::test]
    async fn test_step_without_edges_runs_once() {
        let counter = Counter::new();
        let mut graph = GraphDefinition::new();
        graph
            .add_node("only", Step::immediate(counter.clone()))
            .set_entry_point("only");

        let result = GraphExecutor::new(graph).run(State::new()).await.unwrap();
        assert_eq!(counter.calls(), 1);
        assert_eq!(result.steps_executed, 1);
        assert_eq!(result.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_missing_entry_point() {
        let mut graph = GraphDefinition::new();
        graph.add_node("A", Step::immediate(Record::new("a_ran")));

        let err = GraphExecutor::new(graph).run(State::new()).await.unwrap_err();
        assert!(matches!(err, StepGraphError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_self_loop_reaches_threshold() {
        let result = GraphExecutor::new(self_loop(10))
            .run(state_of(&[("score", json!(0))]))
            .await
            .unwrap();

        assert_eq!(result.steps_executed, 9);
        assert_eq!(result.final_state["score"], json!(90));
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(executing_entries(&result.logs), 9);
        assert_eq!(
            result.logs.last().map(String::as_str),
            Some("Condition met. Routing to: END")
        );
    }

    #[tokio::test]
    async fn test_step_cap_is_not_an_error() {
        let result = GraphExecutor::new(self_loop(1))
            .run(state_of(&[("score", json!(0))]))
            .await
            .unwrap();

        assert_eq!(result.steps_executed, MAX_STEPS);
        assert_eq!(result.status, RunStatus::Completed);
        assert!(result.final_state["score"].as_i64().unwrap() < 90);
        assert_eq!(executing_entries(&result.logs), MAX_STEPS);
    }

    #[tokio::test]
    async fn test_unknown_entry_point() {
        let mut graph = GraphDefinition::new();
        graph.set_entry_point("ghost");

        let err = GraphExecutor::new(graph).run(State::new()).await.unwrap_err();
        assert!(matches!(err, StepGraphError::NodeNotFound(ref name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_unknown_linear_target() {
        let mut graph = GraphDefinition::new();
        graph
            .add_node("A", Step::immediate(Record::new("a_ran")))
            .add_edge("A", "missing")
            .set_entry_point("A");

        let err = GraphExecutor::new(graph).run(State::new()).await.unwrap_err();
        assert!(matches!(err, StepGraphError::NodeNotFound(ref name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_router_to_unknown_step_fails_on_next_lookup() {
        let counter = Counter::new();
        let mut graph = GraphDefinition::new();
        graph
            .add_node("A", Step::immediate(counter.clone()))
            .add_router("A", Arc::new(FixedRoute::new("nowhere")))
            .set_entry_point("A");

        let err = GraphExecutor::new(graph).run(State::new()).await.unwrap_err();
        assert!(matches!(err, StepGraphError::NodeNotFound(ref name) if name == "nowhere"));
        // A completed before the bad route was looked up
        assert_eq!(counter.calls(), 1);
    }

    #[tokio::test]
    async fn test_conditional_beats_linear() {
        let mut graph = GraphDefinition::new();
        graph
            .add_node("A", Step::immediate(Record::new("a_ran")))
            .add_node("B", Step::immediate(Record::new("b_ran")))
            .add_node("C", Step::immediate(Record::new("c_ran")))
            .add_edge("A", "B")
            .add_router("A", Arc::new(FixedRoute::new("C")))
            .set_entry_point("A");

        let result = GraphExecutor::new(graph).run(State::new()).await.unwrap();
        assert_eq!(result.steps_executed, 2);
        assert!(result.final_state.contains_key("c_ran"));
        assert!(!result.final_state.contains_key("b_ran"));
        assert!(result.logs.contains(&"Condition met. Routing to: C".to_string()));
    }

    #[tokio::test]
    async fn test_step_error_propagates_unchanged() {
        let mut graph = GraphDefinition::new();
        graph
            .add_node("A", Step::immediate(Fail::new("A", "disk full")))
            .set_entry_point("A");

        let err = GraphExecutor::new(graph).run(State::new()).await.unwrap_err();
        match err {
            StepGraphError::Step { step, message } => {
                assert_eq!(step, "A");
                assert_eq!(message, "disk full");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_router_error_propagates() {
        let mut graph = GraphDefinition::new();
        graph
            .add_node("A", Step::immediate(Record::new("a_ran")))
            .add_conditional_edge("A", |_| {
                Err(StepGraphError::Routing {
                    from: "A".into(),
                    message: "no score".into(),
                })
            })
            .set_entry_point("A");

        let err = GraphExecutor::new(graph).run(State::new()).await.unwrap_err();
        assert!(matches!(err, StepGraphError::Routing { .. }));
    }

    #[tokio::test]
    async fn test_suspending_and_immediate_steps_run_in_order() {
        let mut graph = GraphDefinition::new();
        graph
            .add_node("double", Step::from_fn(|ctx| {
                let n = ctx.get_i64("n").unwrap_or(0);
                ctx.update("n", n * 2);
                Ok(())
            }))
            .add_node("slow_add", Step::suspending(DelayedIncrement::new("n", 3, 5)))
            .add_edge("slow_add", "double")
            .set_entry_point("slow_add");

        let result = GraphExecutor::new(graph)
            .run(state_of(&[("n", json!(1))]))
            .await
            .unwrap();

        // (1 + 3) * 2; the reverse order would give 5
        assert_eq!(result.final_state["n"], json!(8));
        assert_eq!(result.steps_executed, 2);
    }

    #[tokio::test]
    async fn test_initial_state_preserved_and_caller_copy_untouched() {
        let mut graph = GraphDefinition::new();
        graph
            .add_node("A", Step::immediate(Increment::new("count", 1)))
            .set_entry_point("A");
        let executor = GraphExecutor::new(graph);

        let initial = state_of(&[("count", json!(5)), ("keep", json!("me"))]);
        let result = executor.run(initial.clone()).await.unwrap();

        assert_eq!(result.final_state["count"], json!(6));
        assert_eq!(result.final_state["keep"], json!("me"));
        assert_eq!(initial["count"], json!(5));
    }

    #[tokio::test]
    async fn test_definition_reused_across_concurrent_runs() {
        let executor = GraphExecutor::new(self_loop(10));

        let (a, b) = tokio::join!(
            executor.run(state_of(&[("score", json!(0))])),
            executor.run(state_of(&[("score", json!(50))])),
        );

        assert_eq!(a.unwrap().steps_executed, 9);
        assert_eq!(b.unwrap().steps_executed, 4);
    }
}
