//! Code-review loop: extract functions, score complexity, detect issues, and
//! keep suggesting improvements until the quality gate passes.
//!
//! The scoring here is a stand-in for real analysis; every step works only
//! through the `RunContext`.

use std::time::Duration;

use futures::future::BoxFuture;
use rand::Rng;
use serde_json::Value;
use tracing::debug;

use stepgraph_core::config::WorkflowsConfig;
use stepgraph_core::context::RunContext;
use stepgraph_core::error::Result;
use stepgraph_core::traits::{ImmediateStep, Router, SuspendingStep};
use stepgraph_engine::{
    ConditionalEdgeDescription, EdgeDescription, GraphDefinition, GraphDescription,
    NodeDescription, RouteDescription, Step, StepRegistry, END,
};

pub const EXTRACT_FUNCTIONS: &str = "extract_functions";
pub const CHECK_COMPLEXITY: &str = "check_complexity";
pub const DETECT_ISSUES: &str = "detect_issues";
pub const SUGGEST_IMPROVEMENTS: &str = "suggest_improvements";
pub const QUALITY_GATE: &str = "quality_gate";

const MAX_QUALITY: i64 = 100;

fn quality_score(ctx: &RunContext) -> Option<f64> {
    ctx.get_f64("quality_score")
}

/// Raise `current` by `improvement`, capped at `MAX_QUALITY`. Integer scores
/// stay integers and fractional scores stay floats. Returns the starting and
/// the new score.
fn raise_score(current: Option<&Value>, improvement: i64) -> (Value, Value) {
    let number = current.filter(|v| v.is_number());
    match (number.and_then(Value::as_i64), number.and_then(Value::as_f64)) {
        (Some(whole), _) => (
            Value::from(whole),
            Value::from(whole.saturating_add(improvement).min(MAX_QUALITY)),
        ),
        (None, Some(fractional)) => (
            Value::from(fractional),
            Value::from((fractional + improvement as f64).min(MAX_QUALITY as f64)),
        ),
        (None, None) => (
            Value::from(50),
            Value::from(improvement.saturating_add(50).min(MAX_QUALITY)),
        ),
    }
}

/// Counts `def ` occurrences in `code`.
pub struct ExtractFunctions;

impl ImmediateStep for ExtractFunctions {
    fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let count = ctx.get_str("code").unwrap_or("").matches("def ").count();
        ctx.update("function_count", count);
        ctx.log(format!("Extracted {} functions.", count));
        Ok(())
    }
}

/// Complexity is the code length divided by ten.
pub struct CheckComplexity;

impl ImmediateStep for CheckComplexity {
    fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let length = ctx.get_str("code").unwrap_or("").chars().count();
        let complexity = length as f64 / 10.0;
        ctx.update("complexity_score", complexity);
        ctx.log(format!("Calculated complexity: {:?}", complexity));
        Ok(())
    }
}

/// Flags issues while the quality score is below 80.
pub struct DetectIssues;

impl ImmediateStep for DetectIssues {
    fn run(&self, ctx: &mut RunContext) -> Result<()> {
        if quality_score(ctx).unwrap_or(0.0) < 80.0 {
            ctx.update("issues_found", true);
            ctx.log("Issues detected in code structure.");
        } else {
            ctx.update("issues_found", false);
            ctx.log("No major issues found.");
        }
        Ok(())
    }
}

/// Raises the quality score by a random amount, capped at 100.
///
/// Suspends for `delay` first, standing in for a call to an external reviewer.
pub struct SuggestImprovements {
    min: i64,
    max: i64,
    delay: Duration,
}

impl SuggestImprovements {
    pub fn new(min: i64, max: i64, delay: Duration) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            delay,
        }
    }

    /// Always improves by exactly `amount`.
    pub fn fixed(amount: i64) -> Self {
        Self::new(amount, amount, Duration::ZERO)
    }

    pub fn from_config(config: &WorkflowsConfig) -> Self {
        Self::new(
            config.min_improvement,
            config.max_improvement,
            Duration::from_millis(config.improvement_delay_ms),
        )
    }
}

impl SuspendingStep for SuggestImprovements {
    fn run<'a>(&'a self, ctx: &'a mut RunContext) -> BoxFuture<'a, Result<()>> {
        let improvement = rand::thread_rng().gen_range(self.min..=self.max);
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let (current, improved) = raise_score(ctx.get("quality_score"), improvement);
            ctx.log(format!(
                "Applied fixes. Quality improved from {} to {}.",
                current, improved
            ));
            debug!(from = %current, to = %improved, "Quality improved");
            ctx.update("quality_score", improved);
            Ok(())
        })
    }
}

/// Ends the loop once the quality score reaches the threshold.
pub struct QualityGate {
    threshold: i64,
}

impl QualityGate {
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }
}

impl Router for QualityGate {
    fn route(&self, ctx: &mut RunContext) -> Result<String> {
        let next = if quality_score(ctx).unwrap_or(0.0) >= self.threshold as f64 {
            END
        } else {
            SUGGEST_IMPROVEMENTS
        };
        Ok(next.to_string())
    }
}

/// Register the code-review steps and the quality gate.
pub fn register(registry: &mut StepRegistry, config: &WorkflowsConfig) {
    registry.register_step(EXTRACT_FUNCTIONS, Step::immediate(ExtractFunctions));
    registry.register_step(CHECK_COMPLEXITY, Step::immediate(CheckComplexity));
    registry.register_step(DETECT_ISSUES, Step::immediate(DetectIssues));
    registry.register_step(
        SUGGEST_IMPROVEMENTS,
        Step::suspending(SuggestImprovements::from_config(config)),
    );
    registry.register_router(QUALITY_GATE, QualityGate::new(config.quality_threshold));
}

/// The review loop as a graph description:
/// `extract_functions → check_complexity → detect_issues`, then
/// `detect_issues` routes through `quality_gate` and
/// `suggest_improvements` returns to `detect_issues`.
pub fn code_review_description() -> GraphDescription {
    let node = |name: &str| NodeDescription {
        name: name.to_string(),
        function_name: name.to_string(),
    };
    let edge = |from: &str, to: &str| EdgeDescription {
        from_node: from.to_string(),
        to_node: to.to_string(),
    };

    GraphDescription {
        nodes: vec![
            node(EXTRACT_FUNCTIONS),
            node(CHECK_COMPLEXITY),
            node(DETECT_ISSUES),
            node(SUGGEST_IMPROVEMENTS),
        ],
        edges: vec![
            edge(EXTRACT_FUNCTIONS, CHECK_COMPLEXITY),
            edge(CHECK_COMPLEXITY, DETECT_ISSUES),
            edge(SUGGEST_IMPROVEMENTS, DETECT_ISSUES),
        ],
        conditional_edges: vec![ConditionalEdgeDescription {
            from_node: DETECT_ISSUES.to_string(),
            route: RouteDescription::Named {
                router: QUALITY_GATE.to_string(),
            },
        }],
        entry_point: EXTRACT_FUNCTIONS.to_string(),
    }
}

/// Assemble the review loop from `registry`.
pub fn code_review_graph(registry: &StepRegistry) -> Result<GraphDefinition> {
    code_review_description().build(registry)
}
