use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use stepgraph_core::context::RunContext;
use stepgraph_core::error::Result;
use stepgraph_core::traits::{ImmediateStep, SuspendingStep};

/// A unit of work registered in a graph.
///
/// The execution mode is chosen when the step is built, so the executor
/// dispatches with a plain `match` instead of inspecting the implementation.
#[derive(Clone)]
pub enum Step {
    /// Completes before returning control.
    Immediate(Arc<dyn ImmediateStep>),
    /// Returns a future the executor awaits to completion.
    Suspending(Arc<dyn SuspendingStep>),
}

impl Step {
    pub fn immediate(step: impl ImmediateStep) -> Self {
        Self::Immediate(Arc::new(step))
    }

    pub fn suspending(step: impl SuspendingStep) -> Self {
        Self::Suspending(Arc::new(step))
    }

    /// Wrap a synchronous closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut RunContext) -> Result<()> + Send + Sync + 'static,
    {
        Self::Immediate(Arc::new(f))
    }

    /// Wrap a closure returning a boxed future, e.g.
    /// `Step::from_async_fn(|ctx| Box::pin(async move { ... }))`.
    pub fn from_async_fn<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RunContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        Self::Suspending(Arc::new(f))
    }

    pub fn is_suspending(&self) -> bool {
        matches!(self, Self::Suspending(_))
    }

    /// Run the step to completion against `ctx`.
    pub async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        match self {
            Self::Immediate(step) => step.run(ctx),
            Self::Suspending(step) => step.run(ctx).await,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(_) => f.write_str("Step::Immediate"),
            Self::Suspending(_) => f.write_str("Step::Suspending"),
        }
    }
}
