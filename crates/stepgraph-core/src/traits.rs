use futures::future::BoxFuture;

use crate::context::RunContext;
use crate::error::Result;

/// Step that completes before returning control to the engine.
pub trait ImmediateStep: Send + Sync + 'static {
    fn run(&self, ctx: &mut RunContext) -> Result<()>;
}

impl<F> ImmediateStep for F
where
    F: Fn(&mut RunContext) -> Result<()> + Send + Sync + 'static,
{
    fn run(&self, ctx: &mut RunContext) -> Result<()> {
        self(ctx)
    }
}

/// Step that may suspend (e.g. on I/O) before completing.
///
/// The engine awaits the returned future to completion before it evaluates
/// any transition out of the step.
pub trait SuspendingStep: Send + Sync + 'static {
    fn run<'a>(&'a self, ctx: &'a mut RunContext) -> BoxFuture<'a, Result<()>>;
}

impl<F> SuspendingStep for F
where
    F: for<'a> Fn(&'a mut RunContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    fn run<'a>(&'a self, ctx: &'a mut RunContext) -> BoxFuture<'a, Result<()>> {
        self(ctx)
    }
}

/// Routing function for a conditional edge.
///
/// Returns the name of the next step or the terminal marker. Routers never
/// suspend. The returned name is not checked here; the engine resolves it
/// when execution reaches it.
pub trait Router: Send + Sync + 'static {
    fn route(&self, ctx: &mut RunContext) -> Result<String>;
}

impl<F> Router for F
where
    F: Fn(&mut RunContext) -> Result<String> + Send + Sync + 'static,
{
    fn route(&self, ctx: &mut RunContext) -> Result<String> {
        self(ctx)
    }
}
