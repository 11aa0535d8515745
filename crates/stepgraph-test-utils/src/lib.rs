//! Step and router fixtures for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;

use stepgraph_core::context::{RunContext, State};
use stepgraph_core::error::{Result, StepGraphError};
use stepgraph_core::traits::{ImmediateStep, Router, SuspendingStep};

/// Build a state map from literal pairs.
pub fn state_of(pairs: &[(&str, Value)]) -> State {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Adds `by` to an integer key (missing counts as 0).
pub struct Increment {
    key: String,
    by: i64,
}

impl Increment {
    pub fn new(key: impl Into<String>, by: i64) -> Self {
        Self { key: key.into(), by }
    }
}

impl ImmediateStep for Increment {
    fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let current = ctx.get_i64(&self.key).unwrap_or(0);
        ctx.update(self.key.clone(), current + self.by);
        Ok(())
    }
}

/// `Increment` that sleeps first.
pub struct DelayedIncrement {
    key: String,
    by: i64,
    delay: Duration,
}

impl DelayedIncrement {
    pub fn new(key: impl Into<String>, by: i64, delay_ms: u64) -> Self {
        Self {
            key: key.into(),
            by,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

impl SuspendingStep for DelayedIncrement {
    fn run<'a>(&'a self, ctx: &'a mut RunContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            let current = ctx.get_i64(&self.key).unwrap_or(0);
            ctx.update(self.key.clone(), current + self.by);
            Ok(())
        })
    }
}

/// Sets `key` to `true`.
pub struct Record {
    key: String,
}

impl Record {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl ImmediateStep for Record {
    fn run(&self, ctx: &mut RunContext) -> Result<()> {
        ctx.update(self.key.clone(), true);
        Ok(())
    }
}

/// Always fails with `StepGraphError::Step`.
pub struct Fail {
    step: String,
    message: String,
}

impl Fail {
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

impl ImmediateStep for Fail {
    fn run(&self, _ctx: &mut RunContext) -> Result<()> {
        Err(StepGraphError::step(self.step.clone(), &self.message))
    }
}

/// Counts its invocations; clones share the counter.
#[derive(Clone, Default)]
pub struct Counter {
    calls: Arc<AtomicUsize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImmediateStep for Counter {
    fn run(&self, _ctx: &mut RunContext) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Router that always returns the same target.
pub struct FixedRoute(String);

impl FixedRoute {
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }
}

impl Router for FixedRoute {
    fn route(&self, _ctx: &mut RunContext) -> Result<String> {
        Ok(self.0.clone())
    }
}
