use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// State carried through a run. Keys are strings; values are JSON so any step
/// may introduce any key with any value kind.
pub type State = HashMap<String, serde_json::Value>;

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
}

/// Mutable state bag and append-only log threaded through every step of one run.
///
/// A context is created fresh for each run and owned exclusively by it.
#[derive(Debug, Clone)]
pub struct RunContext {
    state: State,
    logs: Vec<String>,
    status: RunStatus,
}

impl RunContext {
    /// Create a running context from an initial state snapshot.
    pub fn new(initial_state: State) -> Self {
        Self {
            state: initial_state,
            logs: Vec::new(),
            status: RunStatus::Running,
        }
    }

    /// Upsert a value.
    pub fn update(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.state.insert(key.into(), value.into());
    }

    /// Append a log entry.
    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Get a value as a string, if it's a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.state.get(key).and_then(|v| v.as_str())
    }

    /// Get a numeric value as `f64`. Integers are widened.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.state.get(key).and_then(|v| v.as_f64())
    }

    /// Get a numeric value as `i64`. Floats with no fractional part are
    /// accepted when they fit in `i64`.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        let value = self.state.get(key)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| f as i64)
        })
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.state.get(key).and_then(|v| v.as_bool())
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Mark the run as completed.
    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
    }

    /// Consume the context into a result bundle.
    pub fn into_result(self, steps_executed: usize) -> RunResult {
        RunResult {
            final_state: self.state,
            logs: self.logs,
            steps_executed,
            status: self.status,
        }
    }
}

/// Outcome of a run that was not aborted by an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub final_state: State,
    pub logs: Vec<String>,
    pub steps_executed: usize,
    pub status: RunStatus,
}
