pub mod config;
pub mod context;
pub mod error;
pub mod traits;

pub use config::AppConfig;
pub use context::{RunContext, RunResult, RunStatus, State};
pub use error::{Result, StepGraphError};
pub use traits::{ImmediateStep, Router, SuspendingStep};
