use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepGraphError {
    // Engine errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Node {0} not found in registry.")]
    NodeNotFound(String),

    // Errors raised by steps and routers themselves
    #[error("Step failed: {step}: {message}")]
    Step { step: String, message: String },

    #[error("Routing from {from} failed: {message}")]
    Routing { from: String, message: String },

    // Graph assembly errors
    #[error("Function {0} not found.")]
    UnknownFunction(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    // Store errors
    #[error("Graph ID not found: {0}")]
    GraphNotFound(String),

    #[error("Run ID not found: {0}")]
    RunNotFound(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StepGraphError {
    /// Build a step failure from any displayable cause.
    pub fn step(step: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Step {
            step: step.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StepGraphError>;
