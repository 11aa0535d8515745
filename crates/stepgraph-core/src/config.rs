use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StepGraphError};

/// Top-level stepgraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub workflows: WorkflowsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Length of generated graph and run ids.
    #[serde(default = "default_id_length")]
    pub id_length: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            id_length: default_id_length(),
        }
    }
}

fn default_bind() -> String { "127.0.0.1:8000".to_string() }
fn default_id_length() -> usize { 8 }

/// Logging configuration. `RUST_LOG` overrides `filter` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String { "stepgraph=info,warn".to_string() }

/// Tuning for the built-in code-review workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowsConfig {
    /// Quality score at which the review loop stops.
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: i64,
    #[serde(default = "default_min_improvement")]
    pub min_improvement: i64,
    #[serde(default = "default_max_improvement")]
    pub max_improvement: i64,
    /// Simulated latency of the improvement step.
    #[serde(default)]
    pub improvement_delay_ms: u64,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
            min_improvement: default_min_improvement(),
            max_improvement: default_max_improvement(),
            improvement_delay_ms: 0,
        }
    }
}

fn default_quality_threshold() -> i64 { 90 }
fn default_min_improvement() -> i64 { 10 }
fn default_max_improvement() -> i64 { 20 }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| StepGraphError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        let config: Self =
            toml::from_str(&expanded).map_err(|e| StepGraphError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        let wf = &self.workflows;
        if wf.min_improvement > wf.max_improvement {
            return Err(StepGraphError::Config(format!(
                "workflows.min_improvement ({}) exceeds workflows.max_improvement ({})",
                wf.min_improvement, wf.max_improvement
            )));
        }
        if self.gateway.id_length == 0 || self.gateway.id_length > 32 {
            return Err(StepGraphError::Config(format!(
                "gateway.id_length must be between 1 and 32, got {}",
                self.gateway.id_length
            )));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StepGraphError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}
