use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use stepgraph_core::context::{RunStatus, State as RunState};
use stepgraph_core::error::StepGraphError;
use stepgraph_engine::{GraphDescription, GraphExecutor};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::RunRecord;

// GET /: registered functions
pub async fn home(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Graph engine is running. Available nodes:",
        "nodes": state.registry.step_names(),
        "routers": state.registry.router_names(),
        "graphs": state.graphs.len(),
    }))
}

// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGraphResponse {
    pub graph_id: String,
    pub message: String,
}

// POST /graph/create: assemble a graph from registered functions
pub async fn create_graph(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GraphDescription>,
) -> Result<Json<CreateGraphResponse>, ApiError> {
    let graph = body.build(&state.registry)?;
    let graph_id = state.graphs.insert(GraphExecutor::new(graph));

    info!(
        graph_id = %graph_id,
        nodes = body.nodes.len(),
        entry = %body.entry_point,
        "Graph created"
    );

    Ok(Json(CreateGraphResponse {
        graph_id,
        message: "Graph created successfully".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RunGraphRequest {
    pub graph_id: String,
    #[serde(default)]
    pub initial_state: RunState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunGraphResponse {
    pub run_id: String,
    pub status: RunStatus,
    pub final_state: RunState,
    pub logs: Vec<String>,
    pub steps_executed: usize,
}

// POST /graph/run: execute a stored graph and keep the result
pub async fn run_graph(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RunGraphRequest>,
) -> Result<Json<RunGraphResponse>, ApiError> {
    let executor = state
        .graphs
        .get(&body.graph_id)
        .ok_or_else(|| StepGraphError::GraphNotFound(body.graph_id.clone()))?;

    let started_at = Utc::now();
    let result = executor.run(body.initial_state).await.map_err(|e| {
        warn!(graph_id = %body.graph_id, error = %e, "Graph run failed");
        ApiError::Internal(e.to_string())
    })?;

    let record = state.runs.record(&body.graph_id, result, started_at);
    info!(
        graph_id = %body.graph_id,
        run_id = %record.run_id,
        steps_executed = record.steps_executed,
        "Graph run stored"
    );

    Ok(Json(RunGraphResponse {
        run_id: record.run_id,
        status: record.status,
        final_state: record.final_state,
        logs: record.logs,
        steps_executed: record.steps_executed,
    }))
}

// GET /graph/state/{run_id}
pub async fn get_run_state(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<RunRecord>, ApiError> {
    state
        .runs
        .get(&run_id)
        .map(Json)
        .ok_or_else(|| StepGraphError::RunNotFound(run_id).into())
}

// GET /graph/runs: stored run ids, oldest first
pub async fn list_runs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "runs": state.runs.list() }))
}
