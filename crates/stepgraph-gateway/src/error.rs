use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use stepgraph_core::error::StepGraphError;

/// Error returned by gateway handlers, rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::BadRequest(d) | Self::NotFound(d) | Self::Internal(d) => d,
        }
    }
}

impl From<StepGraphError> for ApiError {
    fn from(err: StepGraphError) -> Self {
        match err {
            StepGraphError::UnknownFunction(_) | StepGraphError::InvalidCondition(_) => {
                Self::BadRequest(err.to_string())
            }
            StepGraphError::GraphNotFound(_) | StepGraphError::RunNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.detail() }));
        (self.status(), body).into_response()
    }
}
