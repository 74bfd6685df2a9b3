use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] LlmError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let code = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (code, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
