use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::path::PathBuf;

use crate::store::Location;

/// Failures while turning an artifact on disk into an estimator.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The artifact is well-formed JSON but not a usable estimator.
    #[error("invalid estimator: {0}")]
    Invalid(String),

    /// A mapping artifact had none of the candidate keys holding an estimator.
    #[error("no estimator under any of {candidates:?} (keys present: {present:?})")]
    NotFound {
        candidates: Vec<&'static str>,
        present: Vec<String>,
    },

    #[error("unsupported artifact at {0}")]
    Unsupported(PathBuf),

    #[error("torchscript: {0}")]
    TorchScript(String),
}

/// Failures while running an already loaded estimator.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error("estimator produced a non-finite value ({0})")]
    NonFinite(f64),

    #[error("estimator backend failed: {0}")]
    Backend(String),
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Models not loaded")]
    ModelsUnavailable,

    #[error("no estimator loaded for {0} readings")]
    EstimatorUnavailable(Location),

    #[error(transparent)]
    Inference(#[from] EstimatorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let msg = self.to_string();
        let (code, body) = match self {
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "message": msg }),
            ),
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "error": msg, "missing_fields": fields }),
            ),
            ApiError::ModelsUnavailable
            | ApiError::EstimatorUnavailable(_)
            | ApiError::Inference(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "status": "error", "error": msg }),
            ),
        };
        (code, Json(body)).into_response()
    }
}
