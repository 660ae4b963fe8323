use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("{0}")]
    Validation(String),

    #[error("Model not found at path: {0}")]
    ModelNotFound(String),

    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Feature schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PredictorError {
    /// Validation errors are the caller's to fix; everything else is a failure
    /// somewhere between loading the model and reading its output.
    pub fn is_validation(&self) -> bool {
        matches!(self, PredictorError::Validation(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PredictorError::Validation(_) => "validation",
            PredictorError::Config(_) => "config",
            _ => "inference",
        }
    }
}

impl IntoResponse for PredictorError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            PredictorError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            PredictorError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prediction failed: {}", self),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}
