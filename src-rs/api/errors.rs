use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::TaskError;

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if let TaskError::Store(detail) = &self {
            error!(error = %detail, "store failure");
        }
        (status, Json(json!({"message": self.to_string()}))).into_response()
    }
}
