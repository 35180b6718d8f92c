use crate::services::model_manager::ModelError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

impl IntoResponse for ModelError {
    fn into_response(self) -> Response {
        let status = match &self {
            ModelError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
