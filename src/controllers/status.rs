use crate::services::model_manager::ModelManagerState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Serialize)]
pub struct StatusResponse {
    initialized: bool,
    model_path: String,
    labels_path: String,
}

pub async fn get_status(State(manager): State<ModelManagerState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        initialized: manager.is_initialized(),
        model_path: manager.config().model_path().to_string(),
        labels_path: manager.config().labels_path().to_string(),
    })
}
