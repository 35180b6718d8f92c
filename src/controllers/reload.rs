use crate::services::model_manager::{ModelError, ModelManagerState};
use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Serialize)]
pub struct ReloadResponse {
    status: String,
}

/// Serializes with any load in progress; on failure the previously
/// loaded model stays active and the error is reported as a 500.
pub async fn post_reload(
    State(manager): State<ModelManagerState>,
) -> Result<Json<ReloadResponse>, ModelError> {
    manager.reload().await?;
    Ok(Json(ReloadResponse {
        status: "RELOADED".to_string(),
    }))
}
