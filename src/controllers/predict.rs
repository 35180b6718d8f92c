use crate::model::PredictionResult;
use crate::services::model_manager::{ModelError, ModelManagerState};
use axum::Json;
use axum::extract::State;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct PredictRequest {
    description: String,
    quantity: i64,
}

/// A delegate failure still produces a 200 with an `ERROR`-status body;
/// only an uninitialized model is rejected, with a 503.
pub async fn post_predict(
    State(manager): State<ModelManagerState>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<PredictionResult>, ModelError> {
    let result = manager.process_and_predict(&payload.description, payload.quantity)?;
    Ok(Json(result))
}
