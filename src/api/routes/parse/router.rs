//! Router for the parse API

use std::sync::Arc;

use axum::{Router, extract::State, response::Json};

use super::public;
use crate::ai::UserImage;
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<AppState>;

async fn parse_handler(
    State(state): State<SharedState>,
    Json(payload): Json<public::ParseRequest>,
) -> Result<Json<public::ActionBatch>, ApiError> {
    // An empty image string means no image
    let image = payload
        .image
        .as_deref()
        .filter(|image| !image.trim().is_empty())
        .map(UserImage::from_base64)
        .transpose()
        .map_err(|e| ApiError::BadRequest(format!("Invalid base64 image: {}", e)))?;

    let now = chrono::Utc::now();
    let batch = state.extractor.extract(&payload.text, image, now).await?;

    Ok(Json(batch))
}

/// Create the parse router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::post(parse_handler))
}
