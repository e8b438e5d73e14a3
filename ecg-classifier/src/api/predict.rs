//! POST /predict_file
//!
//! Accepts a multipart body whose `files` field carries a record's header and
//! data files, and returns the model's classification with raw waveform
//! statistics.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::any::Any;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, INTERNAL_ERROR, REDACTED_DETAIL};
use crate::models::{ErrorResponse, PredictionResponse};
use crate::upload::UploadSet;
use crate::AppState;

/// Upload record files and get a classification
pub async fn predict_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictionResponse>> {
    let request_id = Uuid::new_v4();

    async move {
        let multipart = multipart.map_err(|e| ApiError::InvalidUpload(e.body_text()))?;
        let uploads = UploadSet::from_multipart(multipart).await?;
        let response = state.pipeline.run(uploads).await?;
        Ok(Json(response))
    }
    .instrument(info_span!("predict", %request_id))
    .await
}

/// Converts a handler panic into the standard 500 envelope
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());
    error!("Unhandled exception: {}", message);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(INTERNAL_ERROR, REDACTED_DETAIL)),
    )
        .into_response()
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict_file", post(predict_file))
}
