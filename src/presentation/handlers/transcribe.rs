use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use crate::application::ports::{ChatModel, VectorStore};
use crate::application::services::{OffloadError, TranscriptionServiceError};
use crate::domain::Upload;
use crate::presentation::state::AppState;

use super::error::error_response;

const FILE_FIELD: &str = "file";

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler<C, V>(
    State(state): State<AppState<C, V>>,
    mut multipart: Multipart,
) -> impl IntoResponse
where
    C: ChatModel + 'static,
    V: VectorStore + 'static,
{
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return error_response(e.status(), format!("Failed to read multipart: {}", e));
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // A part without a filename is a plain form value, not a file.
        let Some(filename) = field.file_name().map(str::to_string) else {
            tracing::debug!("Ignoring file field without a filename");
            continue;
        };
        match field.bytes().await {
            Ok(data) => {
                upload = Some(Upload::new(filename, data));
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read file bytes");
                return error_response(e.status(), format!("Failed to read file: {}", e));
            }
        }
    }

    let Some(upload) = upload else {
        tracing::warn!("Transcription request without a file field");
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "detail": [{
                    "loc": ["body", FILE_FIELD],
                    "msg": "field required",
                    "type": "value_error.missing",
                }]
            })),
        )
            .into_response();
    };

    tracing::debug!(filename = %upload.filename, bytes = upload.len(), "Audio upload received");

    match state.transcription_service.transcribe(upload).await {
        Ok(transcript) => {
            (StatusCode::OK, Json(TranscribeResponse { transcript })).into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            tracing::error!(error = %e, status = status.as_u16(), "Transcription failed");
            error_response(status, format!("Transcription failed: {}", e))
        }
    }
}

fn status_for(error: &TranscriptionServiceError) -> StatusCode {
    match error {
        TranscriptionServiceError::Offload(OffloadError::Saturated { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        TranscriptionServiceError::Offload(OffloadError::TimedOut(_)) => {
            StatusCode::GATEWAY_TIMEOUT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
