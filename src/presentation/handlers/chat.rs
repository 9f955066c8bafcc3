use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ChatModel, VectorStore};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::error::error_response;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn chat_handler<C, V>(
    State(state): State<AppState<C, V>>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse
where
    C: ChatModel + 'static,
    V: VectorStore + 'static,
{
    tracing::debug!(prompt = %sanitize_prompt(&request.text), "Processing chat request");

    if request.text.trim().is_empty() {
        tracing::warn!("Chat request with empty text");
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "text must not be empty");
    }

    match state.chat_model.chat(&request.text).await {
        Ok(response) => {
            tracing::info!(chars = response.len(), "Chat response generated");
            (StatusCode::OK, Json(ChatResponse { response })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Chat model failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Chat failed: {}", e),
            )
        }
    }
}
