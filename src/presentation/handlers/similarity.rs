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
pub struct SimilarityRequest {
    pub text: String,
    pub k: i64,
}

#[derive(Serialize)]
pub struct SimilarityResponse {
    pub documents: Vec<RankedDocument>,
}

#[derive(Serialize)]
pub struct RankedDocument {
    pub content: String,
    pub top_k: usize,
}

#[tracing::instrument(skip(state, request), fields(k = request.k))]
pub async fn similarity_handler<C, V>(
    State(state): State<AppState<C, V>>,
    Json(request): Json<SimilarityRequest>,
) -> impl IntoResponse
where
    C: ChatModel + 'static,
    V: VectorStore + 'static,
{
    tracing::debug!(query = %sanitize_prompt(&request.text), "Processing similarity search");

    let max_k = state.settings.vector_store.max_k;
    let k = match usize::try_from(request.k) {
        Ok(k) if (1..=max_k).contains(&k) => k,
        _ => {
            tracing::warn!(k = request.k, max_k, "Rejected similarity request");
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("k must be between 1 and {}", max_k),
            );
        }
    };

    match state.document_store.similarity_search(&request.text, k).await {
        Ok(chunks) => {
            tracing::info!(results = chunks.len(), "Similarity search successful");
            let documents = chunks
                .into_iter()
                .enumerate()
                .map(|(rank, chunk)| RankedDocument {
                    content: chunk.text,
                    top_k: rank,
                })
                .collect();

            (StatusCode::OK, Json(SimilarityResponse { documents })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Similarity search failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Similarity search failed: {}", e),
            )
        }
    }
}
