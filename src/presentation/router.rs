use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{ChatModel, VectorStore};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    chat_handler, health_handler, similarity_handler, transcribe_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<C, V>(state: AppState<C, V>) -> Router
where
    C: ChatModel + 'static,
    V: VectorStore + 'static,
{
    let body_limit = state.settings.server.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/transcribe", post(transcribe_handler::<C, V>))
        .route("/chat_response", post(chat_handler::<C, V>))
        .route("/similarity", post(similarity_handler::<C, V>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
