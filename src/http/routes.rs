use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let audio = ServeDir::new(&state.audio_dir);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Gateway webhooks
        .route("/voice", post(handlers::voice))
        .route(
            "/calls/:call_id/recording",
            post(handlers::handle_recording),
        )
        .route(
            "/calls/:call_id/transcription",
            post(handlers::handle_transcription),
        )
        // Call queries
        .route("/calls/:call_id", get(handlers::get_call_status))
        // Pre-generated prompt audio
        .nest_service("/audio", audio)
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
