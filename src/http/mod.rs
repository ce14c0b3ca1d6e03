//! HTTP webhooks for the telephony gateway
//!
//! - POST /voice - Call start and retry re-entry (returns TwiML)
//! - POST /calls/:id/recording - Recording finished (returns TwiML)
//! - POST /calls/:id/transcription - Transcription result
//! - GET /calls/:id - Query call state
//! - GET /audio/* - Prompt audio
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
