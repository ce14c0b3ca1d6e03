use super::state::AppState;
use crate::twiml::Instruction;
use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Form posted by the gateway when a call starts or is redirected back
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoiceForm {
    pub call_sid: Option<String>,
}

/// Form posted when the record step finishes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordingForm {
    pub call_sid: Option<String>,
    pub recording_url: Option<String>,
    pub recording_duration: Option<String>,
}

/// Form posted by the gateway's speech engine
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranscriptionForm {
    pub call_sid: Option<String>,
    pub transcription_text: Option<String>,
    pub transcription_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn twiml(instruction: &Instruction) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        instruction.to_twiml(),
    )
        .into_response()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /voice
/// Call start, and re-entry after a retry redirect
pub async fn voice(
    State(state): State<AppState>,
    form: Result<Form<VoiceForm>, FormRejection>,
) -> Response {
    let call_id = match form {
        Ok(Form(form)) => non_empty(form.call_sid),
        Err(e) => {
            warn!("Malformed /voice request: {}", e);
            None
        }
    };

    let Some(call_id) = call_id else {
        warn!("/voice request without CallSid");
        return twiml(&Instruction::new());
    };

    let instruction = state.orchestrator.next_turn_or_fallback(&call_id).await;
    twiml(&instruction)
}

/// POST /calls/:call_id/recording
/// Recording finished; wait for the transcript and decide
pub async fn handle_recording(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    form: Result<Form<RecordingForm>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(form)) => {
            if let Some(sid) = non_empty(form.call_sid) {
                if sid != call_id {
                    warn!("Recording callback for {} carries CallSid {}", call_id, sid);
                }
            }
            if let Some(url) = non_empty(form.recording_url) {
                info!(
                    "Call {}: recording URL {}.mp3 ({}s)",
                    call_id,
                    url,
                    form.recording_duration.as_deref().unwrap_or("?")
                );
            }
        }
        Err(e) => warn!("Call {}: malformed recording callback: {}", call_id, e),
    }

    let instruction = state.orchestrator.resolve_or_fallback(&call_id).await;
    twiml(&instruction)
}

/// POST /calls/:call_id/transcription
/// Transcription result, delivered independently of the recording callback
pub async fn handle_transcription(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    form: Result<Form<TranscriptionForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            warn!("Call {}: malformed transcription callback: {}", call_id, e);
            return (StatusCode::OK, "").into_response();
        }
    };

    if let Some(status) = form.transcription_status.as_deref() {
        if status != "completed" {
            info!("Call {}: transcription status {}", call_id, status);
        }
    }

    if let Some(sid) = non_empty(form.call_sid) {
        if sid != call_id {
            warn!("Transcription callback for {} carries CallSid {}", call_id, sid);
        }
    }

    let text = form.transcription_text.unwrap_or_default();
    state.orchestrator.record_transcript(&call_id, &text).await;

    (StatusCode::OK, "").into_response()
}

/// GET /calls/:call_id
/// Current state of a call
pub async fn get_call_status(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Response {
    match state.orchestrator.store().get(&call_id).await {
        Some(handle) => (StatusCode::OK, Json(handle.snapshot().await)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Call {} not found", call_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
