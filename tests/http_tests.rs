// Integration tests for the webhook routes
//
// Requests go through the full router with `oneshot`, as the gateway would
// send them (form-encoded bodies, TwiML responses).

mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{orchestrator, orchestrator_with, test_settings, TestPrompts, SPEECH};
use loqa_calls::{create_router, AppState, CallOrchestrator, Prompt};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    _audio: TempDir,
}

fn app_with(orchestrator: CallOrchestrator) -> Result<TestApp> {
    let audio = TempDir::new()?;
    std::fs::write(audio.path().join("start.mp3"), b"ID3-start")?;

    let state = AppState::new(Arc::new(orchestrator), audio.path());
    Ok(TestApp {
        router: create_router(state),
        _audio: audio,
    })
}

fn app() -> Result<TestApp> {
    app_with(orchestrator())
}

fn form_post(uri: &str, body: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))?)
}

fn get(uri: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())?)
}

async fn send(app: &TestApp, req: Request<Body>) -> Result<(StatusCode, Option<String>, String)> {
    let res = app.router.clone().oneshot(req).await?;
    let status = res.status();
    let content_type = match res.headers().get(header::CONTENT_TYPE) {
        Some(value) => Some(value.to_str()?.to_string()),
        None => None,
    };
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    Ok((status, content_type, String::from_utf8(bytes.to_vec())?))
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let app = app()?;
    let (status, _, body) = send(&app, get("/health")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    Ok(())
}

#[tokio::test]
async fn test_voice_greets_new_call() -> Result<()> {
    let app = app()?;

    let (status, content_type, body) = send(
        &app,
        form_post("/voice", "CallSid=CA200&From=%2B15550001111&CallStatus=ringing")?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    assert!(body.contains("<Play>https://calls.test/audio/start.mp3</Play>"));
    assert!(body.contains(r#"action="https://calls.test/calls/CA200/recording""#));
    assert!(body.contains(r#"transcribeCallback="https://calls.test/calls/CA200/transcription""#));
    assert!(body.contains(r#"timeout="5" maxLength="10" playBeep="true" transcribe="true""#));

    Ok(())
}

#[tokio::test]
async fn test_voice_without_call_sid_returns_empty_document() -> Result<()> {
    let app = app()?;

    let (status, _, body) = send(&app, form_post("/voice", "From=%2B15550001111")?).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with("<Response></Response>"));

    Ok(())
}

#[tokio::test]
async fn test_voice_with_unparseable_body_returns_empty_document() -> Result<()> {
    let app = app()?;

    let req = Request::builder()
        .method("POST")
        .uri("/voice")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"CallSid":"CA201"}"#))?;
    let (status, _, body) = send(&app, req).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with("<Response></Response>"));

    Ok(())
}

#[tokio::test]
async fn test_transcription_then_recording_ends_call() -> Result<()> {
    let app = app()?;

    send(&app, form_post("/voice", "CallSid=CA202")?).await?;

    let (status, _, body) = send(
        &app,
        form_post(
            "/calls/CA202/transcription",
            &format!(
                "CallSid=CA202&TranscriptionStatus=completed&TranscriptionText={}",
                urlencoding::encode(SPEECH)
            ),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, _, body) = send(
        &app,
        form_post(
            "/calls/CA202/recording",
            &format!(
                "CallSid=CA202&RecordingUrl={}&RecordingDuration=4",
                urlencoding::encode("https://api.twilio.com/RE1")
            ),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<Play>https://calls.test/audio/heard_something.mp3</Play><Hangup/>"));

    let (status, _, body) = send(&app, get("/calls/CA202")?).await?;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body)?;
    assert_eq!(json["phase"], "terminated");
    assert_eq!(json["silence_count"], 0);
    assert_eq!(json["transcripts"][0], SPEECH);

    Ok(())
}

#[tokio::test]
async fn test_transcription_with_reserved_characters_is_decoded() -> Result<()> {
    let app = app()?;
    let text = "Book Tuesday & Wednesday, 50% off? a+b=c";

    send(
        &app,
        form_post(
            "/calls/CA207/transcription",
            &format!("TranscriptionText={}", urlencoding::encode(text)),
        )?,
    )
    .await?;

    let (status, _, body) = send(&app, get("/calls/CA207")?).await?;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body)?;
    assert_eq!(json["transcripts"][0], text);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_silent_recording_redirects_to_voice() -> Result<()> {
    let app = app()?;

    send(&app, form_post("/voice", "CallSid=CA203")?).await?;
    let (_, _, body) = send(&app, form_post("/calls/CA203/recording", "CallSid=CA203")?).await?;

    assert!(body.contains("<Play>https://calls.test/audio/retry.mp3</Play>"));
    assert!(body.contains(r#"<Redirect method="POST">https://calls.test/voice</Redirect>"#));

    // Re-entry skips the greeting
    let (_, _, body) = send(&app, form_post("/voice", "CallSid=CA203")?).await?;
    assert!(!body.contains("<Play>"));
    assert!(body.contains("<Record "));

    Ok(())
}

#[tokio::test]
async fn test_short_transcription_is_ignored() -> Result<()> {
    let app = app()?;

    let (status, _, body) = send(
        &app,
        form_post("/calls/CA204/transcription", "CallSid=CA204&TranscriptionText=hi")?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    let (status, _, _) = send(&app, get("/calls/CA204")?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_malformed_transcription_still_succeeds() -> Result<()> {
    let app = app()?;

    let req = Request::builder()
        .method("POST")
        .uri("/calls/CA205/transcription")
        .body(Body::from("garbage"))?;
    let (status, _, body) = send(&app, req).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_recording_failure_returns_fallback() -> Result<()> {
    let app = app_with(orchestrator_with(
        test_settings(),
        TestPrompts::without(Prompt::HeardSomething),
    ))?;

    send(
        &app,
        form_post(
            "/calls/CA206/transcription",
            &format!("TranscriptionText={}", urlencoding::encode(SPEECH)),
        )?,
    )
    .await?;
    let (status, content_type, body) =
        send(&app, form_post("/calls/CA206/recording", "CallSid=CA206")?).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    assert!(body.contains("<Say>Internal server error. Goodbye.</Say><Hangup/>"));

    Ok(())
}

#[tokio::test]
async fn test_unknown_call_status_is_not_found() -> Result<()> {
    let app = app()?;

    let (status, _, body) = send(&app, get("/calls/CA-nope")?).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Call CA-nope not found"));

    Ok(())
}

#[tokio::test]
async fn test_prompt_audio_is_served() -> Result<()> {
    let app = app()?;

    let (status, _, body) = send(&app, get("/audio/start.mp3")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ID3-start");

    let (status, _, _) = send(&app, get("/audio/missing.mp3")?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
