use super::CallOrchestrator;
use tracing::info;

/// What happened to an incoming transcription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOutcome {
    /// Appended; carries the session's transcript count afterwards
    Accepted { count: usize },
    /// Shorter than the minimum once trimmed; nothing stored
    Rejected,
}

impl CallOrchestrator {
    /// Store a transcription result for `call_id` if it looks like speech.
    ///
    /// Text is trimmed and must be at least `min_transcript_chars` long.
    /// Repeated identical text is appended again; there is no dedup.
    pub async fn record_transcript(&self, call_id: &str, raw: &str) -> TranscriptOutcome {
        let text = raw.trim();
        if text.chars().count() < self.settings.min_transcript_chars {
            info!(
                "Call {}: transcription too short or empty: {:?}",
                call_id, raw
            );
            return TranscriptOutcome::Rejected;
        }

        let handle = self.store.get_or_create(call_id).await;
        let count = handle.push_transcript(text.to_string()).await;
        info!("Call {}: transcription received - {}", call_id, text);

        TranscriptOutcome::Accepted { count }
    }
}
