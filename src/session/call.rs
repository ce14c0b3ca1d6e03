use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

/// Where a call currently sits in its greet/record/decide cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    /// Created, first instruction not issued yet
    Greeting,
    /// A record instruction is out; waiting for the gateway to report back
    Recording,
    /// Recording finished; waiting for the transcription callback
    WaitingForTranscript,
    /// Caller was silent; a re-prompt and redirect were issued
    RetryRecording,
    /// Call was told to hang up. Never left once entered.
    Terminated,
}

impl CallPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, CallPhase::Terminated)
    }
}

/// Mutable state for one call
#[derive(Debug)]
pub struct CallSession {
    silence_count: u32,
    transcripts: Vec<String>,
    phase: CallPhase,
    /// Bumped each time a recording starts waiting for its transcript
    wait_round: u64,
    started_at: DateTime<Utc>,
    last_activity: Instant,
}

impl CallSession {
    pub fn new() -> Self {
        Self {
            silence_count: 0,
            transcripts: Vec::new(),
            phase: CallPhase::Greeting,
            wait_round: 0,
            started_at: Utc::now(),
            last_activity: Instant::now(),
        }
    }

    pub fn silence_count(&self) -> u32 {
        self.silence_count
    }

    pub fn transcripts(&self) -> &[String] {
        &self.transcripts
    }

    pub fn has_transcript(&self) -> bool {
        !self.transcripts.is_empty()
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Count one more silent round and return the new total
    pub fn record_silence(&mut self) -> u32 {
        self.silence_count += 1;
        self.touch();
        self.silence_count
    }

    /// Move to `phase` unless the call already terminated.
    ///
    /// Returns `false` when the transition was refused.
    pub fn advance(&mut self, phase: CallPhase) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = phase;
        self.touch();
        true
    }

    /// Enter `WaitingForTranscript` and return the new wait round.
    ///
    /// A later call supersedes any wait still in progress. Returns `None`
    /// once the call has terminated.
    pub fn begin_wait(&mut self) -> Option<u64> {
        if !self.advance(CallPhase::WaitingForTranscript) {
            return None;
        }
        self.wait_round += 1;
        Some(self.wait_round)
    }

    /// Whether no newer wait has begun since `round`
    pub fn is_current_wait(&self, round: u64) -> bool {
        self.wait_round == round
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub(super) fn push_transcript(&mut self, text: String) -> usize {
        self.transcripts.push(text);
        self.touch();
        self.transcripts.len()
    }

    pub fn snapshot(&self, call_id: &str) -> CallSnapshot {
        CallSnapshot {
            call_id: call_id.to_string(),
            phase: self.phase,
            silence_count: self.silence_count,
            transcripts: self.transcripts.clone(),
            started_at: self.started_at,
        }
    }
}

impl Default for CallSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only copy of a session, as reported by the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CallSnapshot {
    pub call_id: String,
    pub phase: CallPhase,
    pub silence_count: u32,
    pub transcripts: Vec<String>,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = CallSession::new();
        assert_eq!(session.silence_count(), 0);
        assert!(!session.has_transcript());
        assert_eq!(session.phase(), CallPhase::Greeting);
    }

    #[test]
    fn test_silence_count_increments() {
        let mut session = CallSession::new();
        assert_eq!(session.record_silence(), 1);
        assert_eq!(session.record_silence(), 2);
        assert_eq!(session.silence_count(), 2);
    }

    #[test]
    fn test_terminated_is_final() {
        let mut session = CallSession::new();
        assert!(session.advance(CallPhase::Recording));
        assert!(session.advance(CallPhase::Terminated));
        assert!(!session.advance(CallPhase::Recording));
        assert_eq!(session.phase(), CallPhase::Terminated);
    }

    #[test]
    fn test_newer_wait_supersedes_older() {
        let mut session = CallSession::new();
        let first = session.begin_wait().unwrap();
        let second = session.begin_wait().unwrap();
        assert!(!session.is_current_wait(first));
        assert!(session.is_current_wait(second));

        session.advance(CallPhase::RetryRecording);
        assert!(session.is_current_wait(second));

        session.advance(CallPhase::Terminated);
        assert_eq!(session.begin_wait(), None);
    }

    #[test]
    fn test_snapshot_serializes_phase_snake_case() {
        let mut session = CallSession::new();
        session.advance(CallPhase::WaitingForTranscript);
        let json = serde_json::to_string(&session.snapshot("CA123")).unwrap();
        assert!(json.contains("\"phase\":\"waiting_for_transcript\""));
        assert!(json.contains("\"call_id\":\"CA123\""));
    }
}
