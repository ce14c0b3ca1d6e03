use super::CallOrchestrator;
use crate::prompts::Prompt;
use crate::session::{CallPhase, SessionHandle};
use crate::twiml::Instruction;
use anyhow::{bail, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How a finished recording round was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A transcript arrived; the call is acknowledged and ended
    SpeechDetected,
    /// Silent round below the ceiling; caller is re-prompted
    Retry { silence_count: u32 },
    /// Silent round that reached the ceiling; the call is ended
    GaveUp { silence_count: u32 },
    /// The call had already terminated
    AlreadyEnded,
    /// A newer recording report for the same call took over this wait
    Superseded,
}

/// Outcome plus the document to send back to the gateway
#[derive(Debug, Clone)]
pub struct Decision {
    pub outcome: Outcome,
    pub instruction: Instruction,
}

impl CallOrchestrator {
    /// Decide what follows a finished recording on `call_id`.
    ///
    /// The transcription callback for the recording is delivered separately
    /// and may arrive before, during or after this wait, or never. The wait
    /// ends as soon as the session holds a transcript, or after
    /// `poll_attempts` slices of `poll_interval`.
    pub async fn resolve(&self, call_id: &str) -> Result<Decision> {
        let handle = self.store.get_or_create(call_id).await;

        let round = match handle.lock().await.begin_wait() {
            Some(round) => round,
            None => {
                warn!("Call {}: recording reported after call ended", call_id);
                return Ok(Decision {
                    outcome: Outcome::AlreadyEnded,
                    instruction: Instruction::new().hangup(),
                });
            }
        };

        info!(
            "Waiting up to {:?} for transcription for call {}...",
            self.settings.transcript_wait(),
            call_id
        );
        let started = Instant::now();
        if self.wait_for_transcript(&handle).await? {
            debug!("Call {}: transcript seen after {:?}", call_id, started.elapsed());
        }

        let mut session = handle.lock().await;
        if !session.is_current_wait(round) {
            // The newer report's response drives the call
            warn!(
                "Call {}: duplicate recording report (wait round {}) ignored",
                call_id, round
            );
            return Ok(superseded());
        }
        if session.phase().is_terminal() {
            warn!("Call {}: ended while waiting for transcription", call_id);
            return Ok(Decision {
                outcome: Outcome::AlreadyEnded,
                instruction: Instruction::new().hangup(),
            });
        }
        if session.phase() != CallPhase::WaitingForTranscript {
            warn!(
                "Call {}: moved on to {:?} while waiting for transcription",
                call_id,
                session.phase()
            );
            return Ok(superseded());
        }

        if session.has_transcript() {
            let url = self.prompt_url(Prompt::HeardSomething)?;
            session.advance(CallPhase::Terminated);
            info!("Call {}: voice detected, call ended.", call_id);
            return Ok(Decision {
                outcome: Outcome::SpeechDetected,
                instruction: Instruction::new().play(url).hangup(),
            });
        }

        let ceiling = self.settings.max_silent_prompts;
        let retrying = session.silence_count() + 1 < ceiling;
        let url = if retrying {
            self.prompt_url(Prompt::Retry)?
        } else {
            self.prompt_url(Prompt::Terminate)?
        };

        let silence_count = session.record_silence();
        info!(
            "Call {}: no voice detected (silence count = {})",
            call_id, silence_count
        );

        if retrying {
            session.advance(CallPhase::RetryRecording);
            Ok(Decision {
                outcome: Outcome::Retry { silence_count },
                instruction: Instruction::new()
                    .play(url)
                    .redirect(self.settings.voice_url()),
            })
        } else {
            session.advance(CallPhase::Terminated);
            info!("Call {} ended after {} silences.", call_id, silence_count);
            Ok(Decision {
                outcome: Outcome::GaveUp { silence_count },
                instruction: Instruction::new().play(url).hangup(),
            })
        }
    }

    /// `resolve`, with any failure replaced by the fallback document
    pub async fn resolve_or_fallback(&self, call_id: &str) -> Instruction {
        match self.resolve(call_id).await {
            Ok(decision) => decision.instruction,
            Err(e) => {
                error!("Call {}: failed to resolve recording: {:#}", call_id, e);
                self.end_after_failure(call_id).await;
                self.fallback()
            }
        }
    }

    /// Mark the call terminated once the fallback hangup has been issued
    pub(super) async fn end_after_failure(&self, call_id: &str) {
        if let Some(handle) = self.store.get(call_id).await {
            handle.lock().await.advance(CallPhase::Terminated);
        }
    }

    /// Wait for the session to hold at least one transcript.
    ///
    /// No session lock is held while waiting, so the transcription callback
    /// can append concurrently.
    async fn wait_for_transcript(&self, handle: &SessionHandle) -> Result<bool> {
        let slice: Duration = self.settings.poll_interval;
        let mut transcripts = handle.subscribe_transcripts();

        for attempt in 1..=self.settings.poll_attempts {
            let arrived = tokio::time::timeout(slice, async {
                transcripts.wait_for(|count| *count > 0).await.map(|_| ())
            })
            .await;

            match arrived {
                Ok(Ok(())) => return Ok(true),
                Ok(Err(e)) => bail!(
                    "Transcript signal closed for call {}: {}",
                    handle.call_id(),
                    e
                ),
                Err(_) => debug!(
                    "Call {}: no transcript after attempt {}/{}",
                    handle.call_id(),
                    attempt,
                    self.settings.poll_attempts
                ),
            }
        }

        Ok(false)
    }
}

fn superseded() -> Decision {
    Decision {
        outcome: Outcome::Superseded,
        instruction: Instruction::new(),
    }
}
