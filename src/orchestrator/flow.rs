use super::{CallOrchestrator, FALLBACK_MESSAGE};
use crate::prompts::Prompt;
use crate::session::CallPhase;
use crate::twiml::Instruction;
use anyhow::Result;
use tracing::{error, info, warn};

impl CallOrchestrator {
    /// Instruction for the gateway's next turn on `call_id`.
    ///
    /// The first turn plays the greeting before recording; retries go
    /// straight to the record step.
    pub async fn next_turn(&self, call_id: &str) -> Result<Instruction> {
        let handle = self.store.get_or_create(call_id).await;
        let mut session = handle.lock().await;

        if session.phase().is_terminal() {
            warn!("Call {}: turn requested after call ended", call_id);
            return Ok(Instruction::new().hangup());
        }

        let mut instruction = Instruction::new();
        if session.silence_count() == 0 {
            instruction = instruction.play(self.prompt_url(Prompt::Start)?);
            info!("Call {}: greeting caller", call_id);
        } else {
            info!("Call {}: retry #{}", call_id, session.silence_count());
        }

        session.advance(CallPhase::Recording);

        Ok(instruction.record(
            self.settings.recording_url(call_id),
            self.settings.record_timeout_secs,
            self.settings.record_max_length_secs,
            self.settings.transcription_url(call_id),
        ))
    }

    /// `next_turn`, with any failure replaced by the fallback document
    pub async fn next_turn_or_fallback(&self, call_id: &str) -> Instruction {
        match self.next_turn(call_id).await {
            Ok(instruction) => instruction,
            Err(e) => {
                error!("Call {}: failed to build next turn: {:#}", call_id, e);
                self.end_after_failure(call_id).await;
                self.fallback()
            }
        }
    }

    /// Apology followed by hangup
    pub fn fallback(&self) -> Instruction {
        Instruction::new()
            .say(FALLBACK_MESSAGE, self.settings.say_voice.clone())
            .hangup()
    }
}
