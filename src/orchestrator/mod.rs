//! Call session orchestration
//!
//! `CallOrchestrator` turns gateway callbacks into instruction documents:
//! - `next_turn`: greeting (first turn only) followed by a record step
//! - `record_transcript`: validity filter and append for transcription results
//! - `resolve`: waits for the transcript of the finished recording, then
//!   acknowledges and hangs up, re-prompts, or gives up
//!
//! Both instruction-producing operations have an infallible wrapper that
//! substitutes an apology and hangup for any internal error.

mod flow;
mod intake;
mod resolver;

pub use intake::TranscriptOutcome;
pub use resolver::{Decision, Outcome};

use crate::prompts::{Prompt, PromptResolver};
use crate::session::SessionStore;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;

/// Spoken when a turn cannot be resolved
pub const FALLBACK_MESSAGE: &str = "Internal server error. Goodbye.";

/// Tunables for the call flow, fixed for the orchestrator's lifetime
#[derive(Debug, Clone)]
pub struct CallSettings {
    /// Public base URL of this service, without trailing slash
    pub public_url: String,
    pub min_transcript_chars: usize,
    pub record_timeout_secs: u32,
    pub record_max_length_secs: u32,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
    pub max_silent_prompts: u32,
    /// Gateway voice for `<Say>` fallbacks; gateway default when unset
    pub say_voice: Option<String>,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:8080".to_string(),
            min_transcript_chars: 25,
            record_timeout_secs: 5,
            record_max_length_secs: 10,
            poll_interval: Duration::from_millis(500),
            poll_attempts: 12,
            max_silent_prompts: 3,
            say_voice: None,
        }
    }
}

impl CallSettings {
    /// Upper bound on how long `resolve` waits for a transcript
    pub fn transcript_wait(&self) -> Duration {
        self.poll_interval * self.poll_attempts
    }

    /// Gateway entry point for a new or retried turn
    pub fn voice_url(&self) -> String {
        format!("{}/voice", self.public_url)
    }

    pub fn recording_url(&self, call_id: &str) -> String {
        format!(
            "{}/calls/{}/recording",
            self.public_url,
            urlencoding::encode(call_id)
        )
    }

    pub fn transcription_url(&self, call_id: &str) -> String {
        format!(
            "{}/calls/{}/transcription",
            self.public_url,
            urlencoding::encode(call_id)
        )
    }
}

/// Owns the session store and decides what the gateway does next
pub struct CallOrchestrator {
    store: Arc<SessionStore>,
    settings: CallSettings,
    prompts: Arc<dyn PromptResolver>,
}

impl CallOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        settings: CallSettings,
        prompts: Arc<dyn PromptResolver>,
    ) -> Self {
        Self {
            store,
            settings,
            prompts,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn settings(&self) -> &CallSettings {
        &self.settings
    }

    fn prompt_url(&self, prompt: Prompt) -> Result<String> {
        self.prompts
            .resolve(prompt)
            .ok_or_else(|| anyhow!("No audio for prompt '{}'", prompt.key()))
    }
}
