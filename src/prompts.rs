//! Prompt audio lookup
//!
//! Prompt audio is generated ahead of time by a separate TTS step and served
//! from the audio directory. The orchestrator only needs a playable URL per
//! prompt; `StaticPromptResolver::verify` asserts the files are really there.

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;

/// Symbolic prompts played during a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    /// Greeting on the first turn
    Start,
    /// "I didn't hear anything" re-prompt
    Retry,
    /// Goodbye after too many silent rounds
    Terminate,
    /// Acknowledgement once speech was transcribed
    HeardSomething,
}

impl Prompt {
    pub const ALL: [Prompt; 4] = [
        Prompt::Start,
        Prompt::Retry,
        Prompt::Terminate,
        Prompt::HeardSomething,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Prompt::Start => "start",
            Prompt::Retry => "retry",
            Prompt::Terminate => "terminate",
            Prompt::HeardSomething => "heard_something",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.mp3", self.key())
    }
}

/// Maps a prompt to a URL the gateway can play
pub trait PromptResolver: Send + Sync {
    fn resolve(&self, prompt: Prompt) -> Option<String>;
}

/// Resolves prompts to `{public_url}/audio/{key}.mp3`
#[derive(Debug, Clone)]
pub struct StaticPromptResolver {
    base_url: String,
    audio_dir: PathBuf,
}

impl StaticPromptResolver {
    pub fn new(public_url: &str, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: format!("{}/audio", public_url.trim_end_matches('/')),
            audio_dir: audio_dir.into(),
        }
    }

    /// Fail unless every prompt has an audio file in the audio directory
    pub fn verify(&self) -> Result<()> {
        let missing: Vec<String> = Prompt::ALL
            .iter()
            .map(|p| p.file_name())
            .filter(|name| !self.audio_dir.join(name).is_file())
            .collect();

        if !missing.is_empty() {
            bail!(
                "Prompt audio missing from {}: {}",
                self.audio_dir.display(),
                missing.join(", ")
            );
        }

        info!(
            "All {} prompts present in {}",
            Prompt::ALL.len(),
            self.audio_dir.display()
        );
        Ok(())
    }
}

impl PromptResolver for StaticPromptResolver {
    fn resolve(&self, prompt: Prompt) -> Option<String> {
        Some(format!("{}/{}", self.base_url, prompt.file_name()))
    }
}
