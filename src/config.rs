use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::orchestrator::CallSettings;
use crate::session::SweepPolicy;

/// Environment variables prefixed with this override file values,
/// e.g. `LOQA_CALLS__CALLS__MAX_SILENT_PROMPTS=5`.
pub const ENV_PREFIX: &str = "LOQA_CALLS";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub calls: CallsConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Public base URL the gateway uses to reach this service (no trailing slash)
    pub public_url: String,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Call flow tunables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallsConfig {
    /// Trimmed transcripts shorter than this are treated as noise
    pub min_transcript_chars: usize,

    /// Seconds of silence before the gateway stops listening
    pub record_timeout_secs: u32,

    /// Maximum recording length in seconds
    pub record_max_length_secs: u32,

    /// Length of one transcript wait slice
    pub poll_interval_ms: u64,

    /// Number of wait slices before the round counts as silent
    pub poll_attempts: u32,

    /// Silent rounds tolerated before the call is ended
    pub max_silent_prompts: u32,
}

impl Default for CallsConfig {
    fn default() -> Self {
        Self {
            min_transcript_chars: 25,
            record_timeout_secs: 5,
            record_max_length_secs: 10,
            poll_interval_ms: 500,
            poll_attempts: 12,
            max_silent_prompts: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory holding the pre-generated prompt audio (`start.mp3`, ...)
    pub audio_dir: String,

    /// TTS voice the prompt audio is generated with
    pub voice: String,

    /// Gateway voice for spoken (`<Say>`) fallbacks
    pub say_voice: Option<String>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            audio_dir: "audio".to_string(),
            voice: "en-US-AriaNeural".to_string(),
            say_voice: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    pub interval_secs: u64,
    pub terminated_ttl_secs: u64,
    pub idle_ttl_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            terminated_ttl_secs: 300,
            idle_ttl_secs: 3600,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn call_settings(&self) -> CallSettings {
        CallSettings {
            public_url: self.service.public_url.trim_end_matches('/').to_string(),
            min_transcript_chars: self.calls.min_transcript_chars,
            record_timeout_secs: self.calls.record_timeout_secs,
            record_max_length_secs: self.calls.record_max_length_secs,
            poll_interval: Duration::from_millis(self.calls.poll_interval_ms),
            poll_attempts: self.calls.poll_attempts,
            max_silent_prompts: self.calls.max_silent_prompts,
            say_voice: self.prompts.say_voice.clone(),
        }
    }

    pub fn sweep_policy(&self) -> SweepPolicy {
        SweepPolicy {
            interval: Duration::from_secs(self.sweeper.interval_secs),
            terminated_ttl: Duration::from_secs(self.sweeper.terminated_ttl_secs),
            idle_ttl: Duration::from_secs(self.sweeper.idle_ttl_secs),
        }
    }

    /// Prompt audio directory with `~` expanded
    pub fn audio_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.prompts.audio_dir);
        PathBuf::from(expanded.as_ref())
    }
}
