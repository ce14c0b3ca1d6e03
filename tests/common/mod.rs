// Shared fixtures for integration tests

#![allow(dead_code)]

use anyhow::{Context, Result};
use loqa_calls::{
    CallOrchestrator, CallSettings, Prompt, PromptResolver, SessionHandle, SessionStore,
};
use std::collections::HashSet;
use std::sync::Arc;

pub const PUBLIC_URL: &str = "https://calls.test";

/// Resolves every prompt except the ones listed as missing
#[derive(Default)]
pub struct TestPrompts {
    pub missing: HashSet<Prompt>,
}

impl TestPrompts {
    pub fn without(prompt: Prompt) -> Self {
        Self {
            missing: HashSet::from([prompt]),
        }
    }
}

impl PromptResolver for TestPrompts {
    fn resolve(&self, prompt: Prompt) -> Option<String> {
        if self.missing.contains(&prompt) {
            return None;
        }
        Some(prompt_url(prompt))
    }
}

pub fn prompt_url(prompt: Prompt) -> String {
    format!("{}/audio/{}.mp3", PUBLIC_URL, prompt.key())
}

pub fn test_settings() -> CallSettings {
    CallSettings {
        public_url: PUBLIC_URL.to_string(),
        ..Default::default()
    }
}

pub fn orchestrator() -> CallOrchestrator {
    orchestrator_with(test_settings(), TestPrompts::default())
}

pub fn orchestrator_with(settings: CallSettings, prompts: TestPrompts) -> CallOrchestrator {
    CallOrchestrator::new(Arc::new(SessionStore::new()), settings, Arc::new(prompts))
}

/// Session the orchestrator holds for `call_id`
pub async fn session_of(orch: &CallOrchestrator, call_id: &str) -> Result<Arc<SessionHandle>> {
    orch.store()
        .get(call_id)
        .await
        .with_context(|| format!("No session for call {}", call_id))
}

/// 30 characters, comfortably above the default minimum
pub const SPEECH: &str = "I would like to book a meeting";
