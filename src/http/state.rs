use crate::orchestrator::CallOrchestrator;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Call flow logic and the session store it owns
    pub orchestrator: Arc<CallOrchestrator>,

    /// Directory served under `/audio`
    pub audio_dir: PathBuf,
}

impl AppState {
    pub fn new(orchestrator: Arc<CallOrchestrator>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator,
            audio_dir: audio_dir.into(),
        }
    }
}
