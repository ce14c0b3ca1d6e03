pub mod config;
pub mod http;
pub mod orchestrator;
pub mod prompts;
pub mod session;
pub mod twilio;
pub mod twiml;

pub use config::Config;
pub use http::{create_router, AppState};
pub use orchestrator::{CallOrchestrator, CallSettings, Decision, Outcome, TranscriptOutcome};
pub use prompts::{Prompt, PromptResolver, StaticPromptResolver};
pub use session::{spawn_sweeper, CallPhase, SessionHandle, SessionStore, SweepPolicy};
pub use twiml::{Instruction, Verb};
