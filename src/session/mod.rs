//! Per-call session state
//!
//! This module owns everything the orchestrator knows about a live call:
//! - `CallSession`: silence counter, accepted transcripts and lifecycle phase
//! - `SessionHandle`: the lock-protected session plus its transcript signal
//! - `SessionStore`: concurrent call_id → handle map, created lazily
//! - `spawn_sweeper`: background reclamation of finished or abandoned calls

mod call;
mod store;
mod sweeper;

pub use call::{CallPhase, CallSession, CallSnapshot};
pub use store::{SessionHandle, SessionStore};
pub use sweeper::{spawn_sweeper, SweepPolicy};
