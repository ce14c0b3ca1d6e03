use super::call::CallSession;
use super::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// When the sweeper reclaims a session
#[derive(Debug, Clone)]
pub struct SweepPolicy {
    /// How often the store is scanned
    pub interval: Duration,

    /// Terminated calls are kept this long so late callbacks still see
    /// the terminal state instead of starting a fresh call
    pub terminated_ttl: Duration,

    /// Any call with no activity for this long is dropped
    pub idle_ttl: Duration,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            terminated_ttl: Duration::from_secs(300),
            idle_ttl: Duration::from_secs(3600),
        }
    }
}

impl SweepPolicy {
    pub fn is_expired(&self, session: &CallSession, now: Instant) -> bool {
        let idle = now.saturating_duration_since(session.last_activity());
        if session.phase().is_terminal() && idle >= self.terminated_ttl {
            return true;
        }
        idle >= self.idle_ttl
    }
}

/// Spawn the background reclamation pass over `store`
pub fn spawn_sweeper(store: Arc<SessionStore>, policy: SweepPolicy) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Session sweeper started (interval={:?}, terminated_ttl={:?}, idle_ttl={:?})",
            policy.interval, policy.terminated_ttl, policy.idle_ttl
        );

        let mut ticker = tokio::time::interval(policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = store.sweep(&policy, Instant::now()).await;
            if removed > 0 {
                info!("Swept {} expired call sessions", removed);
            } else {
                debug!("Sweep found no expired call sessions");
            }
        }
    })
}
