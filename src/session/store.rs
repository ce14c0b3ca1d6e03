use super::call::{CallSession, CallSnapshot};
use super::sweeper::SweepPolicy;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard, RwLock};
use tokio::time::Instant;
use tracing::debug;

/// Shared reference to one call's session.
///
/// The session itself sits behind a per-call mutex. Alongside it, a watch
/// channel publishes the number of accepted transcripts so a waiter can be
/// woken the moment one lands without holding the lock.
#[derive(Debug)]
pub struct SessionHandle {
    call_id: String,
    state: Mutex<CallSession>,
    transcript_count: watch::Sender<usize>,
}

impl SessionHandle {
    fn new(call_id: String) -> Self {
        let (transcript_count, _) = watch::channel(0);
        Self {
            call_id,
            state: Mutex::new(CallSession::new()),
            transcript_count,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Lock the session for a read-modify-write
    pub async fn lock(&self) -> MutexGuard<'_, CallSession> {
        self.state.lock().await
    }

    /// Append an accepted transcript and wake anyone waiting on it
    pub async fn push_transcript(&self, text: String) -> usize {
        let count = {
            let mut session = self.state.lock().await;
            session.push_transcript(text)
        };
        self.transcript_count.send_replace(count);
        count
    }

    /// Receiver tracking the transcript count. The count never decreases.
    pub fn subscribe_transcripts(&self) -> watch::Receiver<usize> {
        self.transcript_count.subscribe()
    }

    pub async fn snapshot(&self) -> CallSnapshot {
        self.state.lock().await.snapshot(&self.call_id)
    }
}

/// Concurrent map of call_id → session.
///
/// Sessions are created on first reference and only leave the map through
/// `remove` or `sweep`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `call_id`, creating an empty one if absent
    pub async fn get_or_create(&self, call_id: &str) -> Arc<SessionHandle> {
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(call_id) {
                return Arc::clone(handle);
            }
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(call_id.to_string()).or_insert_with(|| {
            debug!("Creating session for call {}", call_id);
            Arc::new(SessionHandle::new(call_id.to_string()))
        });
        Arc::clone(handle)
    }

    pub async fn get(&self, call_id: &str) -> Option<Arc<SessionHandle>> {
        let sessions = self.sessions.read().await;
        sessions.get(call_id).cloned()
    }

    pub async fn remove(&self, call_id: &str) -> Option<Arc<SessionHandle>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(call_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions that are finished or abandoned as of `now`.
    ///
    /// Sessions whose lock is held at removal time are in use and kept.
    pub async fn sweep(&self, policy: &SweepPolicy, now: Instant) -> usize {
        let candidates: Vec<Arc<SessionHandle>> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };

        let mut expired = Vec::new();
        for handle in candidates {
            let session = handle.lock().await;
            if policy.is_expired(&session, now) {
                expired.push(handle.call_id.clone());
            }
        }

        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for call_id in expired {
            let still_expired = match sessions.get(&call_id) {
                Some(handle) => match handle.state.try_lock() {
                    Ok(session) => policy.is_expired(&session, now),
                    Err(_) => false,
                },
                None => false,
            };
            if still_expired {
                sessions.remove(&call_id);
                removed += 1;
            }
        }
        removed
    }
}
