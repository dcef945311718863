//! Session state that outlives a single socket

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Last sequence number seen, shared with the heartbeat task
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    inner: Arc<RwLock<Option<u64>>>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<u64> {
        *self.inner.read()
    }

    pub fn set(&self, sequence: u64) {
        *self.inner.write() = Some(sequence);
    }

    pub fn reset(&self) {
        *self.inner.write() = None;
    }
}

/// Everything needed to resume a session on a new connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeState {
    pub session_id: String,
    pub sequence: Option<u64>,
    /// Gateway URL the server asked resumes to use
    pub resume_url: Option<String>,
}

/// Per-connection session data
///
/// The sequence and session id survive a socket being torn down so the next
/// socket can resume.
#[derive(Debug, Default)]
pub struct GatewaySession {
    pub sequence: SequenceTracker,
    pub session_id: Option<String>,
    pub resume_url: Option<String>,
    pub heartbeat_interval: Option<Duration>,
}

impl GatewaySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session restored from a previous connection
    pub fn from_resume(state: ResumeState) -> Self {
        let session = Self {
            session_id: Some(state.session_id),
            resume_url: state.resume_url,
            ..Self::default()
        };
        if let Some(sequence) = state.sequence {
            session.sequence.set(sequence);
        }
        session
    }

    /// Whether a Resume (rather than Identify) should be sent
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn resume_state(&self) -> Option<ResumeState> {
        self.session_id.as_ref().map(|session_id| ResumeState {
            session_id: session_id.clone(),
            sequence: self.sequence.get(),
            resume_url: self.resume_url.clone(),
        })
    }

    /// Forget the session so the next connection identifies from scratch
    pub fn invalidate(&mut self) {
        self.session_id = None;
        self.resume_url = None;
        self.sequence.reset();
    }
}
