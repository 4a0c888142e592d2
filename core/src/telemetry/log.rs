use crate::session::state::SessionPhase;
use log::{debug, info, warn};

/// Structured log lines for session activity.
pub struct SessionLog;

impl SessionLog {
    pub fn new() -> Self {
        Self
    }

    pub fn transition(&self, from: SessionPhase, to: SessionPhase) {
        if from != to {
            info!("session {} -> {}", from, to);
        }
    }

    pub fn dispatched(&self, request_id: u64, endpoint: &str, file_name: &str, bytes: usize) {
        info!(
            "request #{} POST {} ({}, {} bytes)",
            request_id, endpoint, file_name, bytes
        );
    }

    pub fn refused(&self, reason: &str) {
        warn!("analyze refused: {}", reason);
    }

    pub fn failed(&self, request_id: u64, reason: &str) {
        warn!("request #{} failed: {}", request_id, reason);
    }

    pub fn stale(&self, request_id: u64) {
        debug!("ignoring completion of stale request #{}", request_id);
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
