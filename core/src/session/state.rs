use crate::api::AnalysisResult;
use crate::input::SelectedFile;
use std::fmt;

/// Lifecycle of the analyze request, independent of file selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// What the presentation layer shows, combining request state and selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    FileSelected,
    Running,
    Succeeded,
    Failed,
}

impl SessionPhase {
    pub fn resolve(request: RequestState, has_file: bool) -> Self {
        match request {
            RequestState::Idle if has_file => SessionPhase::FileSelected,
            RequestState::Idle => SessionPhase::Idle,
            RequestState::Running => SessionPhase::Running,
            RequestState::Succeeded => SessionPhase::Succeeded,
            RequestState::Failed => SessionPhase::Failed,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::FileSelected => "file-selected",
            SessionPhase::Running => "running",
            SessionPhase::Succeeded => "succeeded",
            SessionPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size: usize,
}

impl From<&SelectedFile> for FileSummary {
    fn from(file: &SelectedFile) -> Self {
        Self {
            name: file.name().to_string(),
            size: file.len(),
        }
    }
}

/// Immutable view of the session published after every change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub endpoint: String,
    pub file: Option<FileSummary>,
    pub error: Option<String>,
    pub result: Option<AnalysisResult>,
    pub request_id: Option<u64>,
}

impl SessionSnapshot {
    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Analyze may be triggered; a missing file is reported, not blocked.
    pub fn can_analyze(&self) -> bool {
        !self.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_request_with_file_is_file_selected() {
        assert_eq!(
            SessionPhase::resolve(RequestState::Idle, true),
            SessionPhase::FileSelected
        );
        assert_eq!(
            SessionPhase::resolve(RequestState::Idle, false),
            SessionPhase::Idle
        );
        assert_eq!(
            SessionPhase::resolve(RequestState::Failed, true),
            SessionPhase::Failed
        );
    }

    #[test]
    fn running_snapshot_blocks_analyze() {
        let snapshot = SessionSnapshot {
            phase: SessionPhase::Running,
            ..Default::default()
        };
        assert!(!snapshot.can_analyze());
        assert!(SessionSnapshot::default().can_analyze());
    }
}
