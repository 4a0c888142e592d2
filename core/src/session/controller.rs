use crate::api::AnalysisResult;
use crate::config::SessionConfig;
use crate::input::SelectedFile;
use crate::prelude::{AnalyzeError, AnalyzeRequest, AnalyzeResult, AnalyzeTransport};
use crate::session::state::{FileSummary, RequestState, SessionPhase, SessionSnapshot};
use crate::telemetry::{MetricsRecorder, MetricsSnapshot, SessionLog};
use std::sync::Arc;
use tokio::sync::watch;

/// Owns the session state machine and issues analyze requests.
///
/// All mutation goes through `&mut self`, so the owner's event loop is the
/// single writer. Every change is published to subscribers as a
/// [`SessionSnapshot`].
pub struct SessionController {
    transport: Arc<dyn AnalyzeTransport>,
    endpoint: String,
    file: Option<SelectedFile>,
    request: RequestState,
    in_flight: Option<u64>,
    result: Option<AnalysisResult>,
    error: Option<String>,
    next_request_id: u64,
    updates: watch::Sender<SessionSnapshot>,
    log: SessionLog,
    metrics: MetricsRecorder,
}

/// A request that has entered `Running` but has not been sent yet.
pub struct PendingAnalysis {
    request_id: u64,
    request: AnalyzeRequest,
    transport: Arc<dyn AnalyzeTransport>,
}

impl std::fmt::Debug for PendingAnalysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAnalysis")
            .field("request_id", &self.request_id)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Outcome of a dispatched request, fed back through [`SessionController::complete`].
#[derive(Debug, Clone)]
pub struct Completion {
    pub request_id: u64,
    pub outcome: AnalyzeResult<AnalysisResult>,
}

impl PendingAnalysis {
    pub fn id(&self) -> u64 {
        self.request_id
    }

    pub fn request(&self) -> &AnalyzeRequest {
        &self.request
    }

    pub async fn run(self) -> Completion {
        let outcome = self.transport.analyze(self.request).await;
        Completion {
            request_id: self.request_id,
            outcome,
        }
    }
}

impl SessionController {
    pub fn new(config: &SessionConfig, transport: Arc<dyn AnalyzeTransport>) -> Self {
        let initial = SessionSnapshot {
            endpoint: config.endpoint.clone(),
            ..Default::default()
        };
        let (updates, _) = watch::channel(initial);
        Self {
            transport,
            endpoint: config.endpoint.clone(),
            file: None,
            request: RequestState::Idle,
            in_flight: None,
            result: None,
            error: None,
            next_request_id: 0,
            updates,
            log: SessionLog::new(),
            metrics: MetricsRecorder::new(),
        }
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            endpoint: self.endpoint.clone(),
            file: self.file.as_ref().map(FileSummary::from),
            error: self.error.clone(),
            result: self.result.clone(),
            request_id: self.in_flight,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::resolve(self.request, self.file.is_some())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Last write wins. Clears a previous error; a displayed result stays.
    pub fn select_file(&mut self, file: SelectedFile) {
        let before = self.phase();
        self.file = Some(file);
        self.error = None;
        if self.request == RequestState::Failed {
            self.request = RequestState::Idle;
        }
        self.publish(before);
    }

    /// Takes effect on the next dispatch only.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        let before = self.phase();
        self.endpoint = endpoint.into();
        self.publish(before);
    }

    /// Enters `Running` and freezes the request, or refuses the trigger.
    pub fn begin(&mut self) -> AnalyzeResult<PendingAnalysis> {
        if self.request == RequestState::Running {
            self.log.refused("request already in flight");
            self.metrics.record_refused();
            return Err(AnalyzeError::AlreadyRunning);
        }

        let before = self.phase();
        let Some(file) = self.file.clone() else {
            self.log.refused("no file selected");
            self.metrics.record_refused();
            self.error = Some(AnalyzeError::NoFileSelected.user_message());
            self.publish(before);
            return Err(AnalyzeError::NoFileSelected);
        };

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let request = AnalyzeRequest {
            endpoint: self.endpoint.clone(),
            file,
        };

        self.request = RequestState::Running;
        self.in_flight = Some(request_id);
        self.result = None;
        self.error = None;
        self.log.dispatched(
            request_id,
            &request.endpoint,
            request.file.name(),
            request.file.len(),
        );
        self.metrics.record_dispatched();
        self.publish(before);

        Ok(PendingAnalysis {
            request_id,
            request,
            transport: Arc::clone(&self.transport),
        })
    }

    /// Applies a finished request. Returns `false` for a completion that does
    /// not belong to the request in flight.
    pub fn complete(&mut self, completion: Completion) -> bool {
        if self.in_flight != Some(completion.request_id) {
            self.log.stale(completion.request_id);
            return false;
        }

        let before = self.phase();
        self.in_flight = None;
        match completion.outcome {
            Ok(result) => {
                self.request = RequestState::Succeeded;
                self.result = Some(result);
                self.error = None;
                self.metrics.record_succeeded();
            }
            Err(err) => {
                self.log.failed(completion.request_id, &err.to_string());
                self.request = RequestState::Failed;
                self.result = None;
                self.error = Some(err.user_message());
                self.metrics.record_failed();
            }
        }
        self.publish(before);
        true
    }

    /// Dispatches and awaits one request, applying its outcome to the session.
    pub async fn analyze(&mut self) -> AnalyzeResult<AnalysisResult> {
        let pending = self.begin()?;
        let completion = pending.run().await;
        let outcome = completion.outcome.clone();
        self.complete(completion);
        outcome
    }

    fn publish(&self, before: SessionPhase) {
        self.log.transition(before, self.phase());
        self.updates.send_replace(self.snapshot());
    }
}
