use crate::api::AnalysisResult;
use crate::input::SelectedFile;
use async_trait::async_trait;

/// Shown when the service gave no usable explanation for a failure.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to analyze the image. Check if the API server is running.";

/// Shown when analyze is triggered before any file was picked.
pub const NO_FILE_MESSAGE: &str = "Please upload an image first.";

/// Shown when analyze is triggered while a request is outstanding.
pub const ALREADY_RUNNING_MESSAGE: &str = "An analysis is already running.";

/// Multipart field the service reads the uploaded image from.
pub const IMAGE_FIELD: &str = "image";

/// A single dispatched analyze call. The endpoint is frozen at dispatch time.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub endpoint: String,
    pub file: SelectedFile,
}

/// Failure taxonomy for an analyze trigger.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("no file selected")]
    NoFileSelected,
    #[error("an analyze request is already in flight")]
    AlreadyRunning,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server responded with status {status}")]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("malformed response: {detail}")]
    MalformedResponse {
        message: Option<String>,
        detail: String,
    },
}

impl AnalyzeError {
    /// Text the presentation layer shows for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AnalyzeError::NoFileSelected => NO_FILE_MESSAGE.to_string(),
            AnalyzeError::AlreadyRunning => ALREADY_RUNNING_MESSAGE.to_string(),
            AnalyzeError::Server {
                message: Some(message),
                ..
            }
            | AnalyzeError::MalformedResponse {
                message: Some(message),
                ..
            } => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

/// Seam between the session controller and the network.
#[async_trait]
pub trait AnalyzeTransport: Send + Sync {
    async fn analyze(&self, request: AnalyzeRequest) -> AnalyzeResult<AnalysisResult>;
}
