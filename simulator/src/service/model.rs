use serde::{Deserialize, Serialize};

pub const NO_IMAGE_PROVIDED: &str = "No image provided";
pub const NO_IMAGE_SELECTED: &str = "No image selected";

/// The `image` part of an analyze upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Body of every non-2xx reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
