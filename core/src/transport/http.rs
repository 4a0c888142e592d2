use crate::api::{interpret_response, AnalysisResult};
use crate::config::SessionConfig;
use crate::prelude::{AnalyzeError, AnalyzeRequest, AnalyzeResult, AnalyzeTransport, IMAGE_FIELD};
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};

/// Uploads the selected file as `multipart/form-data` and decodes the reply.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &SessionConfig) -> AnalyzeResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| AnalyzeError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    fn form(request: &AnalyzeRequest) -> AnalyzeResult<Form> {
        let part = Part::bytes(request.file.bytes().to_vec())
            .file_name(request.file.name().to_string())
            .mime_str(request.file.content_type())
            .map_err(|err| AnalyzeError::Transport(err.to_string()))?;
        Ok(Form::new().part(IMAGE_FIELD, part))
    }
}

#[async_trait]
impl AnalyzeTransport for HttpTransport {
    async fn analyze(&self, request: AnalyzeRequest) -> AnalyzeResult<AnalysisResult> {
        let form = Self::form(&request)?;
        let response = self
            .client
            .post(&request.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| AnalyzeError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| AnalyzeError::Transport(err.to_string()))?;
        debug!("{} answered {} ({} bytes)", request.endpoint, status, body.len());

        interpret_response(status.as_u16(), &body)
    }
}
