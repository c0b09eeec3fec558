use crate::{config::Config, error::TransportError, media::SelectedFile};
use reqwest::blocking::{
    Client,
    multipart::{Form, Part},
};
use std::time::Duration;
use tracing::{debug, info};

pub const IMAGES_FIELD: &str = "images";
pub const DOCUMENT_FIELD: &str = "pdf";

#[derive(Debug, Clone)]
pub struct FormPart {
    pub field: &'static str,
    pub file: SelectedFile,
}

/// The multipart body of one check request: every image, then the document.
#[derive(Debug, Clone)]
pub struct Submission {
    pub parts: Vec<FormPart>,
}

impl Submission {
    pub fn new(images: &[SelectedFile], document: &SelectedFile) -> Self {
        let mut parts: Vec<FormPart> = images
            .iter()
            .map(|f| FormPart {
                field: IMAGES_FIELD,
                file: f.clone(),
            })
            .collect();
        parts.push(FormPart {
            field: DOCUMENT_FIELD,
            file: document.clone(),
        });
        Self { parts }
    }

    pub fn files(&self) -> impl Iterator<Item = &SelectedFile> {
        self.parts.iter().map(|p| &p.file)
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    fn endpoint(&self) -> String;
    fn send(&self, submission: &Submission) -> Result<RawResponse, TransportError>;
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(cfg: &Config) -> Result<Self, TransportError> {
        let timeout = (cfg.api.timeout_seconds > 0)
            .then(|| Duration::from_secs(cfg.api.timeout_seconds));
        let client = Client::builder()
            .user_agent(cfg.api.user_agent.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: cfg.api.endpoint(),
        })
    }

    fn build_form(submission: &Submission) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for part in &submission.parts {
            let file = &part.file;
            let bytes = file.read_bytes().map_err(|e| TransportError::File {
                path: file.path.display().to_string(),
                reason: e.to_string(),
            })?;
            let body = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(&file.mime)
                .map_err(|e| TransportError::File {
                    path: file.path.display().to_string(),
                    reason: format!("bad MIME type {}: {e}", file.mime),
                })?;
            form = form.part(part.field, body);
        }
        Ok(form)
    }
}

impl Transport for HttpTransport {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn send(&self, submission: &Submission) -> Result<RawResponse, TransportError> {
        let form = Self::build_form(submission)?;
        info!(endpoint = %self.endpoint, parts = submission.parts.len(), "POST multipart");

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| TransportError::Network(format!("reading response body: {e}")))?;
        debug!(status, bytes = body.len(), "response received");
        Ok(RawResponse { status, body })
    }
}
