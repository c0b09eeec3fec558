use thiserror::Error;

/// Errors that end a submission attempt.
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    /// Submit attempted without the required inputs; nothing changed.
    #[error("upload required files: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response parsed as JSON but held no issues array at any known path.
    #[error("unrecognized response: no issues array found")]
    Parse { raw: String },
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("cannot read {path}: {reason}")]
    File { path: String, reason: String },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
}

impl CheckError {
    /// Transport failures leave the form usable for another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckError::Transport(_))
    }
}
