//! The upload-and-report controller.
//!
//! Owns the image selection, the document selection and the screen state.
//! Control flow is linear: collect inputs, validate, submit through a
//! [`Transport`], normalize the response, and leave the outcome on
//! [`Screen`] for rendering.

use crate::{
    config::Config,
    error::{CheckError, TransportError},
    media::{MimeFilter, SelectedFile},
    normalize::{Issue, normalize_issues},
    preview::{PreviewHandle, PreviewItem, PreviewRegistry},
    transport::{RawResponse, Submission, Transport},
};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Composing,
    Loading,
    Results(Vec<Issue>),
    Error(ErrorBanner),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub raw_response: Option<String>,
    /// Set when the form is shown again so the user can resubmit.
    pub form_restored: bool,
}

impl ErrorBanner {
    pub fn from_error(err: &CheckError) -> Self {
        let raw_response = match err {
            CheckError::Parse { raw } => Some(raw.clone()),
            _ => None,
        };
        Self {
            message: err.to_string(),
            raw_response,
            form_restored: err.is_retryable(),
        }
    }
}

#[derive(Debug)]
struct ImageEntry {
    file: SelectedFile,
    preview: PreviewHandle,
}

pub struct UploadController<T: Transport> {
    cfg: Config,
    transport: T,
    filter: MimeFilter,
    previews: PreviewRegistry,
    images: Vec<ImageEntry>,
    document: Option<SelectedFile>,
    document_input: Option<PathBuf>,
    screen: Screen,
    last_response: Option<RawResponse>,
}

impl<T: Transport> UploadController<T> {
    pub fn new(cfg: &Config, transport: T) -> Result<Self> {
        Ok(Self {
            cfg: cfg.clone(),
            transport,
            filter: MimeFilter::new(cfg)?,
            previews: PreviewRegistry::new(),
            images: Vec::new(),
            document: None,
            document_input: None,
            screen: Screen::Composing,
            last_response: None,
        })
    }

    /// Appends the image-typed files in order and drops the rest. Returns how many were kept.
    pub fn add_images(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> usize {
        let mut added = 0;
        for file in files {
            if !self.filter.is_image(&file) {
                debug!("skipping non-image {} ({})", file.name, file.mime);
                continue;
            }
            let preview = self.previews.acquire(&file.name);
            self.images.push(ImageEntry { file, preview });
            added += 1;
        }
        debug!(
            added,
            total = self.images.len(),
            submit_enabled = self.submit_enabled(),
            "images updated"
        );
        added
    }

    pub fn remove_image(&mut self, index: usize) -> Option<SelectedFile> {
        if index >= self.images.len() {
            return None;
        }
        let ImageEntry { file, preview } = self.images.remove(index);
        drop(preview);
        debug!(index, total = self.images.len(), "image removed");
        Some(file)
    }

    /// Returns false when the file was rejected or was already the selected input.
    pub fn set_document(&mut self, file: SelectedFile) -> bool {
        if self.document_input.as_deref() == Some(file.path.as_path()) {
            debug!("document input unchanged: {}", file.path.display());
            return false;
        }
        if self.cfg.upload.enforce_document_type && file.mime != self.cfg.upload.document_mime {
            warn!(
                "rejecting document {} ({}); expected {}",
                file.name, file.mime, self.cfg.upload.document_mime
            );
            return false;
        }
        self.document_input = Some(file.path.clone());
        if let Some(prev) = self.document.replace(file) {
            debug!("replaced document {}", prev.name);
        }
        true
    }

    pub fn remove_document(&mut self) -> Option<SelectedFile> {
        self.document_input = None;
        self.document.take()
    }

    pub fn submit_enabled(&self) -> bool {
        !self.images.is_empty() && self.document.is_some()
    }

    pub fn form_visible(&self) -> bool {
        match &self.screen {
            Screen::Composing => true,
            Screen::Error(banner) => banner.form_restored,
            Screen::Loading | Screen::Results(_) => false,
        }
    }

    pub fn loading_visible(&self) -> bool {
        matches!(self.screen, Screen::Loading)
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn images(&self) -> impl ExactSizeIterator<Item = &SelectedFile> {
        self.images.iter().map(|e| &e.file)
    }

    pub fn document(&self) -> Option<&SelectedFile> {
        self.document.as_ref()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn last_response(&self) -> Option<&RawResponse> {
        self.last_response.as_ref()
    }

    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    pub fn preview_grid(&self) -> Vec<PreviewItem> {
        self.images
            .iter()
            .enumerate()
            .map(|(index, e)| PreviewItem {
                index,
                name: e.file.name.clone(),
                mime: e.file.mime.clone(),
                size: e.file.size,
                url: e.preview.url().to_string(),
            })
            .collect()
    }

    /// Sends the selection once. On success the issues are returned and left on
    /// [`Screen::Results`]; on failure the error is left on [`Screen::Error`].
    pub fn submit(&mut self) -> Result<Vec<Issue>, CheckError> {
        if !self.form_visible() {
            return Err(CheckError::Validation(
                "a submission is already in flight or finished".into(),
            ));
        }
        let document = match (&self.document, self.images.is_empty()) {
            (Some(doc), false) => doc.clone(),
            (None, _) => return Err(CheckError::Validation("no document selected".into())),
            (Some(_), true) => return Err(CheckError::Validation("no images selected".into())),
        };

        let images: Vec<SelectedFile> = self.images().cloned().collect();
        let submission = Submission::new(&images, &document);

        self.screen = Screen::Loading;
        info!(images = images.len(), document = %document.name, "submitting");

        match self.exchange(&submission) {
            Ok(issues) => {
                info!(issues = issues.len(), "submission complete");
                self.screen = Screen::Results(issues.clone());
                Ok(issues)
            }
            Err(err) => {
                warn!("submission failed: {err}");
                self.screen = Screen::Error(ErrorBanner::from_error(&err));
                Err(err)
            }
        }
    }

    fn exchange(&mut self, submission: &Submission) -> Result<Vec<Issue>, CheckError> {
        let resp = self.transport.send(submission)?;
        self.last_response = Some(resp.clone());

        if !resp.is_success() {
            return Err(TransportError::Status {
                status: resp.status,
                body: resp.body.chars().take(200).collect(),
            }
            .into());
        }

        let body: serde_json::Value = serde_json::from_str(&resp.body)
            .map_err(|e| TransportError::InvalidJson(e.to_string()))?;

        match normalize_issues(&body) {
            Some(found) => {
                debug!(path = %found.matched_path, "issues located");
                Ok(found.issues)
            }
            None => Err(CheckError::Parse { raw: resp.body }),
        }
    }
}
