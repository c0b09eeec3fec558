use crate::config::Config;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// A file the user picked, with the MIME type it was classified as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, mime: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let name = file_name(&path);
        Self {
            path,
            name,
            mime: mime.into(),
            size,
        }
    }

    /// Stat the file and classify it. Content sniffing wins over the extension.
    pub fn open(cfg: &Config, path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
        if !meta.is_file() {
            anyhow::bail!("not a regular file: {}", path.display());
        }
        if meta.len() > cfg.upload.max_file_bytes {
            anyhow::bail!(
                "file exceeds upload.max_file_bytes ({} > {}): {}",
                meta.len(),
                cfg.upload.max_file_bytes,
                path.display()
            );
        }

        let sniffed = if cfg.upload.sniff_content {
            infer::get_from_path(path)
                .with_context(|| format!("sniffing {}", path.display()))?
                .map(|t| t.mime_type().to_string())
        } else {
            None
        };
        let mime = sniffed
            .or_else(|| mime_from_extension(path).map(str::to_string))
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        debug!("classified {} as {mime}", path.display());

        Ok(Self::new(path, mime, meta.len()))
    }

    pub fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

/// Decides which selected files count as images.
#[derive(Debug, Clone)]
pub struct MimeFilter {
    image: Regex,
}

impl MimeFilter {
    pub fn new(cfg: &Config) -> Result<Self> {
        let image = Regex::new(&cfg.upload.image_mime_pattern).with_context(|| {
            format!(
                "invalid upload.image_mime_pattern: {}",
                cfg.upload.image_mime_pattern
            )
        })?;
        Ok(Self { image })
    }

    pub fn is_image(&self, file: &SelectedFile) -> bool {
        self.image.is_match(&file.mime)
    }
}
