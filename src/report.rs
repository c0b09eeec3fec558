use crate::{
    config::Config,
    error::CheckError,
    media::SelectedFile,
    normalize::{Issue, IssuesPayload},
    util::{ensure_dir, hash_file, sha256_hex},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub submission_id: String,
    pub started: String,
    pub finished: String,
    pub endpoint: String,
    pub images: Vec<FileDigest>,
    pub document: FileDigest,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDigest {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub sha256: String,
}

impl FileDigest {
    pub fn of(file: &SelectedFile) -> Result<Self> {
        Ok(Self {
            name: file.name.clone(),
            mime: file.mime.clone(),
            size: file.size,
            sha256: hash_file(&file.path)
                .with_context(|| format!("hashing {}", file.path.display()))?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Compliant,
    Issues { count: usize },
    Error { message: String },
}

impl Outcome {
    pub fn from_issues(issues: &[Issue]) -> Self {
        if issues.is_empty() {
            Outcome::Compliant
        } else {
            Outcome::Issues {
                count: issues.len(),
            }
        }
    }

    pub fn from_error(err: &CheckError) -> Self {
        Outcome::Error {
            message: err.to_string(),
        }
    }
}

/// Content-addressed id: same config and same files give the same id.
pub fn submission_id(cfg: &Config, images: &[FileDigest], document: &FileDigest) -> String {
    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    let mut key = cfg_hash;
    for d in images.iter().chain(std::iter::once(document)) {
        key.push(':');
        key.push_str(&d.sha256);
    }
    sha256_hex(key.as_bytes())
}

pub fn results_dir(cfg: &Config, out_override: Option<&Path>, id: &str) -> PathBuf {
    out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.output.out_dir))
        .join(id)
}

/// Writes the enabled artifacts into `dir` and returns the paths written.
pub fn write_artifacts(
    cfg: &Config,
    dir: &Path,
    report: &SubmissionReport,
    issues: Option<&[Issue]>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if !cfg.output.write_report_json && !cfg.output.write_results_json {
        return Ok(written);
    }
    ensure_dir(dir)?;

    if cfg.output.write_results_json {
        if let Some(issues) = issues {
            let path = dir.join(&cfg.output.results_filename);
            let payload = IssuesPayload {
                issues: issues.to_vec(),
            };
            std::fs::write(&path, serde_json::to_string_pretty(&payload)?)
                .with_context(|| format!("writing {}", path.display()))?;
            written.push(path);
        }
    }

    if cfg.output.write_report_json {
        let path = dir.join(&cfg.output.report_filename);
        std::fs::write(&path, serde_json::to_string_pretty(report)?)
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }

    info!("wrote {} artifact(s) to {}", written.len(), dir.display());
    Ok(written)
}
