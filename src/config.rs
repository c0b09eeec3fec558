use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub upload: Upload,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub path: String,
    /// 0 disables the client-side timeout.
    pub timeout_seconds: u64,
    pub user_agent: String,
}
impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            path: "/api/check-compliance".into(),
            timeout_seconds: 0,
            user_agent: concat!("compliance-check/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Api {
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{base}{}", self.path)
        } else {
            format!("{base}/{}", self.path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub image_mime_pattern: String,
    pub document_mime: String,
    pub enforce_document_type: bool,
    pub sniff_content: bool,
    pub max_file_bytes: u64,
}
impl Default for Upload {
    fn default() -> Self {
        Self {
            image_mime_pattern: "^image/".into(),
            document_mime: "application/pdf".into(),
            enforce_document_type: true,
            sniff_content: true,
            max_file_bytes: 100 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Render {
    pub show_raw_response: bool,
    pub raw_response_max_chars: usize,
    pub normalize_unicode: bool,
    #[serde(default = "default_control_chars")]
    pub control_chars_to_sanitize: Vec<u8>,
}
impl Default for Render {
    fn default() -> Self {
        Self {
            show_raw_response: true,
            raw_response_max_chars: 2000,
            normalize_unicode: false,
            control_chars_to_sanitize: default_control_chars(),
        }
    }
}

/// Every C0 control plus DEL; newline, carriage return and tab survive sanitizing anyway.
fn default_control_chars() -> Vec<u8> {
    (0u8..0x20).chain(std::iter::once(0x7f)).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub out_dir: String,
    pub write_report_json: bool,
    pub write_results_json: bool,
    pub report_filename: String,
    pub results_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            write_report_json: true,
            write_results_json: true,
            report_filename: "report.json".into(),
            results_filename: "results.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}
