use crate::{
    config::Config,
    controller::{ErrorBanner, Screen},
    normalize::Issue,
    preview::PreviewItem,
};
use std::fmt::Write;
use unicode_normalization::UnicodeNormalization;

pub const COMPLIANT_BANNER: &str = "COMPLIANT: the document meets every checked requirement. No issues found.";
pub const NO_DESCRIPTION: &str = "No description";
pub const NONE_PROVIDED: &str = "None provided";

pub fn render(cfg: &Config, screen: &Screen) -> String {
    match screen {
        Screen::Composing => "Waiting for files.\n".to_string(),
        Screen::Loading => "Checking compliance...\n".to_string(),
        Screen::Results(issues) => render_issues(cfg, issues),
        Screen::Error(banner) => render_error(cfg, banner),
    }
}

pub fn render_issues(cfg: &Config, issues: &[Issue]) -> String {
    if issues.is_empty() {
        return format!("{COMPLIANT_BANNER}\n");
    }

    let mut out = String::new();
    let noun = if issues.len() == 1 { "issue" } else { "issues" };
    let _ = writeln!(out, "Found {} compliance {noun}", issues.len());

    for (i, issue) in issues.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Issue {}", i + 1);
        let _ = writeln!(
            out,
            "  Issue:         {}",
            field(cfg, issue.issue_identified.as_deref(), NO_DESCRIPTION)
        );
        let _ = writeln!(
            out,
            "  Evidence:      {}",
            field(cfg, issue.evidence.as_deref(), NONE_PROVIDED)
        );
        let _ = writeln!(
            out,
            "  Suggested fix: {}",
            field(cfg, issue.suggested_fix.as_deref(), NONE_PROVIDED)
        );
    }
    out
}

pub fn render_error(cfg: &Config, banner: &ErrorBanner) -> String {
    let mut out = format!("ERROR: {}\n", sanitize(cfg, &banner.message));
    if cfg.render.show_raw_response {
        if let Some(raw) = &banner.raw_response {
            let clipped: String = raw.chars().take(cfg.render.raw_response_max_chars).collect();
            let _ = writeln!(out, "Raw response:");
            let _ = writeln!(out, "{}", sanitize(cfg, &clipped));
            if clipped.len() < raw.len() {
                let _ = writeln!(out, "[truncated]");
            }
        }
    }
    if banner.form_restored {
        let _ = writeln!(out, "Nothing was checked; the files are still selected.");
    }
    out
}

pub fn render_preview(items: &[PreviewItem], document: Option<&str>, submit_enabled: bool) -> String {
    let mut out = String::new();
    if items.is_empty() {
        let _ = writeln!(out, "Images: none");
    } else {
        let _ = writeln!(out, "Images:");
        for it in items {
            let _ = writeln!(out, "  [{}] {} ({}, {} bytes)", it.index, it.name, it.mime, it.size);
        }
    }
    let _ = writeln!(out, "Document: {}", document.unwrap_or("none"));
    let _ = writeln!(
        out,
        "Submit: {}",
        if submit_enabled { "ready" } else { "disabled" }
    );
    out
}

fn field(cfg: &Config, value: Option<&str>, placeholder: &str) -> String {
    match value.map(|v| sanitize(cfg, v)) {
        Some(v) if !v.is_empty() => v,
        _ => placeholder.to_string(),
    }
}

/// Server text goes straight to a terminal: strip configured controls, and NFKC it when enabled.
pub fn sanitize(cfg: &Config, s: &str) -> String {
    let s = if cfg.render.normalize_unicode {
        s.nfkc().collect::<String>()
    } else {
        s.to_string()
    };
    sanitize_control_chars(&s, &cfg.render.control_chars_to_sanitize)
}

fn sanitize_control_chars(s: &str, codes: &[u8]) -> String {
    if codes.is_empty() {
        return s.to_string();
    }

    let mut mask = [false; 128];
    for &code in codes {
        if (code as usize) < mask.len() {
            mask[code as usize] = true;
        }
    }

    s.chars()
        .filter(|&ch| {
            if ch == '\n' || ch == '\r' || ch == '\t' {
                return true;
            }
            let cp = ch as u32;
            if cp < 128 {
                !mask[cp as usize]
            } else {
                // C1 controls carry terminal escapes too.
                !(0x80..0xa0).contains(&cp)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_escape_sequences() {
        let cfg = Config::default();
        let out = sanitize(&cfg, "red\u{1b}[31mtext\u{009b}\ttab");
        assert_eq!(out, "red[31mtext\ttab");
    }

    #[test]
    fn empty_fields_use_placeholders() {
        let cfg = Config::default();
        let issue = Issue {
            issue_identified: Some(String::new()),
            evidence: None,
            suggested_fix: Some("Fix it".into()),
        };
        let out = render_issues(&cfg, &[issue]);
        assert!(out.contains(NO_DESCRIPTION));
        assert!(out.contains(NONE_PROVIDED));
        assert!(out.contains("Fix it"));
    }

    #[test]
    fn whitespace_text_is_shown_as_sent() {
        let cfg = Config::default();
        let issue = Issue {
            issue_identified: Some(" ".into()),
            evidence: Some(String::new()),
            suggested_fix: None,
        };
        let out = render_issues(&cfg, &[issue]);
        assert!(out.contains("  Issue:          \n"));
        assert!(!out.contains(NO_DESCRIPTION));
        assert_eq!(out.matches(NONE_PROVIDED).count(), 2);
    }

    #[test]
    fn server_text_keeps_its_code_points_by_default() {
        let cfg = Config::default();
        assert_eq!(sanitize(&cfg, "\u{fb01}le \u{ff21}1"), "\u{fb01}le \u{ff21}1");

        let mut nfkc = Config::default();
        nfkc.render.normalize_unicode = true;
        assert_eq!(sanitize(&nfkc, "\u{fb01}le \u{ff21}1"), "file A1");
    }
}
