use crate::{
    config::Config,
    controller::{ErrorBanner, Screen, UploadController},
    error::CheckError,
    media::SelectedFile,
    normalize::{Issue, normalize_issues},
    render::{render, render_preview},
    report::{FileDigest, Outcome, SubmissionReport, results_dir, submission_id, write_artifacts},
    transport::{HttpTransport, Transport},
    util::{ensure_dir, looks_like_url, now_rfc3339},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "compliance-check")]
#[command(about = "Submit images plus a document to a compliance-checking API and render the issues")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./compliance-check.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload the files and render the returned issues.
    Check {
        #[arg(long = "image", required = true)]
        images: Vec<PathBuf>,
        #[arg(long)]
        document: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Print a JSON summary instead of the rendered report.
        #[arg(long)]
        json: bool,
    },
    /// Show what would be uploaded without sending anything.
    Preview {
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        #[arg(long)]
        document: Option<PathBuf>,
    },
    /// Render a response body saved from an earlier check.
    Render {
        #[arg(long)]
        response: PathBuf,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Check {
            images,
            document,
            out_dir,
            json,
        } => check(&cfg, images, document, out_dir.as_deref(), *json),
        Command::Preview { images, document } => preview(&cfg, images, document.as_deref()),
        Command::Render { response } => render_saved(&cfg, response),
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    let default = PathBuf::from("compliance-check.toml");
    if default.exists() {
        Config::load(&default)
    } else {
        Ok(Config::default())
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Reports go to stdout, so logs stay on stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.output.out_dir).join("compliance-check.log"))
}

fn check(
    cfg: &Config,
    images: &[PathBuf],
    document: &Path,
    out_override: Option<&Path>,
    json: bool,
) -> Result<()> {
    let transport = HttpTransport::new(cfg)?;
    let mut ctl = UploadController::new(cfg, transport)?;
    select_inputs(cfg, &mut ctl, images, Some(document))?;
    let mut stdout = std::io::stdout().lock();
    run_check(cfg, &mut ctl, out_override, json, &mut stdout).map(|_| ())
}

/// Submits the selection and writes the outcome to `out` before persisting
/// anything, so an artifact failure never hides the server's answer.
/// Returns the artifact directory when both the check and the writes succeeded.
pub fn run_check<T: Transport, W: Write>(
    cfg: &Config,
    ctl: &mut UploadController<T>,
    out_override: Option<&Path>,
    json: bool,
    out: &mut W,
) -> Result<PathBuf> {
    let started = now_rfc3339();
    let result = ctl.submit();
    let finished = now_rfc3339();

    let (outcome, issues) = match &result {
        Err(err @ CheckError::Validation(_)) => return Err(err.clone().into()),
        Ok(issues) => (Outcome::from_issues(issues), Some(issues.as_slice())),
        Err(err) => (Outcome::from_error(err), None),
    };

    if !json {
        write!(out, "{}", render(cfg, ctl.screen()))?;
    }

    let persisted = persist(cfg, ctl, started, finished, outcome.clone(), issues, out_override);
    if let Err(err) = &persisted {
        warn!("could not write artifacts: {err:#}");
    }

    if json {
        let (id, dir) = match &persisted {
            Ok((id, dir)) => (Some(id), Some(dir)),
            Err(_) => (None, None),
        };
        writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "submission_id": id,
                "out_dir": dir,
                "outcome": outcome,
                "issues": issues,
            }))?
        )?;
    } else if cfg.global.print_summary {
        if let Ok((id, dir)) = &persisted {
            writeln!(out, "submission {id} -> {}", dir.display())?;
        }
    }

    result?;
    let (_, dir) = persisted?;
    Ok(dir)
}

fn persist<T: Transport>(
    cfg: &Config,
    ctl: &UploadController<T>,
    started: String,
    finished: String,
    outcome: Outcome,
    issues: Option<&[Issue]>,
    out_override: Option<&Path>,
) -> Result<(String, PathBuf)> {
    let images = ctl
        .images()
        .map(FileDigest::of)
        .collect::<Result<Vec<_>>>()?;
    let doc = ctl
        .document()
        .ok_or_else(|| anyhow!("no document selected"))?;
    let document = FileDigest::of(doc)?;
    let id = submission_id(cfg, &images, &document);

    let report = SubmissionReport {
        submission_id: id.clone(),
        started,
        finished,
        endpoint: ctl.endpoint(),
        images,
        document,
        outcome,
    };
    let dir = results_dir(cfg, out_override, &id);
    write_artifacts(cfg, &dir, &report, issues)?;
    Ok((id, dir))
}

fn preview(cfg: &Config, images: &[PathBuf], document: Option<&Path>) -> Result<()> {
    let transport = HttpTransport::new(cfg)?;
    let mut ctl = UploadController::new(cfg, transport)?;
    select_inputs(cfg, &mut ctl, images, document)?;
    write_preview(&ctl, &mut std::io::stdout().lock())
}

pub fn write_preview<T: Transport, W: Write>(ctl: &UploadController<T>, out: &mut W) -> Result<()> {
    let doc_name = ctl.document().map(|d| format!("{} ({})", d.name, d.mime));
    write!(
        out,
        "{}",
        render_preview(&ctl.preview_grid(), doc_name.as_deref(), ctl.submit_enabled())
    )?;
    Ok(())
}

fn render_saved(cfg: &Config, response: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(response)
        .with_context(|| format!("reading response: {}", response.display()))?;
    render_response(cfg, raw, &mut std::io::stdout().lock())
        .with_context(|| format!("rendering {}", response.display()))
}

/// Normalizes and renders a response body. Fails when no issues array is found.
pub fn render_response<W: Write>(cfg: &Config, raw: String, out: &mut W) -> Result<()> {
    let body: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| "response is not valid JSON")?;

    let screen = match normalize_issues(&body) {
        Some(found) => {
            info!(path = %found.matched_path, issues = found.issues.len(), "issues located");
            Screen::Results(found.issues)
        }
        None => Screen::Error(ErrorBanner::from_error(&CheckError::Parse { raw })),
    };
    write!(out, "{}", render(cfg, &screen))?;
    match screen {
        Screen::Error(banner) => Err(anyhow!(banner.message)),
        _ => Ok(()),
    }
}

pub fn select_inputs<T: Transport>(
    cfg: &Config,
    ctl: &mut UploadController<T>,
    images: &[PathBuf],
    document: Option<&Path>,
) -> Result<()> {
    let mut files = Vec::with_capacity(images.len());
    for path in images {
        validate_input(cfg, path)?;
        files.push(SelectedFile::open(cfg, path)?);
    }
    let offered = files.len();
    let added = ctl.add_images(files);
    if added < offered {
        warn!("ignored {} non-image file(s)", offered - added);
    }

    if let Some(path) = document {
        validate_input(cfg, path)?;
        let file = SelectedFile::open(cfg, path)?;
        let mime = file.mime.clone();
        if !ctl.set_document(file) {
            return Err(anyhow!(
                "document rejected: {} is {mime}, expected {}",
                path.display(),
                cfg.upload.document_mime
            ));
        }
    }
    Ok(())
}

fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    Ok(())
}
