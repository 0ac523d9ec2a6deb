//! CLI binary for resume-review.
//!
//! A thin shim over the library crate: `review` maps flags to `ReviewConfig`
//! and prints the result, `serve` mounts the web surface on a shared session.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resume_review::config::DEFAULT_MODEL;
use resume_review::web::{self, DEFAULT_BIND};
use resume_review::{
    prepare, review, PageImageFormat, ProgressCallback, ReviewConfig, ReviewMode,
    ReviewProgressCallback, ReviewSession, UploadedDocument,
};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner on stderr, with one log line per rendered PDF page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ReviewProgressCallback for CliProgressCallback {
    fn on_review_start(&self, name: &str, media_type: &str) {
        self.bar.set_message(format!("{name} {}", dim(&format!("({media_type})"))));
    }

    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        self.bar
            .println(format!("  {} Page {:>3}/{:<3} rendered", green("✓"), page_num, total_pages));
    }

    fn on_request_start(&self, part_count: usize) {
        self.bar.set_prefix("Generating");
        self.bar.set_message(format!(
            "waiting for the model ({part_count} part{})…",
            if part_count == 1 { "" } else { "s" }
        ));
    }

    fn on_review_complete(&self, html_len: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} Review ready {}", green("✔"), dim(&format!("({html_len} chars)")));
    }

    fn on_review_failed(&self, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Roast a PDF resume (HTML on stdout)
  resume-review review resume.pdf

  # Professional review written to a file
  resume-review review --mode professional resume.png -o review.html

  # Show what would be sent, without calling the model
  resume-review review --dry-run resume.pdf

  # Use another vision provider through edgequake-llm
  resume-review review --provider openai --model gpt-4.1-mini resume.pdf

  # Start the web page on http://127.0.0.1:3000
  resume-review serve

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Generative Language API key
  GOOGLE_AI_API_KEY       Alternative name for the same key
  RESUME_REVIEW_MODEL     Model id (default gemini-2.0-flash)
  RESUME_REVIEW_PROVIDER  edgequake-llm provider (openai, anthropic, …)
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Review or roast a resume with a multimodal model.
#[derive(Parser, Debug)]
#[command(
    name = "resume-review",
    version,
    about = "Review (or roast) a resume image or PDF with a multimodal model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RESUME_REVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "RESUME_REVIEW_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "RESUME_REVIEW_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Review one file and print the HTML.
    Review(ReviewArgs),
    /// Serve the upload page over HTTP.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ReviewArgs {
    /// Resume file: an image (PNG, JPEG, WebP, …) or a PDF.
    file: PathBuf,

    /// Review style.
    #[arg(short, long, value_enum, default_value = "roast")]
    mode: ModeArg,

    /// Write the review to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output structured JSON (ReviewOutput) instead of HTML.
    #[arg(long)]
    json: bool,

    /// Normalise the file and list the parts; do not call the model.
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "RESUME_REVIEW_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// Maximum upload size in MiB.
    #[arg(long, env = "RESUME_REVIEW_MAX_UPLOAD_MB", default_value_t = 20,
          value_parser = clap::value_parser!(u32).range(1..=512))]
    max_upload_mb: u32,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Model id.
    #[arg(long, env = "RESUME_REVIEW_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Route through an edgequake-llm provider (openai, anthropic, …) instead
    /// of the built-in Gemini client.
    #[arg(long, env = "RESUME_REVIEW_PROVIDER")]
    provider: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// PDF render magnification (0.25–8.0).
    #[arg(long, env = "RESUME_REVIEW_SCALE", default_value_t = 1.5)]
    scale: f32,

    /// Image format for rendered PDF pages.
    #[arg(long, value_enum, default_value = "png")]
    image_format: ImageFormatArg,

    /// Cap on either edge of a rendered page, in pixels.
    #[arg(long)]
    max_page_pixels: Option<u32>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.4)]
    temperature: f32,

    /// Max output tokens.
    #[arg(long, default_value_t = 4096)]
    max_tokens: u32,

    /// Model call timeout in seconds.
    #[arg(long, env = "RESUME_REVIEW_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Path to the pdfium library (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Show the model's HTML without sanitising it.
    #[arg(long)]
    no_sanitize: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Professional,
    Roast,
}

impl From<ModeArg> for ReviewMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Professional => ReviewMode::Professional,
            ModeArg::Roast => ReviewMode::Roast,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ImageFormatArg {
    Png,
    Jpeg,
}

impl From<ImageFormatArg> for PageImageFormat {
    fn from(v: ImageFormatArg) -> Self {
        match v {
            ImageFormatArg::Png => PageImageFormat::Png,
            ImageFormatArg::Jpeg => PageImageFormat::Jpeg,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs would fight with the spinner; the spinner
    // carries the feedback that matters.
    let show_progress = match cli.command {
        Command::Review(ref args) => !cli.quiet && !cli.no_progress && !args.json && !args.dry_run,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Review(ref args) => run_review(&cli, args, show_progress).await,
        Command::Serve(ref args) => run_serve(args).await,
    }
}

async fn run_review(cli: &Cli, args: &ReviewArgs, show_progress: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ReviewProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args.model, progress)?;
    let mode: ReviewMode = args.mode.into();

    let document = UploadedDocument::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if args.dry_run {
        let parts = prepare(document, &config)
            .await
            .context("Failed to normalise the document")?;
        if args.json {
            let summary: Vec<_> = parts
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    serde_json::json!({
                        "index": i + 1,
                        "media_type": p.media_type,
                        "bytes": p.byte_len(),
                    })
                })
                .collect();
            let json = serde_json::json!({
                "mode": mode,
                "parts": summary,
                "instruction": mode.instruction(),
            });
            println!("{}", serde_json::to_string_pretty(&json).context("Failed to serialise parts")?);
        } else {
            for (i, p) in parts.iter().enumerate() {
                println!("part {:>3}  {:<12} {:>9} bytes", i + 1, p.media_type, p.byte_len());
            }
            println!("instruction ({mode}): {}", mode.instruction());
        }
        return Ok(());
    }

    // ── Review ───────────────────────────────────────────────────────────
    let output = review(document, mode, &config).await.context("Review failed")?;

    let body = if args.json {
        serde_json::to_string_pretty(&output).context("Failed to serialise output")?
    } else {
        output.result.html.clone()
    };

    match args.output {
        Some(ref path) => {
            write_atomic(path, &body).await?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} part(s)  {}ms  →  {}",
                    green("✔"),
                    output.stats.parts,
                    output.stats.total_duration_ms,
                    bold(&path.display().to_string()),
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(body.as_bytes())
                .context("Failed to write to stdout")?;
            if !body.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    if !cli.quiet && !args.json {
        eprintln!(
            "   {} tokens in  /  {} tokens out  /  {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

async fn run_serve(args: &ServeArgs) -> Result<()> {
    let config = build_config(&args.model, None)?;
    let session = Arc::new(ReviewSession::new(config).context("Failed to set up the model client")?);

    let max_upload_bytes = args.max_upload_mb as usize * 1024 * 1024;
    let app = web::router(session, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    tracing::info!(addr = %args.bind, max_upload_mb = args.max_upload_mb, "Server ready and accepting connections");
    eprintln!("{} Listening on {}", cyan("◆"), bold(&format!("http://{}", args.bind)));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        _ = terminate => tracing::info!("Received terminate signal"),
    }
    tracing::info!("Shutting down gracefully...");
}

/// Map CLI args to `ReviewConfig`.
fn build_config(args: &ModelArgs, progress: Option<ProgressCallback>) -> Result<ReviewConfig> {
    let mut builder = ReviewConfig::builder()
        .model(args.model.clone())
        .render_scale(args.scale)
        .page_image_format(args.image_format.into())
        .temperature(args.temperature)
        .max_output_tokens(args.max_tokens)
        .request_timeout_secs(args.timeout)
        .sanitize_html(!args.no_sanitize);

    builder = match args.api_key {
        Some(ref key) => builder.api_key(key.clone()),
        None => builder.api_key_from_env(),
    };
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(px) = args.max_page_pixels {
        builder = builder.max_page_pixels(px);
    }
    if let Some(ref path) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Write to a temp file next to `path`, then rename.
async fn write_atomic(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move output into {}", path.display()))?;
    Ok(())
}
