//! CLI binary for edgequake-chunkify.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ChunkifyConfig` and prints sections as JSON (or the Markdown itself).

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_chunkify::{
    chunkify, ChunkifyConfig, NormalizeProgressCallback, NormalizerConfig, PageSelection,
    PageSeparator, ParseConfig, ProgressCallback, RetryConfig, TextEncoding,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// Live progress bar over sections being normalised. Sections may finish
/// out of order when concurrency is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} sections  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Normalising");
        self.bar.reset_eta();
    }
}

impl NormalizeProgressCallback for CliProgressCallback {
    fn on_normalize_start(&self, total_sections: usize) {
        self.activate_bar(total_sections);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Normalising {total_sections} sections…"))
        ));
    }

    fn on_section_start(&self, index: usize, total: usize) {
        self.bar.set_message(format!("section {}/{}", index + 1, total));
    }

    fn on_section_complete(&self, _index: usize, _total: usize, attempts: u32) {
        if attempts > 1 {
            self.bar
                .println(dim(&format!("  ↻ succeeded after {attempts} attempts")));
        }
        self.bar.inc(1);
    }

    fn on_section_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Section {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_normalize_complete(&self, total: usize, normalized: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(normalized);
        if failed == 0 {
            eprintln!("{} {} sections normalised", green("✔"), bold(&normalized.to_string()));
        } else {
            eprintln!(
                "{} {}/{} sections normalised  ({} kept original text)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&normalized.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split a PDF into sections (JSON on stdout)
  chunkify paper.pdf

  # Split a Markdown file written in Latin-1
  chunkify --encoding latin-1 notes.md

  # Write sections to a file and keep the converted Markdown
  chunkify paper.pdf -o sections.json --markdown-out converted/

  # Replace non-ASCII characters in every section via an LLM
  chunkify --normalize --provider gemini --model gemini-2.0-flash paper.pdf

  # Only print the Markdown the PDF converts to
  chunkify --markdown --pages 1-5 paper.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID (default gemini-2.0-flash)
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, e.g. edgequake_chunkify=debug
"#;

/// Split PDF and Markdown documents into header-delimited sections.
#[derive(Parser, Debug)]
#[command(
    name = "chunkify",
    version,
    about = "Split PDF and Markdown documents into header-delimited sections",
    long_about = "Convert a PDF (local file or URL) to Markdown, split it into sections by \
header depth with each section's H1-H4 ancestors, and optionally normalise every section's \
text through an LLM.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF or Markdown file path, or HTTP/HTTPS URL to a PDF.
    input: String,

    /// Write sections JSON to this file instead of stdout.
    #[arg(short, long, env = "CHUNKIFY_OUTPUT")]
    output: Option<PathBuf>,

    /// Persist converted Markdown as <DIR>/<pdf stem>.md.
    #[arg(long, env = "CHUNKIFY_MARKDOWN_OUT", value_name = "DIR")]
    markdown_out: Option<PathBuf>,

    /// Print the Markdown instead of the sections.
    #[arg(long)]
    markdown: bool,

    /// Rewrite every section through the LLM normaliser.
    #[arg(long, env = "CHUNKIFY_NORMALIZE")]
    normalize: bool,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID. Default: gemini-2.0-flash.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Attempts per section, first call included.
    #[arg(long, env = "CHUNKIFY_ATTEMPTS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..))]
    attempts: u32,

    /// Upper bound on a single retry wait, in milliseconds.
    #[arg(long, env = "CHUNKIFY_MAX_WAIT_MS", default_value_t = 10_000)]
    max_wait_ms: u64,

    /// Sections normalised at once.
    #[arg(short, long, env = "CHUNKIFY_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Path to a prompt template file; must contain {section_content}.
    #[arg(long, env = "CHUNKIFY_INSTRUCTIONS")]
    instructions: Option<PathBuf>,

    /// Encoding of Markdown input, any WHATWG label: utf-8, windows-1252, shift_jis, utf-16.
    #[arg(long, env = "CHUNKIFY_ENCODING", default_value = "utf-8")]
    encoding: String,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "CHUNKIFY_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CHUNKIFY_PASSWORD")]
    password: Option<String>,

    /// Page separator: none, hr, comment, or custom string.
    #[arg(long, env = "CHUNKIFY_SEPARATOR", default_value = "none")]
    separator: String,

    /// Distinct font sizes mapped to heading levels (1–6).
    #[arg(long, env = "CHUNKIFY_HEADING_LEVELS", default_value_t = 4,
          value_parser = clap::value_parser!(u8).range(1..=6))]
    heading_levels: u8,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "CHUNKIFY_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "CHUNKIFY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CHUNKIFY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CHUNKIFY_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is on screen.
    let show_progress = cli.normalize && !cli.quiet && !cli.no_progress;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn NormalizeProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    let output = chunkify(&cli.input, &config)
        .await
        .with_context(|| format!("Failed to chunkify '{}'", cli.input))?;

    // ── Emit ─────────────────────────────────────────────────────────────
    if cli.markdown {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    } else if let Some(ref path) = cli.output {
        edgequake_chunkify::output::write_sections_json(path, &output.sections)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        let json =
            serde_json::to_string_pretty(&output.sections).context("Failed to serialise sections")?;
        println!("{json}");
    }

    if !cli.quiet {
        let stats = &output.stats;
        let target = cli
            .output
            .as_ref()
            .filter(|_| !cli.markdown)
            .map(|p| format!("  →  {}", bold(&p.display().to_string())))
            .unwrap_or_default();
        eprintln!(
            "{}  {} sections  {}ms{}",
            if stats.failed_sections == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.section_count,
            stats.total_duration_ms,
            target,
        );
        if let Some(ref md) = stats.markdown_path {
            eprintln!("   markdown  {}", dim(&md.display().to_string()));
        }
        if stats.normalized_sections + stats.failed_sections > 0 {
            eprintln!(
                "   {} normalised  /  {} failed  /  {} tokens out",
                dim(&stats.normalized_sections.to_string()),
                dim(&stats.failed_sections.to_string()),
                dim(&stats.output_tokens.to_string()),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ChunkifyConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ChunkifyConfig> {
    let pages: PageSelection = cli.pages.parse().context("Invalid --pages")?;
    let encoding: TextEncoding = cli.encoding.parse().context("Invalid --encoding")?;

    let mut parse = ParseConfig::builder()
        .pages(pages)
        .page_separator(PageSeparator::from(cli.separator.as_str()))
        .max_heading_levels(cli.heading_levels as usize)
        .download_timeout_secs(cli.download_timeout);
    if let Some(ref pwd) = cli.password {
        parse = parse.password(pwd.clone());
    }
    if let Some(ref dir) = cli.markdown_out {
        parse = parse.destination(dir.clone());
    }

    let mut builder = ChunkifyConfig::builder()
        .parse(parse.build()?)
        .encoding(encoding);

    if cli.normalize {
        let mut normalizer = NormalizerConfig::builder()
            .retry(RetryConfig {
                attempts: cli.attempts,
                max_wait_ms: cli.max_wait_ms,
                ..Default::default()
            })
            .concurrency(cli.concurrency);
        if let Some(ref m) = cli.model {
            normalizer = normalizer.model(m.clone());
        }
        if let Some(ref p) = cli.provider {
            normalizer = normalizer.provider_name(p.clone());
        }
        if let Some(ref path) = cli.instructions {
            let template = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read instructions from {:?}", path))?;
            normalizer = normalizer.instructions(template);
        }
        builder = builder.normalize(normalizer.build()?);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}
