//! CLI binary for bookforge.
//!
//! A thin shim over the library crate that maps CLI flags to `ParseConfig`
//! and prints the parsed book. Input must already be markup (the converter
//! used here is `MarkupPassthrough`).

use anyhow::{Context, Result};
use bookforge::{
    parse_file, print_document, MarkupPassthrough, ParseConfig, ParseProgressCallback,
    PipelineMode, ProgressCallback,
};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
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

// ── CLI progress callback ────────────────────────────────────────────────────

/// Prints one stderr line per pipeline stage.
struct CliProgressCallback {
    started: Instant,
}

impl ParseProgressCallback for CliProgressCallback {
    fn on_parse_start(&self, file_name: &str, byte_len: usize) {
        eprintln!(
            "{} {}  {}",
            bold("◆"),
            bold(file_name),
            dim(&format!("{byte_len} bytes"))
        );
    }

    fn on_markup_ready(&self, markup_len: usize) {
        eprintln!("  {} markup  {}", green("✓"), dim(&format!("{markup_len} bytes")));
    }

    fn on_model_ready(&self, element_count: usize) {
        eprintln!("  {} model   {}", green("✓"), dim(&format!("{element_count} elements")));
    }

    fn on_parse_complete(&self, chapter_count: usize, section_count: usize) {
        eprintln!(
            "{} {} chapters, {} sections  {}",
            green("✔"),
            bold(&chapter_count.to_string()),
            section_count,
            dim(&format!("{}ms", self.started.elapsed().as_millis()))
        );
    }

    fn on_parse_error(&self, error: &str) {
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Chapter outline
  bookforge manuscript.html

  # Full parse result as JSON
  bookforge --json manuscript.html > book.json

  # Normalized page/element model only
  bookforge --model manuscript.html

  # Segment the source markup as-is
  bookforge --direct manuscript.html

  # Write the print-ready document used for PDF export
  bookforge --print-html book-print.html manuscript.html
"#;

/// Split converted document markup into a book of chapters and sections.
#[derive(Parser, Debug)]
#[command(
    name = "bookforge",
    version,
    about = "Split converted document markup into chapters and sections",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markup file produced by a document converter.
    input: PathBuf,

    /// Book title. Default: the file name without `.docx`.
    #[arg(long, env = "BOOKFORGE_TITLE")]
    title: Option<String>,

    /// Segment the input markup verbatim instead of the normalized markup.
    #[arg(long, env = "BOOKFORGE_DIRECT")]
    direct: bool,

    /// Output the full parse result as JSON.
    #[arg(long, conflicts_with = "model")]
    json: bool,

    /// Output the normalized page/element model as JSON.
    #[arg(long)]
    model: bool,

    /// Also write the print-ready document to this path.
    #[arg(long, value_name = "PATH")]
    print_html: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BOOKFORGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BOOKFORGE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if cli.quiet {
        None
    } else {
        Some(Arc::new(CliProgressCallback {
            started: Instant::now(),
        }))
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run parse ────────────────────────────────────────────────────────
    let book = parse_file(&cli.input, &MarkupPassthrough, &config)
        .await
        .with_context(|| format!("Failed to parse {}", cli.input.display()))?;

    if let Some(ref path) = cli.print_html {
        let document = print_document(book.display_title(), &book.raw_html);
        tokio::fs::write(path, document)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("   print document  →  {}", bold(&path.display().to_string()));
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if cli.model {
        let model = book
            .json_data
            .as_ref()
            .context("No normalized model was produced")?;
        let json = model.to_json_pretty().context("Failed to serialise model")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else if cli.json {
        let json = serde_json::to_string_pretty(&book).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        writeln!(handle, "{}", bold(book.display_title())).context("Failed to write to stdout")?;
        handle
            .write_all(book.outline().as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

/// Map CLI args to `ParseConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ParseConfig> {
    let mut builder = ParseConfig::builder()
        .mode(if cli.direct {
            PipelineMode::Direct
        } else {
            PipelineMode::Normalized
        })
        .include_model(cli.json || cli.model);

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
