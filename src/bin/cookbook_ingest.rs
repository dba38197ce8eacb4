//! CLI binary for cookbook-ingest.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `IngestConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use cookbook_ingest::{
    ingest, IngestConfig, IngestProgress, OutcomeStatus, ProgressCallback, RecipeImage,
    StoreConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
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
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a progress bar over the candidate batch plus
/// one log line per completed image.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos}/{len} images  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix("Ingesting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl IngestProgress for CliProgress {
    fn on_run_start(&self, total_images: usize) {
        self.bar.set_length(total_images as u64);
    }

    fn on_image_start(&self, _index: usize, _total: usize, image: &RecipeImage) {
        self.bar
            .set_message(format!("{}", image.filepath.display()));
    }

    fn on_image_complete(
        &self,
        _index: usize,
        _total: usize,
        outcome: &cookbook_ingest::ImageOutcome,
    ) {
        let line = match &outcome.status {
            OutcomeStatus::Persisted {
                page_number,
                renamed_to,
                ..
            } => format!(
                "  {} {}  page {page_number}  {}",
                green("✓"),
                outcome.filepath.display(),
                dim(&format!("renamed to {}", renamed_to.display()))
            ),
            OutcomeStatus::AlreadyExists { page_number } => format!(
                "  {} {}  page {page_number} already captured",
                yellow("∅"),
                outcome.filepath.display()
            ),
            OutcomeStatus::ExtractionFailed { detail } => format!(
                "  {} {}  {}",
                red("✗"),
                outcome.filepath.display(),
                red(detail)
            ),
            OutcomeStatus::RenameFailed { detail, .. } => format!(
                "  {} {}  persisted but not renamed: {}",
                red("!"),
                outcome.filepath.display(),
                red(detail)
            ),
        };
        self.bar.println(line);
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Preview what would be processed (no AI cost, no writes)
  cookbook-ingest --images-dir photos --cookbook-key nordic-2019 --dry-run

  # Ingest a directory of page photos
  cookbook-ingest --images-dir photos --cookbook-key nordic-2019

  # Use a different model and skip the pre-flight delay
  cookbook-ingest --images-dir photos --cookbook-key nordic-2019 \
      --model gpt-4o --preflight-delay 0

  # Structured JSON report on stdout
  cookbook-ingest --images-dir photos --cookbook-key nordic-2019 --json

FILENAME CONVENTION:
  Source files named {cookbook_key}-{page_number}.{ext} are skipped when the
  store already holds that page. Successfully processed files are renamed to
  {cookbook_key}-{extracted_page_number}{ext} in place.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY                   Extraction service API key
  COOKBOOKS_CONNECTION_STRING      MongoDB connection string
  COOKBOOKS_DB_NAME                Database name
  COOKBOOKS_RECIPES_COLLECTION     Recipes collection
  COOKBOOKS_COOKBOOKS_COLLECTION   Cookbooks collection
"#;

/// Process recipe images from a directory into a cookbook.
#[derive(Parser, Debug)]
#[command(
    name = "cookbook-ingest",
    version,
    about = "Process a directory of photographed cookbook pages into structured recipes",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The directory where images are stored.
    #[arg(long, value_name = "DIR")]
    images_dir: PathBuf,

    /// The cookbook's key in the cookbooks collection.
    #[arg(long, value_name = "KEY")]
    cookbook_key: String,

    /// Print the candidate list without calling the extraction service or
    /// writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Extraction model.
    #[arg(long, env = "COOKBOOKS_MODEL", default_value = cookbook_ingest::DEFAULT_MODEL)]
    model: String,

    /// Seconds to wait before the first extraction call (abort window).
    #[arg(long, default_value_t = 5)]
    preflight_delay: u64,

    /// MongoDB connection string.
    #[arg(long, env = "COOKBOOKS_CONNECTION_STRING", hide_env_values = true)]
    connection_string: String,

    /// Database name.
    #[arg(long, env = "COOKBOOKS_DB_NAME")]
    db_name: String,

    /// Recipes collection name.
    #[arg(long, env = "COOKBOOKS_RECIPES_COLLECTION")]
    recipes_collection: String,

    /// Cookbooks collection name.
    #[arg(long, env = "COOKBOOKS_COOKBOOKS_COLLECTION")]
    cookbooks_collection: String,

    /// Output a structured JSON report instead of the summary line.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-image feedback; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
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

    // ── Build config ─────────────────────────────────────────────────────
    let store_config = StoreConfig {
        connection_string: cli.connection_string.clone(),
        database: cli.db_name.clone(),
        recipes_collection: cli.recipes_collection.clone(),
        cookbooks_collection: cli.cookbooks_collection.clone(),
    };

    let mut builder = IngestConfig::builder()
        .model(cli.model.clone())
        .dry_run(cli.dry_run)
        .preflight_delay(Duration::from_secs(cli.preflight_delay))
        .store_config(store_config);

    if show_progress {
        let cb = CliProgress::new();
        builder = builder.progress_callback(cb as ProgressCallback);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = ingest(&cli.images_dir, &cli.cookbook_key, &config)
        .await
        .context("Ingest failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if output.candidates.is_empty() {
        if !cli.quiet {
            println!("No images to process.");
        }
        return Ok(());
    }

    if cli.dry_run {
        println!("Images that would be processed:");
        for candidate in &output.candidates {
            println!("  {}", candidate.filepath.display());
        }
        println!(
            "{}",
            dim("--dry-run enabled: no extraction calls, inserts, or renames")
        );
        return Ok(());
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        let stats = &output.stats;
        let failed = stats.extraction_failures + stats.rename_failures;
        let tick = if failed == 0 { green("✔") } else { yellow("⚠") };
        eprintln!(
            "{tick}  {}/{} images persisted into \"{}\"  {}",
            bold(&stats.persisted.to_string()),
            stats.candidates,
            output.cookbook_key,
            dim(&format!("{}ms", stats.total_duration_ms)),
        );
        if stats.already_existing > 0 {
            eprintln!("   {} already captured", stats.already_existing);
        }
        if failed > 0 {
            eprintln!("   {} failed (see log above)", red(&failed.to_string()));
        }
    }

    Ok(())
}
