//! # cookbook-ingest
//!
//! Ingest photographed cookbook pages into structured recipe records using
//! a vision language model and a MongoDB document store.
//!
//! ## Why this crate?
//!
//! Typing recipes out of a paper cookbook is slow, and OCR on a photo of a
//! dense two-column recipe page produces soup. A vision model reads the
//! page as a human would and returns structured data: dish name, serving
//! size, categorised ingredients, and the procedure with its original
//! wording intact. This crate wraps that call in the batch plumbing a real
//! capture workflow needs: duplicate filtering so pages photographed twice
//! are not paid for twice, per-image failure isolation, and a filename
//! convention that records what has already been captured.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images dir
//!  │
//!  ├─ 1. Validate  cookbook key must exist in the store
//!  ├─ 2. Scan      enumerate files, skip pages already captured
//!  ├─ 3. Encode    file bytes → base64 data-URI
//!  ├─ 4. Extract   vision-LLM call with a strict response schema
//!  ├─ 5. Persist   insert into the recipes collection (unique index guard)
//!  └─ 6. Rename    {cookbook_key}-{extracted_page}{suffix}
//! ```
//!
//! Steps 4 to 6 run once per candidate, strictly in sequence; a failed
//! image is logged and skipped, never aborting the batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cookbook_ingest::{ingest, IngestConfig, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IngestConfig::builder()
//!         .store_config(StoreConfig::from_env()?)
//!         .build()?;
//!     // API key read from OPENAI_API_KEY
//!     let output = ingest("photos", "nordic-2019", &config).await?;
//!     println!(
//!         "{}/{} pages persisted",
//!         output.stats.persisted, output.stats.candidates
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cookbook-ingest` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cookbook-ingest = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{IngestConfig, IngestConfigBuilder, StoreConfig, DEFAULT_MODEL};
pub use error::{ImageError, IngestError, StoreError};
pub use ingest::{ingest, ingest_sync, renamed_path};
pub use model::{IngredientList, InstructionStep, RecipeExtraction, RecipeImage};
pub use output::{CandidateImage, ImageOutcome, IngestOutput, IngestStats, OutcomeStatus};
pub use pipeline::extract::{OpenAiExtractor, RecipeExtractor};
pub use pipeline::scan::scan_images;
pub use progress::{IngestProgress, ProgressCallback};
pub use store::{InsertOutcome, MongoRecipeStore, RecipeStore};
