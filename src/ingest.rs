//! The ingest run: sequence the pipeline stages for one directory and one
//! cookbook.
//!
//! Images are processed strictly one at a time: encode, extract, persist,
//! rename, then the next candidate. A failure local to one image is logged,
//! recorded in the outcome list, and never aborts the batch; failures in
//! preconditions or infrastructure (unknown cookbook, store unreachable)
//! abort the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::error::{ImageError, IngestError};
use crate::model::RecipeImage;
use crate::output::{CandidateImage, ImageOutcome, IngestOutput, IngestStats, OutcomeStatus};
use crate::pipeline::{extract, scan};
use crate::store::{InsertOutcome, MongoRecipeStore, RecipeStore};

/// Ingest every unprocessed image in `images_dir` into `cookbook_key`.
///
/// # Returns
/// `Ok(IngestOutput)` on completion, even if some images failed (check
/// `output.outcomes` and `output.stats`).
///
/// # Errors
/// Returns `Err(IngestError)` only for fatal errors:
/// - `cookbook_key` has no record in the cookbooks collection (checked
///   before any image I/O)
/// - the images directory cannot be read
/// - the store or extraction service is not configured or unreachable
pub async fn ingest(
    images_dir: impl AsRef<Path>,
    cookbook_key: &str,
    config: &IngestConfig,
) -> Result<IngestOutput, IngestError> {
    let total_start = Instant::now();
    let images_dir = images_dir.as_ref();
    info!(
        "Starting ingest of {} into cookbook \"{cookbook_key}\"",
        images_dir.display()
    );

    // ── Step 1: Resolve the store and validate the cookbook key ─────────
    let store = resolve_store(config).await?;
    if !store.is_known_cookbook(cookbook_key).await? {
        return Err(IngestError::UnknownCookbook {
            key: cookbook_key.to_string(),
        });
    }

    // ── Step 2: Scan the directory and drop known duplicates ────────────
    let images = scan::scan_images(images_dir, cookbook_key, store.as_ref()).await?;
    if images.is_empty() {
        info!("No images to process");
        return Ok(IngestOutput {
            cookbook_key: cookbook_key.to_string(),
            dry_run: config.dry_run,
            candidates: Vec::new(),
            outcomes: Vec::new(),
            stats: IngestStats::tally(0, &[], total_start.elapsed()),
        });
    }

    let candidates: Vec<CandidateImage> = images.iter().map(CandidateImage::from).collect();
    info!("{} images to process:", images.len());
    for image in &images {
        info!("  {image}");
    }

    // ── Step 3: Dry run stops before any external call ───────────────────
    if config.dry_run {
        info!("Dry run: skipping extraction, inserts, and renames");
        return Ok(IngestOutput {
            cookbook_key: cookbook_key.to_string(),
            dry_run: true,
            candidates,
            outcomes: Vec::new(),
            stats: IngestStats::tally(images.len(), &[], total_start.elapsed()),
        });
    }

    // ── Step 4: Pre-flight delay, the operator's abort window ────────────
    if !config.preflight_delay.is_zero() {
        info!(
            "Waiting {:?} before the first extraction call (interrupt now to abort)",
            config.preflight_delay
        );
        tokio::time::sleep(config.preflight_delay).await;
    }

    // ── Step 5: Process each candidate in order ──────────────────────────
    let extractor = resolve_extractor(config)?;
    let total = images.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut outcomes = Vec::with_capacity(total);
    for (i, image) in images.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_start(i + 1, total, image);
        }
        let outcome = process_image(extractor.as_ref(), store.as_ref(), image, cookbook_key).await?;
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_complete(i + 1, total, &outcome);
        }
        outcomes.push(outcome);
    }

    // ── Step 6: Tally ────────────────────────────────────────────────────
    let stats = IngestStats::tally(total, &outcomes, total_start.elapsed());
    info!(
        "Ingest complete: {}/{} persisted, {} already present, {} failed, {}ms",
        stats.persisted,
        stats.candidates,
        stats.already_existing,
        stats.extraction_failures + stats.rename_failures,
        stats.total_duration_ms
    );

    Ok(IngestOutput {
        cookbook_key: cookbook_key.to_string(),
        dry_run: false,
        candidates,
        outcomes,
        stats,
    })
}

/// Synchronous wrapper around [`ingest`].
///
/// Creates a temporary tokio runtime internally.
pub fn ingest_sync(
    images_dir: impl AsRef<Path>,
    cookbook_key: &str,
    config: &IngestConfig,
) -> Result<IngestOutput, IngestError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| IngestError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(ingest(images_dir, cookbook_key, config))
}

/// Run one candidate through extract → persist → rename.
///
/// Per-image failures become an [`ImageOutcome`]; only store failures
/// (infrastructure) propagate as `Err`.
async fn process_image(
    extractor: &dyn extract::RecipeExtractor,
    store: &dyn RecipeStore,
    image: &RecipeImage,
    cookbook_key: &str,
) -> Result<ImageOutcome, IngestError> {
    let extraction = match extractor.extract(image).await {
        Ok(extraction) => extraction,
        Err(e) => {
            warn!("Image {image} failed extraction: {e}");
            return Ok(ImageOutcome {
                filepath: image.filepath.clone(),
                status: OutcomeStatus::ExtractionFailed {
                    detail: e.to_string(),
                },
            });
        }
    };

    let page_number = extraction.page_number;
    let insert = store.insert_recipe(&extraction, cookbook_key).await?;
    // The rename target always carries the extracted page number, so the
    // next run's filename pre-filter sees the page the store record has,
    // even when the original filename was wrong or absent.
    let renamed = renamed_path(&image.filepath, cookbook_key, page_number);

    let status = match insert {
        InsertOutcome::Inserted(id) => {
            info!(
                "Persisted \"{}\" (page {page_number}) from {image} with id {id}",
                extraction.name_of_dish
            );
            match tokio::fs::rename(&image.filepath, &renamed).await {
                Ok(()) => OutcomeStatus::Persisted {
                    id,
                    page_number,
                    renamed_to: renamed,
                },
                Err(e) => {
                    let rename_err = ImageError::RenameFailed {
                        from: image.filepath.clone(),
                        to: renamed,
                        detail: e.to_string(),
                    };
                    error!("{rename_err}");
                    OutcomeStatus::RenameFailed {
                        id,
                        page_number,
                        detail: e.to_string(),
                    }
                }
            }
        }
        InsertOutcome::AlreadyExists => {
            warn!(
                "A record for (\"{cookbook_key}\", page {page_number}) already exists; \
                 not inserting a duplicate for {image}"
            );
            // Rename anyway: the filename pre-filter will then skip this
            // page next run without an extraction call.
            if let Err(e) = tokio::fs::rename(&image.filepath, &renamed).await {
                warn!(
                    "Could not rename {} to {}: {e}",
                    image.filepath.display(),
                    renamed.display()
                );
            }
            OutcomeStatus::AlreadyExists { page_number }
        }
    };

    Ok(ImageOutcome {
        filepath: image.filepath.clone(),
        status,
    })
}

/// Target path for a processed image: `{cookbook_key}-{page_number}` with
/// the original suffix, in the same directory.
pub fn renamed_path(filepath: &Path, cookbook_key: &str, page_number: u32) -> PathBuf {
    let suffix = filepath
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    filepath.with_file_name(format!("{cookbook_key}-{page_number}{suffix}"))
}

/// Resolve the store, most-specific first: a pre-built instance, then the
/// connection settings.
async fn resolve_store(config: &IngestConfig) -> Result<Arc<dyn RecipeStore>, IngestError> {
    if let Some(ref store) = config.store {
        return Ok(Arc::clone(store));
    }
    if let Some(ref store_config) = config.store_config {
        let store = MongoRecipeStore::connect(store_config).await?;
        return Ok(Arc::new(store));
    }
    Err(IngestError::StoreNotConfigured)
}

/// Resolve the extractor: a pre-built instance, an explicit API key, or
/// the `OPENAI_API_KEY` environment variable.
fn resolve_extractor(
    config: &IngestConfig,
) -> Result<Arc<dyn extract::RecipeExtractor>, IngestError> {
    if let Some(ref extractor) = config.extractor {
        return Ok(Arc::clone(extractor));
    }
    if let Some(ref key) = config.api_key {
        return Ok(Arc::new(extract::OpenAiExtractor::new(
            key.as_str(),
            config.model.as_str(),
        )));
    }
    Ok(Arc::new(extract::OpenAiExtractor::from_env(
        config.model.as_str(),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renamed_path_uses_extracted_page_and_keeps_suffix() {
        assert_eq!(
            renamed_path(Path::new("photos/IMG_0042.JPG"), "nordic", 17),
            PathBuf::from("photos/nordic-17.JPG")
        );
    }

    #[test]
    fn renamed_path_without_extension_gets_no_suffix() {
        assert_eq!(
            renamed_path(Path::new("photos/cover"), "nordic", 1),
            PathBuf::from("photos/nordic-1")
        );
    }
}
