//! Progress-callback trait for per-image ingest events.
//!
//! Inject an [`Arc<dyn IngestProgress>`] via
//! [`crate::config::IngestConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the batch. Callers can forward the
//! events to a terminal progress bar, a log, or a dashboard without the
//! library knowing how the host application communicates.
//!
//! Images are processed one at a time, so callbacks arrive in order and are
//! never invoked concurrently; the `Send + Sync` bound exists because the
//! config holding the callback is shareable.

use std::sync::Arc;

use crate::model::RecipeImage;
use crate::output::ImageOutcome;

/// Called by the ingest pipeline as it processes each candidate image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait IngestProgress: Send + Sync {
    /// Called once after scanning, before the first image is processed.
    /// Not called in dry-run mode (nothing will be processed).
    fn on_run_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called just before an image is sent to the extraction service.
    /// `index` is 1-based.
    fn on_image_start(&self, index: usize, total_images: usize, image: &RecipeImage) {
        let _ = (index, total_images, image);
    }

    /// Called once an image has reached a terminal status.
    fn on_image_complete(&self, index: usize, total_images: usize, outcome: &ImageOutcome) {
        let _ = (index, total_images, outcome);
    }
}

/// Shared handle to a progress callback.
pub type ProgressCallback = Arc<dyn IngestProgress>;
