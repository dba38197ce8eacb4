//! Output types: what an ingest run reports back to its caller.
//!
//! Per-image failures never abort the batch, so the caller needs a record
//! of what happened to each candidate. [`IngestOutput`] carries the scanned
//! candidate list (everything a dry run reports), one [`ImageOutcome`] per
//! processed image, and aggregate [`IngestStats`].

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::model::RecipeImage;

/// A candidate image as reported after scanning and duplicate filtering.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateImage {
    pub filepath: PathBuf,
    pub cookbook_key: String,
    pub file_format: String,
}

impl From<&RecipeImage> for CandidateImage {
    fn from(image: &RecipeImage) -> Self {
        Self {
            filepath: image.filepath.clone(),
            cookbook_key: image.cookbook_key.clone(),
            file_format: image.file_format.clone(),
        }
    }
}

/// What happened to one candidate image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageOutcome {
    /// The candidate's original path (before any rename).
    pub filepath: PathBuf,
    pub status: OutcomeStatus,
}

/// Terminal status of one candidate.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Extracted, persisted, and renamed.
    Persisted {
        /// Store-assigned record identifier.
        id: String,
        /// Page number as extracted from the page, which is what the file
        /// was renamed to. May differ from the original filename's number.
        page_number: u32,
        renamed_to: PathBuf,
    },
    /// The store already holds a record for this page; nothing was
    /// inserted. The file is still renamed so the next run's filename
    /// pre-filter skips it without an extraction call.
    AlreadyExists { page_number: u32 },
    /// The extraction service produced nothing usable; skipped, no insert,
    /// no rename.
    ExtractionFailed { detail: String },
    /// The record was persisted but the source file could not be renamed.
    /// A rerun will re-extract this page and land on `AlreadyExists`.
    RenameFailed {
        id: String,
        page_number: u32,
        detail: String,
    },
}

impl ImageOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self.status, OutcomeStatus::Persisted { .. })
    }
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    /// Candidates that survived the duplicate filter.
    pub candidates: usize,
    /// Records inserted (and renamed).
    pub persisted: usize,
    /// Candidates whose page already had a record at insert time.
    pub already_existing: usize,
    /// Candidates the extraction service failed on.
    pub extraction_failures: usize,
    /// Persisted records whose source file could not be renamed.
    pub rename_failures: usize,
    /// Wall-clock duration of the whole run.
    pub total_duration_ms: u64,
}

impl IngestStats {
    /// Tally outcomes into counters.
    pub fn tally(candidates: usize, outcomes: &[ImageOutcome], elapsed: Duration) -> Self {
        let mut stats = Self {
            candidates,
            total_duration_ms: elapsed.as_millis() as u64,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Persisted { .. } => stats.persisted += 1,
                OutcomeStatus::AlreadyExists { .. } => stats.already_existing += 1,
                OutcomeStatus::ExtractionFailed { .. } => stats.extraction_failures += 1,
                OutcomeStatus::RenameFailed { .. } => stats.rename_failures += 1,
            }
        }
        stats
    }
}

/// Everything an ingest run produced.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutput {
    pub cookbook_key: String,
    /// True when the run stopped after reporting candidates.
    pub dry_run: bool,
    /// Candidates after scanning and duplicate filtering, in
    /// directory-enumeration order.
    pub candidates: Vec<CandidateImage>,
    /// One entry per processed candidate. Empty in dry-run mode.
    pub outcomes: Vec<ImageOutcome>,
    pub stats: IngestStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_each_status_once() {
        let outcomes = vec![
            ImageOutcome {
                filepath: "a.jpg".into(),
                status: OutcomeStatus::Persisted {
                    id: "1".into(),
                    page_number: 3,
                    renamed_to: "C-3.jpg".into(),
                },
            },
            ImageOutcome {
                filepath: "b.jpg".into(),
                status: OutcomeStatus::ExtractionFailed {
                    detail: "no structure".into(),
                },
            },
            ImageOutcome {
                filepath: "c.jpg".into(),
                status: OutcomeStatus::AlreadyExists { page_number: 9 },
            },
        ];
        let stats = IngestStats::tally(3, &outcomes, Duration::from_millis(1500));
        assert_eq!(stats.candidates, 3);
        assert_eq!(stats.persisted, 1);
        assert_eq!(stats.extraction_failures, 1);
        assert_eq!(stats.already_existing, 1);
        assert_eq!(stats.rename_failures, 0);
        assert_eq!(stats.total_duration_ms, 1500);
    }
}
