//! Error types for the cookbook-ingest library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`IngestError`] — **Fatal**: the run cannot proceed at all (unknown
//!   cookbook key, unreadable images directory, store or extractor not
//!   configured). Returned as `Err(IngestError)` from [`crate::ingest`].
//!
//! * [`ImageError`] — **Non-fatal**: a single image failed (unreadable file,
//!   extraction produced nothing usable, rename failed) while the rest of
//!   the batch is fine. Recorded in [`crate::output::ImageOutcome`] so
//!   callers can inspect partial success.
//!
//! * [`StoreError`] — document store failures. Connectivity and query
//!   failures are infrastructure problems, so they convert into
//!   [`IngestError`] and terminate the run rather than being absorbed into
//!   a per-image outcome.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ingest pipeline.
///
/// Per-image failures use [`ImageError`] and are stored in
/// [`crate::output::ImageOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The supplied cookbook key has no record in the cookbooks collection.
    /// Raised before any image I/O happens.
    #[error("cookbook key \"{key}\" is not in the cookbooks collection.\nAdd the cookbook first, or check the key for typos.")]
    UnknownCookbook { key: String },

    /// The images directory could not be enumerated.
    #[error("cannot read images directory '{path}': {source}")]
    ImagesDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No document store was configured for this run.
    #[error("no document store configured.\nProvide a store configuration or inject a pre-built store.")]
    StoreNotConfigured,

    /// No extraction service was configured for this run.
    #[error("extraction service not configured.\nSet OPENAI_API_KEY or inject a pre-built extractor.")]
    ExtractorNotConfigured,

    /// A store operation failed. Store failures are infrastructure
    /// failures and abort the run.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single candidate image.
///
/// The batch continues past these; they surface in the run's outcome list.
#[derive(Debug, Clone, Error, serde::Serialize)]
pub enum ImageError {
    /// The image file could not be read or encoded.
    #[error("cannot read image '{path}': {detail}")]
    Unreadable { path: PathBuf, detail: String },

    /// The extraction service produced no schema-conformant structure,
    /// or the call itself failed. Not retried.
    #[error("extraction failed for '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    /// Renaming the source file failed after its record was persisted.
    /// The persisted record is intact; only the filename marker is missing.
    #[error("persisted, but failed to rename '{from}' to '{to}': {detail}")]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        detail: String,
    },
}

/// Document store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store configuration is incomplete or malformed.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// Could not reach or initialise the store.
    #[error("failed to connect to the document store: {detail}")]
    ConnectFailed { detail: String },

    /// A query or insert failed mid-run.
    #[error("document store operation failed: {detail}")]
    OperationFailed { detail: String },

    /// The extraction could not be serialised into a store document.
    #[error("failed to serialise recipe for insertion: {detail}")]
    SerializeFailed { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_cookbook_names_the_key() {
        let e = IngestError::UnknownCookbook {
            key: "nordic-2019".into(),
        };
        assert!(e.to_string().contains("nordic-2019"));
    }

    #[test]
    fn rename_failed_display_carries_both_paths() {
        let e = ImageError::RenameFailed {
            from: PathBuf::from("photos/IMG_0042.jpg"),
            to: PathBuf::from("photos/C-17.jpg"),
            detail: "permission denied".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("IMG_0042.jpg"), "got: {msg}");
        assert!(msg.contains("C-17.jpg"), "got: {msg}");
    }

    #[test]
    fn store_error_converts_to_fatal() {
        let e: IngestError = StoreError::ConnectFailed {
            detail: "connection refused".into(),
        }
        .into();
        assert!(e.to_string().contains("connection refused"));
    }
}
