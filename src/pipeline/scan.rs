//! Directory scanning and duplicate filtering.
//!
//! Source files follow the convention `{cookbook_key}-{page_number}.{ext}`.
//! The page token is only a heuristic pre-filter: when it parses as a
//! number and the store already holds a record for
//! `(cookbook_key, page_number)`, the file is skipped before any encoding
//! or extraction cost. A filename that does not parse proves nothing, so
//! such files stay in the candidate set; the unique store index catches any
//! that turn out to be duplicates after extraction.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::model::RecipeImage;
use crate::store::RecipeStore;

/// macOS Finder artifact that shows up in photo directories.
const HIDDEN_ARTIFACT: &str = ".DS_Store";

/// Enumerate `images_dir` and return the encoded candidates for
/// `cookbook_key`.
///
/// Candidates are returned in directory-enumeration order; no sort is
/// imposed. A candidate that fails to encode is dropped with a logged
/// error. Store lookup failures abort the scan.
pub async fn scan_images(
    images_dir: &Path,
    cookbook_key: &str,
    store: &dyn RecipeStore,
) -> Result<Vec<RecipeImage>, IngestError> {
    let entries = std::fs::read_dir(images_dir).map_err(|e| IngestError::ImagesDirUnreadable {
        path: images_dir.to_path_buf(),
        source: e,
    })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {e}");
                continue;
            }
        };
        let path = entry.path();
        let filename = entry.file_name().to_string_lossy().into_owned();

        if filename == HIDDEN_ARTIFACT {
            debug!("Ignoring {filename}");
            continue;
        }

        if let Some(page_number) = page_number_from_filename(&filename) {
            if store.recipe_exists(cookbook_key, page_number).await? {
                info!(
                    "Skipping {}: page {page_number} already captured for cookbook \"{cookbook_key}\"",
                    path.display()
                );
                continue;
            }
        }

        let mut image = RecipeImage::new(path, cookbook_key);
        if let Err(e) = image.ensure_encoded() {
            warn!("Dropping candidate {image}: {e}");
            continue;
        }
        images.push(image);
    }
    Ok(images)
}

/// Parse the page number out of a `{cookbook_key}-{page_number}.{ext}`
/// filename.
///
/// The page token is the second hyphen-delimited token with its extension
/// stripped. Returns `None` for names with fewer than two tokens or a
/// non-numeric token, which keeps those files in the candidate set.
pub fn page_number_from_filename(filename: &str) -> Option<u32> {
    let mut tokens = filename.split('-');
    tokens.next()?;
    let second = tokens.next()?;
    let page_token = second.split('.').next().unwrap_or(second);
    if page_token.is_empty() || !page_token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    page_token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_second_hyphen_token() {
        assert_eq!(page_number_from_filename("nordic-42.jpg"), Some(42));
        assert_eq!(page_number_from_filename("nordic-42-retake.jpg"), Some(42));
        assert_eq!(page_number_from_filename("nordic-007.png"), Some(7));
    }

    #[test]
    fn rejects_unparseable_names() {
        // No hyphen at all
        assert_eq!(page_number_from_filename("cover.jpg"), None);
        // Second token is not numeric
        assert_eq!(page_number_from_filename("nordic-toc.jpg"), None);
        // Empty page token
        assert_eq!(page_number_from_filename("nordic-.jpg"), None);
        // Digits mixed with letters
        assert_eq!(page_number_from_filename("nordic-4a.jpg"), None);
    }

    #[test]
    fn overflowing_page_numbers_are_treated_as_unparseable() {
        assert_eq!(page_number_from_filename("nordic-99999999999.jpg"), None);
    }
}
