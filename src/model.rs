//! Domain types: the candidate image descriptor and the structured
//! extraction record the vision service returns.
//!
//! [`RecipeExtraction`] is the contract with the extraction service: the
//! request carries a JSON schema derived from these types, and the response
//! is deserialised straight back into them. Field names are therefore part
//! of the wire format and of the persisted document shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::pipeline::encode;

/// A candidate image discovered in the source directory.
///
/// Owned by the ingest run that created it and discarded once its image has
/// completed processing. The base64 payload is populated lazily, at most
/// once, via [`RecipeImage::ensure_encoded`].
#[derive(Debug, Clone, Serialize)]
pub struct RecipeImage {
    /// Location of the image file on disk.
    pub filepath: PathBuf,
    /// The cookbook this image belongs to.
    pub cookbook_key: String,
    /// Lower-cased extension without the leading dot (`"jpg"`), used as the
    /// media subtype when the image is sent to the extraction service.
    pub file_format: String,
    /// Base64 payload of the file contents. `None` until first encoded.
    #[serde(skip)]
    pub encoded: Option<String>,
}

impl RecipeImage {
    /// Build a descriptor for `filepath`, inferring the file format from its
    /// extension. No file I/O happens here.
    pub fn new(filepath: impl Into<PathBuf>, cookbook_key: impl Into<String>) -> Self {
        let filepath = filepath.into();
        let file_format = file_format_of(&filepath);
        Self {
            filepath,
            cookbook_key: cookbook_key.into(),
            file_format,
            encoded: None,
        }
    }

    /// Encode the file contents as base64, reading the file at most once.
    ///
    /// Subsequent calls return the cached payload without touching disk.
    pub fn ensure_encoded(&mut self) -> std::io::Result<&str> {
        if self.encoded.is_none() {
            self.encoded = Some(encode::encode_image(&self.filepath)?);
        }
        Ok(self.encoded.as_deref().unwrap_or_default())
    }
}

impl fmt::Display for RecipeImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.filepath.display(),
            self.cookbook_key,
            self.file_format
        )
    }
}

/// Lower-cased extension of `path` without the leading dot, or `""` when the
/// file has no extension.
pub fn file_format_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Ingredients grouped by shopping category.
///
/// Every category is required in a valid extraction; empty lists are fine.
/// Order within each list is preserved as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientList {
    pub meat: Vec<String>,
    pub produce: Vec<String>,
    pub seafood: Vec<String>,
    pub pantry: Vec<String>,
    pub dairy: Vec<String>,
    pub seafood_and_meat: Vec<String>,
    pub frozen: Vec<String>,
    pub other: Vec<String>,
}

/// One step of the recipe procedure.
///
/// `details` reproduces the original step text line by line; both the line
/// order and the order of steps within [`RecipeExtraction::instructions`]
/// are meaningful and never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionStep {
    /// Step label or number as printed on the page.
    pub step: String,
    /// The step's text, in original line order.
    pub details: Vec<String>,
}

/// The structured recipe extracted from one cookbook page.
///
/// Produced once per successfully processed image and immutable after
/// creation. `page_number` comes from the page itself as read by the
/// service, not from the source filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeExtraction {
    pub name_of_dish: String,
    pub serving_size: String,
    pub page_number: u32,
    pub ingredients: IngredientList,
    pub instructions: Vec<InstructionStep>,
    /// Trailing page annotations (tips, variations) when present.
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_format_is_lowercased_without_dot() {
        assert_eq!(file_format_of(Path::new("photos/C-7.JPG")), "jpg");
        assert_eq!(file_format_of(Path::new("photos/C-7.jpeg")), "jpeg");
        assert_eq!(file_format_of(Path::new("photos/cover")), "");
    }

    #[test]
    fn display_omits_payload() {
        let mut image = RecipeImage::new("photos/C-7.jpg", "C");
        image.encoded = Some("QUJD".repeat(1000));
        let rendered = image.to_string();
        assert!(rendered.contains("C-7.jpg"));
        assert!(!rendered.contains("QUJD"));
    }

    #[test]
    fn extraction_round_trips_through_json_preserving_order() {
        let extraction = RecipeExtraction {
            name_of_dish: "Fiskesuppe".to_string(),
            serving_size: "4 servings".to_string(),
            page_number: 42,
            ingredients: IngredientList {
                meat: vec![],
                produce: vec!["2 carrots".into(), "1 leek".into()],
                seafood: vec!["400 g cod".into()],
                pantry: vec![],
                dairy: vec!["2 dl cream".into()],
                seafood_and_meat: vec![],
                frozen: vec![],
                other: vec![],
            },
            instructions: vec![
                InstructionStep {
                    step: "1".into(),
                    details: vec!["Chop the vegetables.".into(), "Set aside.".into()],
                },
                InstructionStep {
                    step: "2".into(),
                    details: vec!["Simmer the fish in the stock.".into()],
                },
            ],
            note: Some("Serve with crusty bread.".into()),
        };

        let json = serde_json::to_string(&extraction).unwrap();
        let back: RecipeExtraction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, extraction);
        assert_eq!(back.instructions[0].details[1], "Set aside.");
    }

    #[test]
    fn extraction_requires_every_ingredient_category() {
        // Missing "frozen" category
        let json = r#"{
            "name_of_dish": "Toast",
            "serving_size": "1",
            "page_number": 3,
            "ingredients": {
                "meat": [], "produce": [], "seafood": [], "pantry": [],
                "dairy": [], "seafood_and_meat": [], "other": []
            },
            "instructions": [],
            "note": null
        }"#;
        assert!(serde_json::from_str::<RecipeExtraction>(json).is_err());
    }
}
