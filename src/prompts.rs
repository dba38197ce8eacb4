//! Fixed instructions sent to the extraction service.
//!
//! Centralising the prompt text here keeps it in one place and lets unit
//! tests inspect it without a live API call. The wording is part of the
//! extraction contract: the user directive tells the model to keep the
//! original instruction text and to route trailing page annotations into
//! the `note` field, which is what the fidelity guarantees in
//! [`crate::model::RecipeExtraction`] rest on.

/// System role: what the assistant is.
pub const SYSTEM_PROMPT: &str = "You are an assistant that processes images of recipes and \
extracts recipe information. Extract the recipe information from the image and convert it \
into the given structure.";

/// User role: the directive sent alongside the page image.
pub const USER_PROMPT: &str = "Extract the recipe information from this image and return it \
in the specified structure. For the instruction details, keep as much or all of the original \
text. If there are additional notes at the bottom of the page, add them to the note field.";

/// Name of the structured-response schema announced to the service.
pub const EXTRACTION_SCHEMA_NAME: &str = "recipe_extraction";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_pins_down_fidelity_and_notes() {
        assert!(USER_PROMPT.contains("original"));
        assert!(USER_PROMPT.contains("note field"));
    }

    #[test]
    fn prompts_are_nonempty() {
        assert!(!SYSTEM_PROMPT.trim().is_empty());
        assert!(!USER_PROMPT.trim().is_empty());
        assert!(!EXTRACTION_SCHEMA_NAME.trim().is_empty());
    }
}
