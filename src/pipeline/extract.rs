//! Extraction client: send an encoded page image to the vision service and
//! parse its structured response.
//!
//! The request is a two-part fixed instruction (see [`crate::prompts`])
//! plus the image as a base64 data-URI, with a strict JSON schema as the
//! required response format. The service either returns a document matching
//! [`RecipeExtraction`] or the call counts as a per-image failure; there is
//! no retry and no local validation beyond deserialisation, since the
//! schema contract already constrains the shape.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, ImageUrl, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{ImageError, IngestError};
use crate::model::{RecipeExtraction, RecipeImage};
use crate::prompts::{EXTRACTION_SCHEMA_NAME, SYSTEM_PROMPT, USER_PROMPT};

/// The extraction operation the pipeline depends on.
#[async_trait]
pub trait RecipeExtractor: Send + Sync {
    /// Extract the recipe from one encoded image, or signal a per-image
    /// failure. Never fatal to the batch.
    async fn extract(&self, image: &RecipeImage) -> Result<RecipeExtraction, ImageError>;
}

/// OpenAI-backed [`RecipeExtractor`].
pub struct OpenAiExtractor {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiExtractor {
    /// Build a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.into());
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    /// Build a client from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(model: impl Into<String>) -> Result<Self, IngestError> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key, model)),
            _ => Err(IngestError::ExtractorNotConfigured),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl RecipeExtractor for OpenAiExtractor {
    async fn extract(&self, image: &RecipeImage) -> Result<RecipeExtraction, ImageError> {
        let failed = |detail: String| ImageError::ExtractionFailed {
            path: image.filepath.clone(),
            detail,
        };

        let payload = image.encoded.as_deref().ok_or_else(|| {
            failed("image has no encoded payload; encode it before extraction".into())
        })?;
        let data_uri = format!("data:image/{};base64,{}", image.file_format, payload);

        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(SYSTEM_PROMPT.to_string()),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Array(vec![
                    ChatCompletionRequestUserMessageContentPart::Text(
                        ChatCompletionRequestMessageContentPartText {
                            text: USER_PROMPT.to_string(),
                        },
                    ),
                    ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImage {
                            image_url: ImageUrl {
                                url: data_uri,
                                detail: None,
                            },
                        },
                    ),
                ]),
                name: None,
            }),
        ];

        let request = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            response_format: Some(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    name: EXTRACTION_SCHEMA_NAME.to_string(),
                    description: None,
                    schema: Some(response_schema()),
                    strict: Some(true),
                },
            }),
            ..Default::default()
        };

        let start = Instant::now();
        info!("Calling {} on image {image}", self.model);

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| failed(format!("extraction service error: {e}")))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| failed("service returned no choices".into()))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| failed("service response contained no content".into()))?;

        let extraction: RecipeExtraction = serde_json::from_str(&content)
            .map_err(|e| failed(format!("response did not match the extraction schema: {e}")))?;

        debug!(
            "Extracted \"{}\" (page {}) in {:?}",
            extraction.name_of_dish,
            extraction.page_number,
            start.elapsed()
        );
        Ok(extraction)
    }
}

/// JSON schema for the structured response, mirroring
/// [`RecipeExtraction`] field for field.
///
/// Strict mode requires every property to be listed as required and
/// `additionalProperties: false` at each level; the optional note is
/// expressed as a nullable string.
pub fn response_schema() -> serde_json::Value {
    let string_array = json!({ "type": "array", "items": { "type": "string" } });
    let categories = [
        "meat",
        "produce",
        "seafood",
        "pantry",
        "dairy",
        "seafood_and_meat",
        "frozen",
        "other",
    ];
    let mut ingredient_properties = serde_json::Map::new();
    for category in categories {
        ingredient_properties.insert(category.to_string(), string_array.clone());
    }

    json!({
        "type": "object",
        "properties": {
            "name_of_dish": { "type": "string" },
            "serving_size": { "type": "string" },
            "page_number": { "type": "integer", "minimum": 0 },
            "ingredients": {
                "type": "object",
                "properties": ingredient_properties,
                "required": categories,
                "additionalProperties": false
            },
            "instructions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "step": { "type": "string" },
                        "details": string_array
                    },
                    "required": ["step", "details"],
                    "additionalProperties": false
                }
            },
            "note": { "type": ["string", "null"] }
        },
        "required": [
            "name_of_dish",
            "serving_size",
            "page_number",
            "ingredients",
            "instructions",
            "note"
        ],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_every_top_level_field() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        for field in [
            "name_of_dish",
            "serving_size",
            "page_number",
            "ingredients",
            "instructions",
            "note",
        ] {
            assert!(required.contains(&field), "missing required field {field}");
        }
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn schema_requires_every_ingredient_category() {
        let schema = response_schema();
        let required = schema["properties"]["ingredients"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 8);
        assert!(required.contains(&json!("seafood_and_meat")));
    }

    #[test]
    fn schema_conformant_json_deserialises_into_the_model() {
        // A document shaped exactly as the schema demands must parse
        let content = json!({
            "name_of_dish": "Pannekaker",
            "serving_size": "4",
            "page_number": 12,
            "ingredients": {
                "meat": [], "produce": [], "seafood": [], "pantry": ["flour"],
                "dairy": ["milk", "butter"], "seafood_and_meat": [], "frozen": [],
                "other": []
            },
            "instructions": [
                { "step": "1", "details": ["Whisk the batter.", "Rest 30 minutes."] }
            ],
            "note": null
        });
        let extraction: RecipeExtraction =
            serde_json::from_value(content).expect("schema-shaped JSON must parse");
        assert_eq!(extraction.page_number, 12);
        assert_eq!(extraction.instructions[0].details.len(), 2);
        assert_eq!(extraction.note, None);
    }
}
