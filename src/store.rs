//! Persistence gateway: the few document-store operations the pipeline
//! needs, behind the [`RecipeStore`] trait.
//!
//! The pipeline requires exactly three operations: cookbook existence,
//! recipe existence by `(cookbook_key, page_number)`, and insert. Everything
//! else about the store (the CRUD API's query surface, pagination, updates)
//! belongs to other services and is deliberately absent here.
//!
//! [`MongoRecipeStore`] is the production implementation. At connect time it
//! ensures a unique compound index on `(cookbook_key, page_number)` so the
//! scanner's check-then-act pre-filter cannot race a concurrent run into a
//! duplicate record: a lost race surfaces as
//! [`InsertOutcome::AlreadyExists`] instead.

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_document, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::RecipeExtraction;

/// Result of an insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was stored; carries the store-assigned identifier.
    Inserted(String),
    /// A record for this `(cookbook_key, page_number)` already exists.
    /// Reported by the unique index, not by a prior read, so it is
    /// race-free.
    AlreadyExists,
}

/// The document-store operations the ingest pipeline depends on.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// True iff the cookbooks collection has a record with this key.
    async fn is_known_cookbook(&self, cookbook_key: &str) -> Result<bool, StoreError>;

    /// True iff a recipe record exists with both fields present.
    async fn recipe_exists(&self, cookbook_key: &str, page_number: u32)
        -> Result<bool, StoreError>;

    /// Serialise the extraction plus the injected `cookbook_key` and store
    /// it. Not idempotent beyond the unique-index guard.
    async fn insert_recipe(
        &self,
        extraction: &RecipeExtraction,
        cookbook_key: &str,
    ) -> Result<InsertOutcome, StoreError>;
}

/// MongoDB-backed [`RecipeStore`].
pub struct MongoRecipeStore {
    recipes: Collection<Document>,
    cookbooks: Collection<Document>,
}

impl MongoRecipeStore {
    /// Connect to the store and ensure the unique recipe-identity index.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.connection_string)
            .await
            .map_err(|e| StoreError::ConnectFailed {
                detail: format!("invalid connection string: {e}"),
            })?;
        options.app_name = Some("cookbook-ingest".to_string());

        let client = Client::with_options(options).map_err(|e| StoreError::ConnectFailed {
            detail: e.to_string(),
        })?;
        let db = client.database(&config.database);
        let recipes = db.collection::<Document>(&config.recipes_collection);
        let cookbooks = db.collection::<Document>(&config.cookbooks_collection);

        let index = IndexModel::builder()
            .keys(doc! { "cookbook_key": 1, "page_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("cookbook_page_unique".to_string())
                    .build(),
            )
            .build();
        recipes
            .create_index(index, None)
            .await
            .map_err(|e| StoreError::ConnectFailed {
                detail: format!("failed to ensure the unique recipe index: {e}"),
            })?;

        debug!(
            "Connected to {}/{} (recipes) and {}/{} (cookbooks)",
            config.database, config.recipes_collection, config.database,
            config.cookbooks_collection
        );
        Ok(Self { recipes, cookbooks })
    }
}

#[async_trait]
impl RecipeStore for MongoRecipeStore {
    async fn is_known_cookbook(&self, cookbook_key: &str) -> Result<bool, StoreError> {
        let found = self
            .cookbooks
            .find_one(doc! { "key": cookbook_key }, None)
            .await
            .map_err(|e| StoreError::OperationFailed {
                detail: format!("cookbook lookup failed: {e}"),
            })?;
        Ok(found.is_some())
    }

    async fn recipe_exists(
        &self,
        cookbook_key: &str,
        page_number: u32,
    ) -> Result<bool, StoreError> {
        let found = self
            .recipes
            .find_one(
                doc! { "cookbook_key": cookbook_key, "page_number": page_number as i64 },
                None,
            )
            .await
            .map_err(|e| StoreError::OperationFailed {
                detail: format!("recipe lookup failed: {e}"),
            })?;
        Ok(found.is_some())
    }

    async fn insert_recipe(
        &self,
        extraction: &RecipeExtraction,
        cookbook_key: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let mut document = to_document(extraction).map_err(|e| StoreError::SerializeFailed {
            detail: e.to_string(),
        })?;
        document.insert("cookbook_key", cookbook_key);

        match self.recipes.insert_one(document, None).await {
            Ok(result) => {
                let id = render_id(&result.inserted_id);
                info!("Inserted extraction with id {id}");
                Ok(InsertOutcome::Inserted(id))
            }
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::AlreadyExists),
            Err(err) => Err(StoreError::OperationFailed {
                detail: format!("insert failed: {err}"),
            }),
        }
    }
}

/// True iff the error is a unique-index violation (code 11000).
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_err)) if write_err.code == 11000
    )
}

/// Render the store-assigned identifier as a plain string.
fn render_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IngredientList, InstructionStep};

    fn sample_extraction() -> RecipeExtraction {
        RecipeExtraction {
            name_of_dish: "Kjøttkaker".into(),
            serving_size: "4".into(),
            page_number: 12,
            ingredients: IngredientList {
                meat: vec!["500 g ground beef".into()],
                produce: vec![],
                seafood: vec![],
                pantry: vec!["salt".into()],
                dairy: vec![],
                seafood_and_meat: vec![],
                frozen: vec![],
                other: vec![],
            },
            instructions: vec![InstructionStep {
                step: "1".into(),
                details: vec!["Mix and shape into patties.".into()],
            }],
            note: None,
        }
    }

    #[test]
    fn extraction_serialises_with_injected_cookbook_key() {
        let mut document = to_document(&sample_extraction()).unwrap();
        document.insert("cookbook_key", "nordic");
        assert_eq!(document.get_str("cookbook_key").unwrap(), "nordic");
        assert_eq!(document.get_str("name_of_dish").unwrap(), "Kjøttkaker");
        // page_number must survive as an integer queryable by the dedup filter
        assert!(matches!(
            document.get("page_number"),
            Some(Bson::Int32(12)) | Some(Bson::Int64(12))
        ));
        // the note field is present (null), matching the schema shape
        assert_eq!(document.get("note"), Some(&Bson::Null));
    }

    #[test]
    fn object_ids_render_as_hex() {
        let oid = mongodb::bson::oid::ObjectId::new();
        let rendered = render_id(&Bson::ObjectId(oid));
        assert_eq!(rendered, oid.to_hex());
        assert_eq!(render_id(&Bson::String("abc".into())), "\"abc\"");
    }
}
