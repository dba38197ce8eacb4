//! Configuration types for an ingest run.
//!
//! All run behaviour is controlled through [`IngestConfig`], built via its
//! [`IngestConfigBuilder`]. The pipeline never reads ambient process state:
//! environment lookup happens only in [`StoreConfig::from_env`] and the CLI
//! layer, which then inject explicit values here.
//!
//! For tests (or callers with custom middleware) the config can carry
//! pre-built [`RecipeStore`]/[`RecipeExtractor`] instances; these take
//! precedence over constructing the real MongoDB store and OpenAI client.

use crate::error::{IngestError, StoreError};
use crate::pipeline::extract::RecipeExtractor;
use crate::progress::ProgressCallback;
use crate::store::RecipeStore;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default extraction model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default pre-flight delay before the first extraction call.
pub const DEFAULT_PREFLIGHT_DELAY: Duration = Duration::from_secs(5);

/// Configuration for one ingest run.
///
/// Built via [`IngestConfig::builder()`] or [`IngestConfig::default()`].
///
/// # Example
/// ```rust
/// use cookbook_ingest::IngestConfig;
///
/// let config = IngestConfig::builder()
///     .model("gpt-4o-mini")
///     .dry_run(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct IngestConfig {
    /// Extraction model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Extraction service API key. If `None`, the key is taken from the
    /// `OPENAI_API_KEY` environment variable when the extractor is built.
    pub api_key: Option<String>,

    /// Report the candidate list and stop: no extraction calls, no inserts,
    /// no renames. Default: false.
    pub dry_run: bool,

    /// Delay between candidate listing and the first extraction call, so an
    /// operator can abort before external-service cost is incurred.
    /// Default: 5 seconds. Skipped in dry-run mode.
    pub preflight_delay: Duration,

    /// Document store connection settings. Required unless a pre-built
    /// `store` is injected.
    pub store_config: Option<StoreConfig>,

    /// Pre-constructed store. Takes precedence over `store_config`.
    pub store: Option<Arc<dyn RecipeStore>>,

    /// Pre-constructed extractor. Takes precedence over `model`/`api_key`.
    pub extractor: Option<Arc<dyn RecipeExtractor>>,

    /// Optional per-image progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            dry_run: false,
            preflight_delay: DEFAULT_PREFLIGHT_DELAY,
            store_config: None,
            store: None,
            extractor: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("dry_run", &self.dry_run)
            .field("preflight_delay", &self.preflight_delay)
            .field("store_config", &self.store_config)
            .field("store", &self.store.as_ref().map(|_| "<dyn RecipeStore>"))
            .field(
                "extractor",
                &self.extractor.as_ref().map(|_| "<dyn RecipeExtractor>"),
            )
            .finish()
    }
}

impl IngestConfig {
    /// Create a new builder for `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.config.dry_run = v;
        self
    }

    pub fn preflight_delay(mut self, delay: Duration) -> Self {
        self.config.preflight_delay = delay;
        self
    }

    pub fn store_config(mut self, store: StoreConfig) -> Self {
        self.config.store_config = Some(store);
        self
    }

    pub fn store(mut self, store: Arc<dyn RecipeStore>) -> Self {
        self.config.store = Some(store);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn RecipeExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IngestConfig, IngestError> {
        if self.config.model.trim().is_empty() {
            return Err(IngestError::InvalidConfig(
                "extraction model must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Connection settings for the document store.
///
/// Collection identity is data, not code: the same gateway serves any pair
/// of recipes/cookbooks collections.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// MongoDB connection string.
    pub connection_string: String,
    /// Database name.
    pub database: String,
    /// Collection holding persisted recipe records.
    pub recipes_collection: String,
    /// Collection holding cookbook records (keyed by `key`).
    pub cookbooks_collection: String,
}

impl StoreConfig {
    /// Read the store settings from the process environment.
    ///
    /// This is the single place the library touches ambient state, intended
    /// for the CLI boundary; library callers can always construct the
    /// struct directly instead.
    pub fn from_env() -> Result<Self, StoreError> {
        Ok(Self {
            connection_string: require_env("COOKBOOKS_CONNECTION_STRING")?,
            database: require_env("COOKBOOKS_DB_NAME")?,
            recipes_collection: require_env("COOKBOOKS_RECIPES_COLLECTION")?,
            cookbooks_collection: require_env("COOKBOOKS_COOKBOOKS_COLLECTION")?,
        })
    }
}

fn require_env(name: &str) -> Result<String, StoreError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(StoreError::InvalidConfig(format!(
            "environment variable {name} is not set"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(!config.dry_run);
        assert_eq!(config.preflight_delay, Duration::from_secs(5));
        assert!(config.store.is_none());
        assert!(config.extractor.is_none());
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = IngestConfig::builder().model("  ").build().unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn debug_redacts_the_api_key() {
        let config = IngestConfig::builder()
            .api_key("sk-secret")
            .build()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
    }
}
