//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use drivesight_core::{
    AssessmentPipeline, MockPerception, MockSummarizer, PerceptionAdapter, Summarizer,
};

use crate::config::Config;
use crate::store::AnalysisStore;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Assessment pipeline (adapters + result cache)
    pub pipeline: AssessmentPipeline,
    /// Analysis history, also the pipeline's persistence sink
    pub store: Arc<AnalysisStore>,
    /// Perception adapter name, reported by /health
    pub adapter: &'static str,
    /// Maximum accepted upload size in bytes
    pub max_image_bytes: usize,
}

impl AppState {
    /// Build state around the given adapters.
    pub fn new(
        config: &Config,
        perception: Arc<dyn PerceptionAdapter>,
        summarizer: Arc<dyn Summarizer>,
    ) -> drivesight_core::Result<Self> {
        let store = Arc::new(AnalysisStore::new(config.history_capacity));
        let adapter = perception.name();
        let pipeline = AssessmentPipeline::builder(perception, summarizer)
            .config(config.pipeline_config())
            .persistence(store.clone())
            .build()?;

        Ok(Self {
            pipeline,
            store,
            adapter,
            max_image_bytes: config.max_image_bytes(),
        })
    }

    /// State backed by mock adapters (tests and offline demos).
    pub fn mock(config: &Config) -> drivesight_core::Result<Self> {
        Self::new(
            config,
            Arc::new(MockPerception::default()),
            Arc::new(MockSummarizer::default()),
        )
    }

    /// Mock or Gemini adapters depending on `config.use_mock_adapters`.
    pub fn from_config(config: &Config) -> drivesight_core::Result<Self> {
        if config.use_mock_adapters {
            tracing::warn!("Using mock perception and summary adapters");
            return Self::mock(config);
        }
        Self::with_gemini(config)
    }

    #[cfg(feature = "gemini")]
    fn with_gemini(config: &Config) -> drivesight_core::Result<Self> {
        use drivesight_core::{GeminiClient, GeminiConfig, GeminiPerception, GeminiSummarizer};

        let gemini = GeminiConfig::from_env()?;
        tracing::info!(model = %gemini.model, "Using Gemini adapters");
        let client = Arc::new(GeminiClient::new(gemini)?);
        Self::new(
            config,
            Arc::new(GeminiPerception::new(client.clone())),
            Arc::new(GeminiSummarizer::new(client)),
        )
    }

    #[cfg(not(feature = "gemini"))]
    fn with_gemini(_config: &Config) -> drivesight_core::Result<Self> {
        Err(drivesight_core::Error::Config(
            "built without the `gemini` feature; set USE_MOCK_ADAPTERS=true".into(),
        ))
    }
}
