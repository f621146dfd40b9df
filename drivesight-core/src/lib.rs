//! DriveSight Core - road-scene risk assessment pipeline
//!
//! This crate turns a dashcam image into a bounded-latency risk assessment:
//! a 0-100 score, a severity label, the named factors behind the score and a
//! short natural-language summary.
//!
//! # Features
//!
//! - Content-addressed caching keyed on a SHA3-256 image fingerprint
//! - Single-flight coalescing: concurrent requests for the same image share one analysis
//! - Deterministic additive scoring with configurable weights and thresholds
//! - Guardrail filter on generated summaries (length, redaction, non-empty)
//! - Graceful degradation: adapter failures yield fallback or template output
//! - Gemini perception and summary adapters (feature `gemini`)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use drivesight_core::{AssessmentPipeline, MockPerception, MockSummarizer};
//!
//! # async fn example(image: Vec<u8>) -> drivesight_core::Result<()> {
//! let pipeline = AssessmentPipeline::builder(
//!     Arc::new(MockPerception::default()),
//!     Arc::new(MockSummarizer::default()),
//! )
//! .build()?;
//!
//! let assessment = pipeline.assess(&image).await?;
//! println!("{} ({}): {}", assessment.label, assessment.score, assessment.summary);
//! # Ok(())
//! # }
//! ```

pub mod assessment;
pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod guardrail;
mod lenient;
pub mod perception;
pub mod persistence;
pub mod pipeline;
pub mod scoring;
pub mod summary;
pub mod validate;

#[cfg(feature = "gemini")]
pub mod gemini;

// Re-export main types for convenience
pub use assessment::{
    AssessmentStatus, Detection, Lighting, ObjectCategory, Perception, RiskAssessment, RiskFactor,
    RiskLabel, SceneContext, SharedAssessment, SummarySource, TrafficDensity, Weather,
    AGENT_VERSION,
};
pub use cache::{CacheConfig, CacheOutcome, CacheStats, ResultCache};
pub use error::{Error, Result, Stage};
pub use fingerprint::ImageFingerprint;
pub use guardrail::{Guardrail, GuardrailConfig};
pub use perception::{MockBehavior, MockPerception, PerceptionAdapter};
pub use persistence::{NoopSink, PersistenceSink};
pub use pipeline::{
    Assessed, AssessmentPipeline, PipelineBuilder, PipelineConfig, FALLBACK_FACTOR, FALLBACK_SUMMARY,
};
pub use scoring::{RiskScorer, ScoreBreakdown, ScoringConfig};
pub use summary::{template_summary, MockSummarizer, Summarizer, SummaryRequest};
pub use validate::{inspect_image, ImageKind};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiClient, GeminiConfig, GeminiPerception, GeminiSummarizer};
