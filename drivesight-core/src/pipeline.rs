//! The assessment pipeline.
//!
//! `assess` validates the upload, fingerprints it and resolves it through the
//! [`ResultCache`]. On a miss, one flight per fingerprint runs
//! perceive → score → summarize → guardrail and the result is cached. Adapter
//! failures never reach the caller: a failed perception becomes a fallback
//! assessment, a failed summary becomes a template summary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::assessment::{
    AssessmentStatus, RiskAssessment, RiskFactor, RiskLabel, SceneContext, SharedAssessment, SummarySource,
    AGENT_VERSION,
};
use crate::cache::{CacheConfig, CacheOutcome, ResultCache};
use crate::error::{Error, Result, Stage};
use crate::fingerprint::ImageFingerprint;
use crate::guardrail::{Guardrail, GuardrailConfig};
use crate::perception::PerceptionAdapter;
use crate::persistence::{NoopSink, PersistenceSink};
use crate::scoring::{RiskScorer, ScoringConfig, MAX_SCORE};
use crate::summary::{template_summary, Summarizer, SummaryRequest};
use crate::validate::{inspect_image, DEFAULT_MAX_IMAGE_BYTES};

/// Summary carried by every fallback assessment.
pub const FALLBACK_SUMMARY: &str =
    "Unable to complete analysis. Please ensure proper lighting and image quality.";

/// Factor carrying the whole score of a fallback assessment.
pub const FALLBACK_FACTOR: &str = "fallback:analysis_unavailable";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub perception_timeout: Duration,
    pub summary_timeout: Duration,
    pub max_image_bytes: usize,
    /// Label reported when perception fails
    pub fallback_label: RiskLabel,
    /// Score reported when perception fails
    pub fallback_score: u8,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
    pub guardrail: GuardrailConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            perception_timeout: Duration::from_secs(60),
            summary_timeout: Duration::from_secs(15),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            fallback_label: RiskLabel::Moderate,
            fallback_score: 50,
            cache: CacheConfig::default(),
            scoring: ScoringConfig::default(),
            guardrail: GuardrailConfig::default(),
        }
    }
}

/// Everything a flight needs, shared with the spawned computation.
struct Stages {
    perception: Arc<dyn PerceptionAdapter>,
    summarizer: Arc<dyn Summarizer>,
    persistence: Arc<dyn PersistenceSink>,
    scorer: RiskScorer,
    guardrail: Guardrail,
    config: PipelineConfig,
}

/// Builder for [`AssessmentPipeline`].
pub struct PipelineBuilder {
    perception: Arc<dyn PerceptionAdapter>,
    summarizer: Arc<dyn Summarizer>,
    persistence: Arc<dyn PersistenceSink>,
    config: PipelineConfig,
    cache: Option<ResultCache>,
}

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn persistence(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.persistence = sink;
        self
    }

    /// Use an existing cache instead of creating one from `config.cache`.
    pub fn cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<AssessmentPipeline> {
        let config = self.config;
        if i32::from(config.fallback_score) > MAX_SCORE {
            return Err(Error::Config(format!(
                "fallback_score must be at most {MAX_SCORE}"
            )));
        }
        if config.perception_timeout.is_zero() || config.summary_timeout.is_zero() {
            return Err(Error::Config("adapter timeouts must be non-zero".into()));
        }

        let guardrail = Guardrail::new(config.guardrail.clone())?;
        let cache = self
            .cache
            .unwrap_or_else(|| ResultCache::new(config.cache.clone()));

        info!(
            perception = self.perception.name(),
            summarizer = self.summarizer.name(),
            perception_timeout_ms = config.perception_timeout.as_millis() as u64,
            summary_timeout_ms = config.summary_timeout.as_millis() as u64,
            cache_ttl_secs = cache.config().ttl.as_secs(),
            "Assessment pipeline ready"
        );

        Ok(AssessmentPipeline {
            stages: Arc::new(Stages {
                perception: self.perception,
                summarizer: self.summarizer,
                persistence: self.persistence,
                scorer: RiskScorer::new(config.scoring.clone()),
                guardrail,
                config,
            }),
            cache,
        })
    }
}

/// An assessment and how the cache served it.
#[derive(Debug, Clone)]
pub struct Assessed {
    pub assessment: SharedAssessment,
    /// Outcome of the cache lookup. A fallback keeps the outcome of the
    /// flight that failed.
    pub outcome: CacheOutcome,
}

/// Orchestrates one assessment per distinct image.
///
/// Cheap to clone; clones share adapters and cache.
#[derive(Clone)]
pub struct AssessmentPipeline {
    stages: Arc<Stages>,
    cache: ResultCache,
}

impl AssessmentPipeline {
    pub fn builder(
        perception: Arc<dyn PerceptionAdapter>,
        summarizer: Arc<dyn Summarizer>,
    ) -> PipelineBuilder {
        PipelineBuilder {
            perception,
            summarizer,
            persistence: Arc::new(NoopSink),
            config: PipelineConfig::default(),
            cache: None,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.stages.config
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.stages.scorer
    }

    /// Assess one image.
    ///
    /// The only error is `Error::MalformedInput`, returned before the image is
    /// fingerprinted. Every other failure yields an assessment, possibly a
    /// fallback one.
    pub async fn assess(&self, image: &[u8]) -> Result<SharedAssessment> {
        self.assess_with_outcome(image).await.map(|a| a.assessment)
    }

    /// [`assess`](Self::assess), also reporting whether the result came from
    /// the cache.
    #[instrument(level = "info", skip_all, fields(image_bytes = image.len()))]
    pub async fn assess_with_outcome(&self, image: &[u8]) -> Result<Assessed> {
        let config = &self.stages.config;
        inspect_image(image, config.max_image_bytes).inspect_err(|e| {
            warn!(error = %e, "Rejected input");
        })?;

        let fingerprint = ImageFingerprint::of(image);
        let started = Instant::now();

        let stages = Arc::clone(&self.stages);
        let (outcome, result) = self
            .cache
            .resolve(fingerprint, || {
                let image: Arc<[u8]> = Arc::from(image);
                stages.run(fingerprint, image)
            })
            .await;

        let latency_ms = started.elapsed().as_millis() as u64;
        let assessment = match result {
            Ok(assessment) => {
                info!(
                    fingerprint = %fingerprint.short(),
                    score = assessment.score,
                    label = %assessment.label,
                    cache = ?outcome,
                    latency_ms,
                    "Assessment ready"
                );
                assessment
            }
            Err(e) => {
                if matches!(e, Error::CacheInternal(_)) {
                    error!(fingerprint = %fingerprint.short(), error = %e, "Cache failure, returning fallback");
                } else {
                    warn!(fingerprint = %fingerprint.short(), error = %e, latency_ms, "Analysis failed, returning fallback");
                }
                Arc::new(self.stages.fallback(fingerprint, &e))
            }
        };

        Ok(Assessed {
            assessment,
            outcome,
        })
    }
}

impl Stages {
    /// One flight: perceive, score, summarize, guardrail, then hand off to persistence.
    async fn run(
        self: Arc<Self>,
        fingerprint: ImageFingerprint,
        image: Arc<[u8]>,
    ) -> Result<SharedAssessment> {
        let config = &self.config;
        debug!(fingerprint = %fingerprint.short(), adapter = self.perception.name(), "Perceiving");

        let perception = tokio::time::timeout(
            config.perception_timeout,
            self.perception.perceive(&image, config.perception_timeout),
        )
        .await
        .map_err(|_| Error::timeout(Stage::Perception, config.perception_timeout))??;

        let breakdown = self.scorer.score(&perception.detections, &perception.scene);
        debug!(
            fingerprint = %fingerprint.short(),
            score = breakdown.score,
            factors = breakdown.factors.len(),
            "Scored"
        );

        let request = SummaryRequest {
            score: breakdown.score,
            label: breakdown.label,
            factors: breakdown.factors,
            detections: perception.detections,
            scene: perception.scene,
        };

        let (raw_summary, summary_source) = match tokio::time::timeout(
            config.summary_timeout,
            self.summarizer.summarize(&request, config.summary_timeout),
        )
        .await
        {
            Ok(Ok(text)) => (text, SummarySource::Generated),
            Ok(Err(e)) => {
                warn!(error = %e, "Summarizer failed, using template");
                (template_summary(&request), SummarySource::Template)
            }
            Err(_) => {
                warn!(
                    timeout_ms = config.summary_timeout.as_millis() as u64,
                    "Summarizer timed out, using template"
                );
                (template_summary(&request), SummarySource::Template)
            }
        };

        let SummaryRequest {
            score,
            label,
            factors,
            detections,
            scene,
        } = request;

        let assessment = Arc::new(RiskAssessment {
            fingerprint,
            score,
            label,
            factors,
            summary: self.guardrail.apply(&raw_summary),
            summary_source,
            detections,
            scene,
            status: AssessmentStatus::Complete,
            assessed_at: Utc::now(),
            agent_version: AGENT_VERSION.to_string(),
        });

        let sink = Arc::clone(&self.persistence);
        let record = Arc::clone(&assessment);
        tokio::spawn(async move {
            if let Err(e) = sink.persist(record, image).await {
                warn!(fingerprint = %fingerprint.short(), error = %e, "Persistence failed");
            }
        });

        Ok(assessment)
    }

    /// Degraded assessment. Nothing was perceived, so the scene is empty and
    /// the configured score is carried by a single named factor: base score
    /// plus factor deltas still add up to `score`.
    fn fallback(&self, fingerprint: ImageFingerprint, cause: &Error) -> RiskAssessment {
        let score = self.config.fallback_score;
        let delta = i32::from(score) - self.scorer.config().base_score;
        RiskAssessment {
            fingerprint,
            score,
            label: self.config.fallback_label,
            factors: vec![RiskFactor::new(FALLBACK_FACTOR, delta)],
            summary: FALLBACK_SUMMARY.to_string(),
            summary_source: SummarySource::Fallback,
            detections: Vec::new(),
            scene: SceneContext::default(),
            status: AssessmentStatus::Fallback {
                reason: cause.to_string(),
            },
            assessed_at: Utc::now(),
            agent_version: AGENT_VERSION.to_string(),
        }
    }
}
