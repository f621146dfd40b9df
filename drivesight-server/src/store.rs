//! In-memory analysis store
//!
//! Keeps a bounded history of API analyses for `/analysis/{id}`, `/history`
//! and `/stats`, and acts as the pipeline's persistence sink for freshly
//! computed assessments.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drivesight_core::{ImageFingerprint, PersistenceSink, RiskAssessment, RiskLabel};
use serde::{Serialize, Serializer};
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of factors reported by [`AnalysisStats::top_risk_factors`].
const TOP_FACTORS: usize = 5;

fn serialize_shared<S: Serializer>(
    assessment: &Arc<RiskAssessment>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    assessment.as_ref().serialize(serializer)
}

/// One analysis served by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisRecord {
    /// Unique identifier for this analysis
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub analysis_id: Uuid,
    /// Hex SHA3-256 fingerprint of the uploaded image
    pub fingerprint: String,
    /// Original file name, when the client sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Uploaded image size in bytes
    pub image_bytes: usize,
    /// Wall-clock time spent serving the request
    pub processing_time_ms: u64,
    /// When the analysis was served
    pub created_at: DateTime<Utc>,
    /// Whether the assessment was served from the result cache
    pub cached: bool,
    /// The risk assessment returned to the client
    #[serde(serialize_with = "serialize_shared")]
    #[schema(value_type = Object)]
    pub assessment: Arc<RiskAssessment>,
}

/// Per-label counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub struct LabelCounts {
    pub low: u64,
    pub moderate: u64,
    pub high: u64,
}

/// Occurrences of one named risk factor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FactorCount {
    #[schema(example = "object:person")]
    pub name: String,
    pub count: u64,
}

/// Aggregates over the retained history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisStats {
    pub total_analyses: u64,
    pub fallback_analyses: u64,
    pub by_label: LabelCounts,
    /// Mean score over retained analyses (0 when empty)
    pub average_score: f64,
    /// Most frequent factors, most common first
    pub top_risk_factors: Vec<FactorCount>,
    /// Distinct images among the most recently persisted assessments
    pub unique_images: usize,
}

#[derive(Debug, Clone)]
struct PersistedImage {
    assessed_at: DateTime<Utc>,
}

#[derive(Default)]
struct StoreInner {
    records: VecDeque<Arc<AnalysisRecord>>,
    by_id: HashMap<Uuid, Arc<AnalysisRecord>>,
    persisted: HashMap<ImageFingerprint, PersistedImage>,
    /// Insertion order of `persisted`, oldest first
    persisted_order: VecDeque<ImageFingerprint>,
}

/// Bounded in-memory store. Oldest analyses and oldest persisted images are
/// each dropped past `capacity`.
pub struct AnalysisStore {
    inner: RwLock<StoreInner>,
    capacity: usize,
}

impl AnalysisStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            capacity: capacity.max(1),
        }
    }

    pub async fn record(&self, record: AnalysisRecord) -> Arc<AnalysisRecord> {
        let record = Arc::new(record);
        let mut inner = self.inner.write().await;

        inner.by_id.insert(record.analysis_id, Arc::clone(&record));
        inner.records.push_back(Arc::clone(&record));
        while inner.records.len() > self.capacity {
            if let Some(evicted) = inner.records.pop_front() {
                inner.by_id.remove(&evicted.analysis_id);
            }
        }

        record
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<AnalysisRecord>> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    /// Most recent analyses first
    pub async fn history(&self, limit: usize) -> Vec<Arc<AnalysisRecord>> {
        self.inner
            .read()
            .await
            .records
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> AnalysisStats {
        let inner = self.inner.read().await;

        let mut by_label = LabelCounts::default();
        let mut fallback_analyses = 0;
        let mut score_sum = 0u64;
        let mut factor_counts: HashMap<&str, u64> = HashMap::new();

        for record in &inner.records {
            let assessment = &record.assessment;
            match assessment.label {
                RiskLabel::Low => by_label.low += 1,
                RiskLabel::Moderate => by_label.moderate += 1,
                RiskLabel::High => by_label.high += 1,
            }
            if assessment.is_fallback() {
                fallback_analyses += 1;
            }
            score_sum += u64::from(assessment.score);
            for factor in &assessment.factors {
                *factor_counts.entry(factor.name.as_str()).or_default() += 1;
            }
        }

        let total = inner.records.len() as u64;
        let mut top_risk_factors: Vec<FactorCount> = factor_counts
            .into_iter()
            .map(|(name, count)| FactorCount {
                name: name.to_string(),
                count,
            })
            .collect();
        top_risk_factors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        top_risk_factors.truncate(TOP_FACTORS);

        AnalysisStats {
            total_analyses: total,
            fallback_analyses,
            by_label,
            average_score: if total == 0 {
                0.0
            } else {
                score_sum as f64 / total as f64
            },
            top_risk_factors,
            unique_images: inner.persisted.len(),
        }
    }
}

#[async_trait]
impl PersistenceSink for AnalysisStore {
    async fn persist(
        &self,
        assessment: Arc<RiskAssessment>,
        image: Arc<[u8]>,
    ) -> drivesight_core::Result<()> {
        let mut inner = self.inner.write().await;
        let previous = inner.persisted.insert(
            assessment.fingerprint,
            PersistedImage {
                assessed_at: assessment.assessed_at,
            },
        );
        if previous.is_none() {
            inner.persisted_order.push_back(assessment.fingerprint);
            while inner.persisted_order.len() > self.capacity {
                if let Some(evicted) = inner.persisted_order.pop_front() {
                    inner.persisted.remove(&evicted);
                }
            }
        }
        tracing::debug!(
            fingerprint = %assessment.fingerprint.short(),
            image_bytes = image.len(),
            refreshed = previous.is_some(),
            previous_assessed_at = ?previous.map(|p| p.assessed_at),
            "Assessment persisted"
        );
        Ok(())
    }
}
