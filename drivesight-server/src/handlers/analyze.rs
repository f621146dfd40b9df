//! Analysis handler
//!
//! Handles POST /analyze requests: one uploaded image in, one risk assessment out.

use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Utc;
use drivesight_core::RiskAssessment;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::multipart::ImageUpload;
use crate::state::AppState;
use crate::store::AnalysisRecord;

/// Response for a completed analysis
#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    /// Identifier for retrieving this analysis via GET /analysis/{id}
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub analysis_id: Uuid,
    /// Risk assessment (score, label, factors, summary, detections, scene)
    #[schema(value_type = Object)]
    pub assessment: RiskAssessment,
    /// Time spent serving the request in milliseconds
    #[schema(example = 1840)]
    pub processing_time_ms: u64,
    /// True when no new analysis was run for this request: the image was
    /// already cached or an identical upload was being analyzed
    pub cached: bool,
}

/// Analyze a road-scene image
///
/// Accepts multipart/form-data with:
/// - **file** (required): JPEG, PNG, GIF or WebP image (max 20MB)
///
/// Byte-identical images are served from the result cache, and concurrent
/// uploads of the same image share a single analysis. Upstream model
/// failures never fail the request; they yield a fallback assessment
/// (`status.state = "fallback"`).
#[utoipa::path(
    post,
    path = "/analyze",
    tag = "Analysis",
    request_body(
        content_type = "multipart/form-data",
        description = "Road-scene image in the `file` field"
    ),
    responses(
        (status = 200, description = "Assessment produced", body = AnalyzeResponse),
        (status = 400, description = "Missing file, unsupported format, or file too large"),
        (status = 413, description = "Request body too large"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn analyze_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let started = Instant::now();
    let upload = ImageUpload::parse(&mut multipart, state.max_image_bytes).await?;

    let assessed = state.pipeline.assess_with_outcome(&upload.data).await?;
    let cached = assessed.outcome.is_cached();
    let assessment = assessed.assessment;
    let processing_time_ms = started.elapsed().as_millis() as u64;

    let record = state
        .store
        .record(AnalysisRecord {
            analysis_id: Uuid::new_v4(),
            fingerprint: assessment.fingerprint.to_hex(),
            file_name: upload.file_name,
            image_bytes: upload.data.len(),
            processing_time_ms,
            created_at: Utc::now(),
            cached,
            assessment: assessment.clone(),
        })
        .await;

    tracing::info!(
        analysis_id = %record.analysis_id,
        fingerprint = %assessment.fingerprint.short(),
        score = assessment.score,
        label = %assessment.label,
        fallback = assessment.is_fallback(),
        cached,
        processing_time_ms,
        "Analysis served"
    );

    Ok(Json(AnalyzeResponse {
        analysis_id: record.analysis_id,
        assessment: RiskAssessment::clone(&assessment),
        processing_time_ms,
        cached,
    }))
}
