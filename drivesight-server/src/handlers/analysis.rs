//! Analysis retrieval handlers
//!
//! GET /analysis/{id}, GET /history and GET /stats.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{AnalysisRecord, AnalysisStats};

/// Default number of analyses returned by /history
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Maximum number of analyses returned by /history
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Retrieve a past analysis by id
#[utoipa::path(
    get,
    path = "/analysis/{id}",
    tag = "Analysis",
    params(("id" = String, Path, description = "Analysis id returned by POST /analyze")),
    responses(
        (status = 200, description = "Analysis found", body = AnalysisRecord),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Unknown or expired analysis id")
    )
)]
pub async fn get_analysis_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisRecord>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| ApiError::bad_request(format!("Invalid analysis id '{id}': {e}")))?;

    let record = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Analysis {id} not found")))?;

    Ok(Json(AnalysisRecord::clone(&record)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Number of analyses to return (1-100, default 10)
    pub limit: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub analyses: Vec<AnalysisRecord>,
    pub count: usize,
}

/// Most recent analyses, newest first
#[utoipa::path(
    get,
    path = "/history",
    tag = "Analysis",
    params(HistoryQuery),
    responses((status = 200, description = "Recent analyses", body = HistoryResponse))
)]
pub async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let analyses: Vec<AnalysisRecord> = state
        .store
        .history(limit)
        .await
        .iter()
        .map(|r| r.as_ref().clone())
        .collect();

    Json(HistoryResponse {
        count: analyses.len(),
        analyses,
    })
}

/// Result cache counters
#[derive(Serialize, ToSchema)]
pub struct CacheSummary {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub joins: u64,
    pub expirations: u64,
    pub evictions: u64,
    pub failures: u64,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub analyses: AnalysisStats,
    pub cache: CacheSummary,
}

/// Aggregate statistics over recent analyses and the result cache
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Analysis",
    responses((status = 200, description = "Aggregate statistics", body = StatsResponse))
)]
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.pipeline.cache();
    let counters = cache.stats();

    Json(StatsResponse {
        analyses: state.store.stats().await,
        cache: CacheSummary {
            entries: cache.len(),
            in_flight: cache.in_flight(),
            hits: counters.hits,
            misses: counters.misses,
            joins: counters.joins,
            expirations: counters.expirations,
            evictions: counters.evictions,
            failures: counters.failures,
        },
    })
}
