//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod analysis;
pub mod analyze;
pub mod health;

pub use crate::state::AppState;
pub use analysis::{
    get_analysis_handler, history_handler, stats_handler, CacheSummary, HistoryQuery,
    HistoryResponse, StatsResponse,
};
pub use analyze::{analyze_handler, AnalyzeResponse};
pub use health::{health, ready, HealthResponse, ReadyResponse};
