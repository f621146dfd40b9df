//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::handlers::{
    AnalyzeResponse, CacheSummary, HealthResponse, HistoryResponse, ReadyResponse, StatsResponse,
};
use crate::store::{AnalysisRecord, AnalysisStats, FactorCount, LabelCounts};

/// DriveSight Risk API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DriveSight - Road Risk API",
        version = "0.1.0",
        description = r#"
## Driving-Scene Risk Assessment API

Upload a single road-scene image and receive a **0-100 risk score**, a
**LOW / MODERATE / HIGH** label, the factors that drove the score, and a short
natural-language summary.

### How It Works

1. A vision model detects hazards (pedestrians, vehicles, signals) and scene conditions
2. A deterministic rule engine turns the detections into a score and label
3. A language model writes a one-to-two sentence summary, filtered by a guardrail
4. Results are cached by image fingerprint; identical concurrent uploads share one analysis

When an upstream model fails or times out the API still answers, with a
fallback assessment whose `status.state` is `"fallback"`.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "Analysis", description = "Assess road-scene images and browse past analyses"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::analyze::analyze_handler,
        crate::handlers::analysis::get_analysis_handler,
        crate::handlers::analysis::history_handler,
        crate::handlers::analysis::stats_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            AnalyzeResponse,
            AnalysisRecord,
            HistoryResponse,
            StatsResponse,
            AnalysisStats,
            LabelCounts,
            FactorCount,
            CacheSummary,
        )
    )
)]
pub struct ApiDoc;
