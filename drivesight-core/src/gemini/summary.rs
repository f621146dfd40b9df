use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{GeminiClient, GenerationConfig};
use crate::error::{Result, Stage};
use crate::summary::{Summarizer, SummaryRequest};

const GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    max_output_tokens: 150,
};

fn build_prompt(request: &SummaryRequest) -> String {
    let objects = if request.detections.is_empty() {
        "No objects detected".to_string()
    } else {
        request
            .detections
            .iter()
            .map(|d| format!("{} (confidence: {:.0}%)", d.category, d.confidence * 100.0))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let risk_factors = if request.scene.risk_factors.is_empty() {
        "none".to_string()
    } else {
        request.scene.risk_factors.join(", ")
    };

    let scene = &request.scene;
    format!(
        "Based on this road scene analysis, generate a concise driving risk summary (2-3 sentences max).

Detection Summary:
- Objects: {objects}
- Road Type: {}
- Lighting: {}
- Weather: {}
- Traffic: {}
- Risk Factors: {risk_factors}
- Risk Score: {}/100 ({})

Generate a natural, actionable summary. Start with \"Risk level {}:\".",
        scene.road_type, scene.lighting, scene.weather, scene.traffic, request.score, request.label, request.label
    )
}

/// Summaries from Gemini's text endpoint.
pub struct GeminiSummarizer {
    client: Arc<GeminiClient>,
}

impl GeminiSummarizer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    #[instrument(level = "info", skip_all, fields(label = %request.label, score = request.score))]
    async fn summarize(&self, request: &SummaryRequest, timeout: Duration) -> Result<String> {
        let prompt = build_prompt(request);
        let summary = self
            .client
            .generate(Stage::Summary, &prompt, None, GENERATION, timeout)
            .await?;

        let summary = summary.trim().to_string();
        info!(chars = summary.chars().count(), "Summary generated");
        Ok(summary)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
