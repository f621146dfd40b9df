//! Summarizer adapters and the deterministic template used when they fail.

mod mock;

pub use mock::MockSummarizer;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::assessment::{Detection, RiskFactor, RiskLabel, SceneContext};
use crate::error::Result;

/// Everything a summarizer may draw on. Built from the scored perception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub score: u8,
    pub label: RiskLabel,
    pub factors: Vec<RiskFactor>,
    pub detections: Vec<Detection>,
    pub scene: SceneContext,
}

/// Natural-language summary generator.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// One or two sentences describing the risk. Output is untrusted and
    /// always passes through the guardrail afterwards.
    async fn summarize(&self, request: &SummaryRequest, timeout: Duration) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Summary built only from the scored factors.
///
/// Used whenever the summarizer fails or times out, so an assessment always
/// carries some text. Identical requests yield identical text.
pub fn template_summary(request: &SummaryRequest) -> String {
    let mut parts: Vec<(String, usize)> = Vec::new();
    for factor in &request.factors {
        let phrase = describe(&factor.name);
        match parts.last_mut() {
            Some((last, count)) if *last == phrase => *count += 1,
            _ => parts.push((phrase, 1)),
        }
    }

    let hazards = if parts.is_empty() {
        "no notable hazards detected".to_string()
    } else {
        parts
            .into_iter()
            .map(|(phrase, count)| match count {
                1 => phrase,
                n => format!("{phrase} (x{n})"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Risk level {} (score {}/100): {hazards}.",
        request.label, request.score
    )
}

fn describe(factor: &str) -> String {
    let (kind, value) = factor.split_once(':').unwrap_or(("", factor));
    let value = value.replace('_', " ");
    match kind {
        "object" => format!("{value} detected"),
        "lighting" => format!("{value} lighting"),
        "weather" => value,
        "traffic" => format!("{value} traffic"),
        "visibility" => format!("visibility: {value}"),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(factors: Vec<RiskFactor>, score: u8, label: RiskLabel) -> SummaryRequest {
        SummaryRequest {
            score,
            label,
            factors,
            detections: Vec::new(),
            scene: SceneContext::default(),
        }
    }

    #[test]
    fn test_template_lists_factors_in_order() {
        let req = request(
            vec![
                RiskFactor::new("object:person", 50),
                RiskFactor::new("object:person", 50),
                RiskFactor::new("lighting:night", 15),
                RiskFactor::new("weather:rain", 20),
                RiskFactor::new("risk_factor:wet_road", 15),
            ],
            100,
            RiskLabel::High,
        );
        assert_eq!(
            template_summary(&req),
            "Risk level HIGH (score 100/100): person detected (x2), night lighting, rain, wet road."
        );
    }

    #[test]
    fn test_template_without_factors() {
        let req = request(Vec::new(), 0, RiskLabel::Low);
        assert_eq!(
            template_summary(&req),
            "Risk level LOW (score 0/100): no notable hazards detected."
        );
    }

    #[test]
    fn test_template_is_deterministic() {
        let req = request(
            vec![RiskFactor::new("traffic:heavy", 15)],
            15,
            RiskLabel::Low,
        );
        assert_eq!(template_summary(&req), template_summary(&req));
    }
}
