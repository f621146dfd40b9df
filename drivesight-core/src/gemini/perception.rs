use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{GeminiClient, GenerationConfig};
use crate::assessment::{
    Detection, Lighting, ObjectCategory, Perception, SceneContext, TrafficDensity, Weather,
};
use crate::error::{Error, Result, Stage};
use crate::lenient;
use crate::perception::PerceptionAdapter;
use crate::validate::inspect_image;

const GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.3,
    max_output_tokens: 1024,
};

const ANALYSIS_PROMPT: &str = r#"Analyze this dashcam/road scene image for driving hazards and risk assessment.

Respond ONLY with valid JSON (no markdown, no extra text) in this exact format:
{
  "detected_objects": [
    {"label": "person", "confidence": 0.95, "position": "center-right"},
    {"label": "vehicle", "confidence": 0.92, "position": "ahead"}
  ],
  "scene_analysis": {
    "road_type": "city_street",
    "lighting": "daylight",
    "weather": "clear",
    "traffic_density": "moderate"
  },
  "visibility_issues": ["none"],
  "risk_factors": ["pedestrian_detected", "oncoming_traffic"]
}

Guidelines:
- Detected objects: person, vehicle, bicycle, motorcycle, animal, or other
- Road types: highway, city_street, rural_road, parking_lot, unknown
- Lighting: daylight, dawn_dusk, night, artificial_light
- Weather: clear, rain, fog, snow, cloudy
- Traffic density: light, moderate, heavy
- Visibility: no_issues, weather_related, lighting_related, obstructed_view
- Risk factors: specific hazards such as pedestrian_detected, speeding_zone, construction, wet_road
- Be concise and factual. Only report objects that are visible."#;

/// Wire shape requested from the model. Every field is optional and any
/// `null` or wrong-typed value falls back to its default.
#[derive(Debug, Default, Deserialize)]
struct RawPerception {
    #[serde(default, deserialize_with = "lenient::list")]
    detected_objects: Vec<RawObject>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    scene_analysis: RawScene,
    #[serde(default, deserialize_with = "lenient::strings")]
    visibility_issues: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    risk_factors: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawObject {
    #[serde(default, deserialize_with = "lenient::string")]
    label: String,
    #[serde(default, deserialize_with = "lenient::number")]
    confidence: f32,
    #[serde(default, deserialize_with = "lenient::string")]
    position: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawScene {
    #[serde(default, deserialize_with = "lenient::non_blank")]
    road_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    lighting: String,
    #[serde(default, deserialize_with = "lenient::string")]
    weather: String,
    #[serde(default, deserialize_with = "lenient::string")]
    traffic_density: String,
}

impl From<RawPerception> for Perception {
    fn from(raw: RawPerception) -> Self {
        let detections = raw
            .detected_objects
            .into_iter()
            .map(|o| Detection::new(ObjectCategory::parse(&o.label), o.position, o.confidence))
            .collect();

        let scene = SceneContext {
            road_type: raw
                .scene_analysis
                .road_type
                .unwrap_or_else(|| "unknown".to_string()),
            lighting: Lighting::parse(&raw.scene_analysis.lighting),
            weather: Weather::parse(&raw.scene_analysis.weather),
            traffic: TrafficDensity::parse(&raw.scene_analysis.traffic_density),
            visibility_issues: raw.visibility_issues,
            risk_factors: raw.risk_factors,
        };

        Perception { detections, scene }
    }
}

/// Remove a surrounding Markdown code fence, with or without a `json` tag.
fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn parse_response(text: &str) -> Result<Perception> {
    let raw: RawPerception = serde_json::from_str(strip_code_fence(text)).map_err(|e| {
        let preview: String = text.chars().take(200).collect();
        debug!(raw = %preview, "Unparseable perception response");
        Error::adapter(Stage::Perception, format!("Invalid perception JSON: {e}"))
    })?;
    Ok(raw.into())
}

/// Perception through Gemini's multimodal endpoint.
pub struct GeminiPerception {
    client: Arc<GeminiClient>,
}

impl GeminiPerception {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PerceptionAdapter for GeminiPerception {
    #[instrument(level = "info", skip_all, fields(image_bytes = image.len(), timeout_ms = timeout.as_millis() as u64))]
    async fn perceive(&self, image: &[u8], timeout: Duration) -> Result<Perception> {
        let kind = inspect_image(image, usize::MAX)
            .map_err(|e| Error::adapter(Stage::Perception, e.to_string()))?;

        let text = self
            .client
            .generate(
                Stage::Perception,
                ANALYSIS_PROMPT,
                Some((image, kind.mime_type())),
                GENERATION,
                timeout,
            )
            .await?;

        let perception = parse_response(&text).inspect_err(|e| {
            warn!(error = %e, "Failed to parse Gemini perception");
        })?;

        info!(
            objects = perception.detections.len(),
            lighting = %perception.scene.lighting,
            weather = %perception.scene.weather,
            "Perception completed"
        );
        Ok(perception)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn test_parse_response_normalizes_labels() {
        let text = r#"```json
{
  "detected_objects": [
    {"label": "pedestrian", "confidence": 0.95, "position": "center-right"},
    {"label": "truck", "confidence": 1.4, "position": "ahead"},
    {"label": "traffic cone", "confidence": 0.5, "position": "roadside"}
  ],
  "scene_analysis": {
    "road_type": "city_street",
    "lighting": "dawn_dusk",
    "weather": "light rain",
    "traffic_density": "light"
  },
  "visibility_issues": ["none"],
  "risk_factors": ["pedestrian_detected"]
}
```"#;
        let perception = parse_response(text).unwrap();
        let categories: Vec<_> = perception.detections.iter().map(|d| d.category).collect();
        assert_eq!(
            categories,
            vec![ObjectCategory::Person, ObjectCategory::Vehicle, ObjectCategory::Other]
        );
        assert_eq!(perception.detections[1].confidence, 1.0);
        assert_eq!(perception.scene.road_type, "city_street");
        assert_eq!(perception.scene.lighting, Lighting::Dusk);
        assert_eq!(perception.scene.weather, Weather::Rain);
        assert_eq!(perception.scene.traffic, TrafficDensity::Low);
        assert_eq!(perception.scene.risk_factors, vec!["pedestrian_detected"]);
    }

    #[test]
    fn test_parse_response_tolerates_missing_fields() {
        let perception = parse_response("{}").unwrap();
        assert!(perception.detections.is_empty());
        assert_eq!(perception.scene, SceneContext::default());
    }

    #[test]
    fn test_parse_response_tolerates_null_fields() {
        let text = r#"{
  "detected_objects": [
    {"label": "pedestrian", "confidence": null, "position": null},
    {"label": null, "confidence": "0.8", "position": "ahead"},
    null
  ],
  "scene_analysis": {
    "road_type": null,
    "lighting": "night",
    "weather": null,
    "traffic_density": null
  },
  "visibility_issues": null,
  "risk_factors": null
}"#;
        let perception = parse_response(text).unwrap();

        assert_eq!(perception.detections.len(), 2);
        assert_eq!(perception.detections[0].category, ObjectCategory::Person);
        assert_eq!(perception.detections[0].confidence, 0.0);
        assert_eq!(perception.detections[0].position, "");
        assert_eq!(perception.detections[1].category, ObjectCategory::Other);
        assert_eq!(perception.detections[1].confidence, 0.8);
        assert_eq!(perception.scene.road_type, "unknown");
        assert_eq!(perception.scene.lighting, Lighting::Night);
        assert_eq!(perception.scene.weather, Weather::Unknown);
        assert_eq!(perception.scene.traffic, TrafficDensity::Unknown);
        assert!(perception.scene.visibility_issues.is_empty());
        assert!(perception.scene.risk_factors.is_empty());
    }

    #[test]
    fn test_parse_response_null_scene() {
        let perception =
            parse_response(r#"{"detected_objects": null, "scene_analysis": null}"#).unwrap();
        assert!(perception.detections.is_empty());
        assert_eq!(perception.scene, SceneContext::default());
    }

    #[test]
    fn test_parse_response_rejects_prose() {
        let err = parse_response("I cannot analyze this image.").unwrap_err();
        assert!(matches!(
            err,
            Error::AdapterError {
                stage: Stage::Perception,
                ..
            }
        ));
    }
}
