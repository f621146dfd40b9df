//! Deterministic additive risk scoring.
//!
//! The score starts at `base_score`, every contributing condition adds a fixed
//! increment recorded as a named [`RiskFactor`], and the sum is clamped to
//! `0..=100` before the label thresholds are applied. The same detections and
//! scene always produce the same score, label and factor list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assessment::{
    Detection, Lighting, ObjectCategory, RiskFactor, RiskLabel, SceneContext, TrafficDensity,
    Weather,
};

/// Upper bound of the clamped score.
pub const MAX_SCORE: i32 = 100;

/// Visibility entries that mean "no issue".
const NO_ISSUE_SENTINELS: &[&str] = &["none", "no_issues", "no issues", "n/a"];

/// Increment magnitudes and label thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub base_score: i32,
    /// Per person/animal detection
    pub high_risk_object: i32,
    /// Per vehicle/bicycle/motorcycle detection
    pub medium_risk_object: i32,
    pub night: i32,
    pub dusk: i32,
    /// Rain or snow
    pub precipitation: i32,
    pub fog: i32,
    pub heavy_traffic: i32,
    pub moderate_traffic: i32,
    pub visibility_issue: i32,
    /// Weight for explicit risk factors not listed in `risk_factor_weights`
    pub default_risk_factor: i32,
    pub risk_factor_weights: BTreeMap<String, i32>,
    /// Inclusive lower bound of HIGH
    pub high_threshold: i32,
    /// Inclusive lower bound of MODERATE
    pub moderate_threshold: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let risk_factor_weights = [
            ("pedestrian_detected", 30),
            ("oncoming_traffic", 25),
            ("vehicle_too_close", 25),
            ("construction", 20),
            ("low_visibility", 20),
            ("speeding_zone", 15),
            ("wet_road", 15),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

        Self {
            base_score: 0,
            high_risk_object: 50,
            medium_risk_object: 20,
            night: 15,
            dusk: 10,
            precipitation: 20,
            fog: 15,
            heavy_traffic: 15,
            moderate_traffic: 5,
            visibility_issue: 10,
            default_risk_factor: 5,
            risk_factor_weights,
            high_threshold: 70,
            moderate_threshold: 40,
        }
    }
}

/// Result of scoring one perception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: u8,
    pub label: RiskLabel,
    pub factors: Vec<RiskFactor>,
}

/// Pure scorer over a [`ScoringConfig`].
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score detections and scene. Total: unknown values contribute nothing.
    pub fn score(&self, detections: &[Detection], scene: &SceneContext) -> ScoreBreakdown {
        let cfg = &self.config;
        let mut factors = Vec::new();

        for detection in detections {
            let delta = match detection.category {
                ObjectCategory::Person | ObjectCategory::Animal => cfg.high_risk_object,
                ObjectCategory::Vehicle | ObjectCategory::Bicycle | ObjectCategory::Motorcycle => {
                    cfg.medium_risk_object
                }
                ObjectCategory::Other => continue,
            };
            factors.push(RiskFactor::new(
                format!("object:{}", detection.category),
                delta,
            ));
        }

        let lighting = match scene.lighting {
            Lighting::Night => Some(cfg.night),
            Lighting::Dusk => Some(cfg.dusk),
            Lighting::Day | Lighting::Unknown => None,
        };
        if let Some(delta) = lighting {
            factors.push(RiskFactor::new(format!("lighting:{}", scene.lighting), delta));
        }

        let weather = match scene.weather {
            Weather::Rain | Weather::Snow => Some(cfg.precipitation),
            Weather::Fog => Some(cfg.fog),
            Weather::Clear | Weather::Unknown => None,
        };
        if let Some(delta) = weather {
            factors.push(RiskFactor::new(format!("weather:{}", scene.weather), delta));
        }

        let traffic = match scene.traffic {
            TrafficDensity::Heavy => Some(cfg.heavy_traffic),
            TrafficDensity::Moderate => Some(cfg.moderate_traffic),
            TrafficDensity::Low | TrafficDensity::Unknown => None,
        };
        if let Some(delta) = traffic {
            factors.push(RiskFactor::new(format!("traffic:{}", scene.traffic), delta));
        }

        for issue in scene.visibility_issues.iter().filter_map(|i| normalize_entry(i)) {
            if NO_ISSUE_SENTINELS.contains(&issue.as_str()) {
                continue;
            }
            factors.push(RiskFactor::new(
                format!("visibility:{issue}"),
                cfg.visibility_issue,
            ));
        }

        for factor in scene.risk_factors.iter().filter_map(|f| normalize_entry(f)) {
            let delta = cfg
                .risk_factor_weights
                .get(&factor)
                .copied()
                .unwrap_or(cfg.default_risk_factor);
            factors.push(RiskFactor::new(format!("risk_factor:{factor}"), delta));
        }

        let raw = factors
            .iter()
            .fold(cfg.base_score, |acc, f| acc.saturating_add(f.delta));
        let score = raw.clamp(0, MAX_SCORE) as u8;

        ScoreBreakdown {
            score,
            label: self.label_for(score),
            factors,
        }
    }

    pub fn label_for(&self, score: u8) -> RiskLabel {
        let score = i32::from(score);
        if score >= self.config.high_threshold {
            RiskLabel::High
        } else if score >= self.config.moderate_threshold {
            RiskLabel::Moderate
        } else {
            RiskLabel::Low
        }
    }
}

/// Lowercase, trim and snake-case a free-text entry; `None` when blank.
fn normalize_entry(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(lighting: Lighting, weather: Weather, traffic: TrafficDensity) -> SceneContext {
        SceneContext {
            lighting,
            weather,
            traffic,
            ..SceneContext::default()
        }
    }

    fn detection(category: ObjectCategory) -> Detection {
        Detection::new(category, "ahead", 0.9)
    }

    #[test]
    fn test_empty_daylight_scene_scores_zero() {
        let scorer = RiskScorer::default();
        let result = scorer.score(
            &[],
            &scene(Lighting::Day, Weather::Clear, TrafficDensity::Low),
        );
        assert_eq!(result.score, 0);
        assert_eq!(result.label, RiskLabel::Low);
        assert!(result.factors.is_empty());
    }

    #[test]
    fn test_person_vehicle_night_rain_is_summed_and_clamped() {
        let scorer = RiskScorer::default();
        let cfg = scorer.config().clone();
        let result = scorer.score(
            &[
                detection(ObjectCategory::Person),
                detection(ObjectCategory::Vehicle),
            ],
            &scene(Lighting::Night, Weather::Rain, TrafficDensity::Unknown),
        );

        let expected = (cfg.high_risk_object + cfg.medium_risk_object + cfg.night + cfg.precipitation)
            .min(MAX_SCORE);
        assert_eq!(i32::from(result.score), expected);
        assert_eq!(result.label, RiskLabel::High);
        let names: Vec<_> = result.factors.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["object:person", "object:vehicle", "lighting:night", "weather:rain"]
        );
    }

    #[test]
    fn test_each_instance_counts_until_clamp() {
        let scorer = RiskScorer::default();
        let crowd = vec![detection(ObjectCategory::Person); 5];
        let result = scorer.score(&crowd, &SceneContext::default());
        assert_eq!(result.factors.len(), 5);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_label_boundaries() {
        let scorer = RiskScorer::default();
        assert_eq!(scorer.label_for(70), RiskLabel::High);
        assert_eq!(scorer.label_for(69), RiskLabel::Moderate);
        assert_eq!(scorer.label_for(40), RiskLabel::Moderate);
        assert_eq!(scorer.label_for(39), RiskLabel::Low);
        assert_eq!(scorer.label_for(0), RiskLabel::Low);
        assert_eq!(scorer.label_for(100), RiskLabel::High);
    }

    #[test]
    fn test_sum_of_exactly_seventy_is_high() {
        // person (50) + bicycle (20)
        let scorer = RiskScorer::default();
        let result = scorer.score(
            &[
                detection(ObjectCategory::Person),
                detection(ObjectCategory::Bicycle),
            ],
            &SceneContext::default(),
        );
        assert_eq!(result.score, 70);
        assert_eq!(result.label, RiskLabel::High);
    }

    #[test]
    fn test_sum_of_exactly_forty_is_moderate() {
        // vehicle (20) + rain (20)
        let scorer = RiskScorer::default();
        let result = scorer.score(
            &[detection(ObjectCategory::Vehicle)],
            &scene(Lighting::Unknown, Weather::Rain, TrafficDensity::Unknown),
        );
        assert_eq!(result.score, 40);
        assert_eq!(result.label, RiskLabel::Moderate);
    }

    #[test]
    fn test_modifier_ordering_night_over_dusk_and_heavy_over_moderate() {
        let cfg = ScoringConfig::default();
        assert!(cfg.night > cfg.dusk);
        assert!(cfg.precipitation > cfg.fog);
        assert!(cfg.heavy_traffic > cfg.moderate_traffic);
        assert!(cfg.high_risk_object > cfg.medium_risk_object);
    }

    #[test]
    fn test_visibility_and_explicit_factors() {
        let scorer = RiskScorer::default();
        let scene = SceneContext {
            visibility_issues: vec![
                "glare".into(),
                "".into(),
                "none".into(),
                "Obstructed View".into(),
            ],
            risk_factors: vec!["wet_road".into(), "loose_gravel".into()],
            ..SceneContext::default()
        };
        let result = scorer.score(&[], &scene);
        assert_eq!(
            result.factors,
            vec![
                RiskFactor::new("visibility:glare", 10),
                RiskFactor::new("visibility:obstructed_view", 10),
                RiskFactor::new("risk_factor:wet_road", 15),
                RiskFactor::new("risk_factor:loose_gravel", 5),
            ]
        );
        assert_eq!(result.score, 40);
    }

    #[test]
    fn test_other_objects_and_unknown_scene_are_no_ops() {
        let scorer = RiskScorer::default();
        let result = scorer.score(&[detection(ObjectCategory::Other)], &SceneContext::default());
        assert_eq!(result.score, 0);
        assert!(result.factors.is_empty());
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = RiskScorer::default();
        let detections = vec![
            detection(ObjectCategory::Animal),
            detection(ObjectCategory::Motorcycle),
        ];
        let scene = SceneContext {
            lighting: Lighting::Dusk,
            weather: Weather::Fog,
            traffic: TrafficDensity::Heavy,
            visibility_issues: vec!["glare".into()],
            risk_factors: vec!["construction".into()],
            ..SceneContext::default()
        };
        let first = scorer.score(&detections, &scene);
        for _ in 0..10 {
            assert_eq!(scorer.score(&detections, &scene), first);
        }
    }

    #[test]
    fn test_custom_thresholds_and_negative_base_clamp() {
        let scorer = RiskScorer::new(ScoringConfig {
            base_score: -30,
            high_threshold: 15,
            moderate_threshold: 5,
            ..ScoringConfig::default()
        });
        let low = scorer.score(&[], &SceneContext::default());
        assert_eq!(low.score, 0);
        assert_eq!(low.label, RiskLabel::Low);

        let high = scorer.score(
            &[detection(ObjectCategory::Person)],
            &SceneContext::default(),
        );
        assert_eq!(high.score, 20);
        assert_eq!(high.label, RiskLabel::High);
    }
}
