//! Data model shared by the scorer, the cache and the pipeline.
//!
//! Perception output arrives as free text from a multimodal model, so every
//! enumerated attribute here has a lenient `parse` that maps synonyms onto the
//! enum and anything unrecognized onto its `Unknown`/`Other` variant. The
//! serde impls go through the same `parse`, which keeps deserialization total.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::ImageFingerprint;
use crate::lenient;

/// Version stamped into every assessment.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

macro_rules! lenient_serde {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                    s.serialize_str(self.as_str())
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                    let raw = crate::lenient::string(d)?;
                    Ok(<$ty>::parse(&raw))
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

fn tokens(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| {
            let t = t.to_ascii_lowercase();
            match t.strip_suffix('s') {
                Some(stem) if stem.len() >= 3 && !t.ends_with("ss") => stem.to_string(),
                _ => t,
            }
        })
}

/// Category of a detected road user or obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    Person,
    Vehicle,
    Bicycle,
    Animal,
    Motorcycle,
    Other,
}

impl ObjectCategory {
    pub fn parse(raw: &str) -> Self {
        let mut found = Self::Other;
        for token in tokens(raw) {
            let category = match token.as_str() {
                "motorcycle" | "motorbike" | "scooter" | "moped" => Self::Motorcycle,
                "bicycle" | "bike" | "cyclist" | "bicyclist" => Self::Bicycle,
                "person" | "pedestrian" | "people" | "human" | "child" | "children" => {
                    Self::Person
                }
                "animal" | "dog" | "cat" | "deer" | "horse" | "cow" | "bird" | "sheep" => {
                    Self::Animal
                }
                "vehicle" | "car" | "truck" | "bus" | "buse" | "van" | "suv" | "taxi" | "lorry"
                | "trailer" => Self::Vehicle,
                _ => continue,
            };
            // First recognized token wins.
            found = category;
            break;
        }
        found
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Vehicle => "vehicle",
            Self::Bicycle => "bicycle",
            Self::Animal => "animal",
            Self::Motorcycle => "motorcycle",
            Self::Other => "other",
        }
    }
}

/// Lighting conditions of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lighting {
    Day,
    Dusk,
    Night,
    #[default]
    Unknown,
}

impl Lighting {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.to_ascii_lowercase();
        if raw.contains("night") || raw.contains("dark") {
            Self::Night
        } else if raw.contains("dusk") || raw.contains("dawn") || raw.contains("twilight") {
            Self::Dusk
        } else if raw.contains("day") || raw.contains("sun") || raw.contains("bright") {
            Self::Day
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Dusk => "dusk",
            Self::Night => "night",
            Self::Unknown => "unknown",
        }
    }
}

/// Weather conditions of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Weather {
    Clear,
    Rain,
    Snow,
    Fog,
    #[default]
    Unknown,
}

impl Weather {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.to_ascii_lowercase();
        if raw.contains("rain") || raw.contains("drizzle") || raw.contains("storm") {
            Self::Rain
        } else if raw.contains("snow") || raw.contains("sleet") || raw.contains("blizzard") {
            Self::Snow
        } else if raw.contains("fog") || raw.contains("mist") || raw.contains("haze") {
            Self::Fog
        } else if raw.contains("clear") || raw.contains("sunny") {
            Self::Clear
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Fog => "fog",
            Self::Unknown => "unknown",
        }
    }
}

/// Traffic density around the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrafficDensity {
    Low,
    Moderate,
    Heavy,
    #[default]
    Unknown,
}

impl TrafficDensity {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.to_ascii_lowercase();
        if raw.contains("heavy") || raw.contains("congest") || raw.contains("dense") {
            Self::Heavy
        } else if raw.contains("moderate") || raw.contains("medium") {
            Self::Moderate
        } else if raw.contains("light")
            || raw.contains("low")
            || raw.contains("sparse")
            || raw.contains("none")
            || raw.contains("empty")
        {
            Self::Low
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
            Self::Unknown => "unknown",
        }
    }
}

lenient_serde!(ObjectCategory, Lighting, Weather, TrafficDensity);

/// One recognized entity in the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub category: ObjectCategory,
    /// Coarse position descriptor, e.g. "ahead" or "center-right"
    #[serde(default, deserialize_with = "lenient::string")]
    pub position: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: f32,
}

impl Detection {
    pub fn new(category: ObjectCategory, position: impl Into<String>, confidence: f32) -> Self {
        Self {
            category,
            position: position.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Scene-level attributes reported alongside the detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneContext {
    #[serde(default = "unknown_road", deserialize_with = "road_type")]
    pub road_type: String,
    #[serde(default)]
    pub lighting: Lighting,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub traffic: TrafficDensity,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub visibility_issues: Vec<String>,
    /// Named hazards reported explicitly by perception (e.g. `wet_road`)
    #[serde(default, deserialize_with = "lenient::strings")]
    pub risk_factors: Vec<String>,
}

fn unknown_road() -> String {
    "unknown".to_string()
}

fn road_type<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient::non_blank(d)?.unwrap_or_else(unknown_road))
}

impl Default for SceneContext {
    fn default() -> Self {
        Self {
            road_type: unknown_road(),
            lighting: Lighting::Unknown,
            weather: Weather::Unknown,
            traffic: TrafficDensity::Unknown,
            visibility_issues: Vec::new(),
            risk_factors: Vec::new(),
        }
    }
}

/// Output of a perception adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    #[serde(default, deserialize_with = "lenient::list")]
    pub detections: Vec<Detection>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub scene: SceneContext,
}

/// Severity label derived from the clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLabel {
    Low,
    Moderate,
    High,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MODERATE" => Ok(Self::Moderate),
            "HIGH" => Ok(Self::High),
            other => Err(format!("unknown risk label '{other}'")),
        }
    }
}

/// A named contribution to the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub delta: i32,
}

impl RiskFactor {
    pub fn new(name: impl Into<String>, delta: i32) -> Self {
        Self {
            name: name.into(),
            delta,
        }
    }
}

/// Where the summary text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// Produced by the summarizer adapter
    Generated,
    /// Built deterministically from the factors after a summarizer failure
    Template,
    /// Perception failed; fixed degraded text
    Fallback,
}

/// Whether the assessment reflects a full analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssessmentStatus {
    Complete,
    Fallback { reason: String },
}

/// Terminal artifact of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub fingerprint: ImageFingerprint,
    pub score: u8,
    pub label: RiskLabel,
    pub factors: Vec<RiskFactor>,
    pub summary: String,
    pub summary_source: SummarySource,
    pub detections: Vec<Detection>,
    pub scene: SceneContext,
    pub status: AssessmentStatus,
    pub assessed_at: DateTime<Utc>,
    pub agent_version: String,
}

impl RiskAssessment {
    pub fn is_fallback(&self) -> bool {
        matches!(self.status, AssessmentStatus::Fallback { .. })
    }
}

/// Shared handle given to every caller of the same flight.
pub type SharedAssessment = Arc<RiskAssessment>;
