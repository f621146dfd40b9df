//! Mock perception for tests and offline runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::PerceptionAdapter;
use crate::assessment::{
    Detection, Lighting, ObjectCategory, Perception, SceneContext, TrafficDensity, Weather,
};
use crate::error::{Error, Result, Stage};
use crate::fingerprint::ImageFingerprint;

const CATEGORIES: [ObjectCategory; 6] = [
    ObjectCategory::Person,
    ObjectCategory::Vehicle,
    ObjectCategory::Bicycle,
    ObjectCategory::Animal,
    ObjectCategory::Motorcycle,
    ObjectCategory::Other,
];

const POSITIONS: [&str; 4] = ["ahead", "center-left", "center-right", "roadside"];

/// What the mock returns once its delay has elapsed.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always this perception
    Respond(Perception),
    /// Deterministic output derived from the image fingerprint
    Derived,
    /// Always an adapter error with this message
    Fail(String),
    /// Never completes; only the caller's timeout ends the call
    Hang,
}

/// Mock perception adapter.
/// Counts invocations so tests can assert single-flight behavior.
pub struct MockPerception {
    behavior: MockBehavior,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockPerception {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn responding(perception: Perception) -> Self {
        Self::new(MockBehavior::Respond(perception))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fail(message.into()))
    }

    pub fn hanging() -> Self {
        Self::new(MockBehavior::Hang)
    }

    /// Simulated latency before the behavior applies.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `perceive` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stable pseudo-detections keyed on the image content.
    pub fn derive(image: &[u8]) -> Perception {
        let digest = ImageFingerprint::of(image);
        let b = digest.as_bytes();

        let count = (b[0] % 4) as usize;
        let detections = (0..count)
            .map(|i| {
                let seed = b[1 + i * 3];
                Detection::new(
                    CATEGORIES[(seed % CATEGORIES.len() as u8) as usize],
                    POSITIONS[(b[2 + i * 3] % POSITIONS.len() as u8) as usize],
                    0.5 + f32::from(b[3 + i * 3] % 50) / 100.0,
                )
            })
            .collect();

        let lighting = match b[12] % 3 {
            0 => Lighting::Day,
            1 => Lighting::Dusk,
            _ => Lighting::Night,
        };
        let weather = match b[13] % 4 {
            0 => Weather::Clear,
            1 => Weather::Rain,
            2 => Weather::Snow,
            _ => Weather::Fog,
        };
        let traffic = match b[14] % 3 {
            0 => TrafficDensity::Low,
            1 => TrafficDensity::Moderate,
            _ => TrafficDensity::Heavy,
        };

        Perception {
            detections,
            scene: SceneContext {
                road_type: "city_street".to_string(),
                lighting,
                weather,
                traffic,
                ..SceneContext::default()
            },
        }
    }
}

impl Default for MockPerception {
    fn default() -> Self {
        Self::new(MockBehavior::Derived)
    }
}

#[async_trait]
impl PerceptionAdapter for MockPerception {
    async fn perceive(&self, image: &[u8], _timeout: Duration) -> Result<Perception> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            MockBehavior::Respond(perception) => Ok(perception.clone()),
            MockBehavior::Derived => Ok(Self::derive(image)),
            MockBehavior::Fail(message) => Err(Error::adapter(Stage::Perception, message.clone())),
            MockBehavior::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_derived_output_is_deterministic() {
        let mock = MockPerception::default();
        let a = mock.perceive(b"frame", Duration::from_secs(1)).await.unwrap();
        let b = mock.perceive(b"frame", Duration::from_secs(1)).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_mock_reports_perception_stage() {
        let mock = MockPerception::failing("boom");
        let err = mock.perceive(b"frame", Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err, Error::adapter(Stage::Perception, "boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_mock_never_completes() {
        let mock = MockPerception::hanging();
        let result =
            tokio::time::timeout(Duration::from_secs(5), mock.perceive(b"frame", Duration::ZERO))
                .await;
        assert!(result.is_err());
    }
}
