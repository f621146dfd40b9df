//! Perception adapters: image bytes in, structured detections out.
//!
//! The pipeline treats perception as an opaque, fallible, slow capability.
//! It always wraps the call in its own timeout, and the timeout is also passed
//! to the adapter so network implementations can bound their requests.
//!
//! - **Gemini** - multimodal model over HTTPS (feature `gemini`)
//! - **Mock** - scripted or fingerprint-derived output for tests and offline runs

mod mock;

pub use mock::{MockBehavior, MockPerception};

use std::time::Duration;

use async_trait::async_trait;

use crate::assessment::Perception;
use crate::error::Result;

/// Source of structured scene detections.
///
/// Implementations must be thread-safe (`Send + Sync`); one adapter instance
/// is shared by every concurrent assessment.
#[async_trait]
pub trait PerceptionAdapter: Send + Sync {
    /// Detect objects and scene attributes in `image`.
    ///
    /// Errors should be `Error::AdapterError` or `Error::AdapterTimeout` with
    /// `Stage::Perception`; the pipeline degrades either one to a fallback.
    async fn perceive(&self, image: &[u8], timeout: Duration) -> Result<Perception>;

    /// Short identifier for logs.
    fn name(&self) -> &'static str;
}
