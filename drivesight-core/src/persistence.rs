//! Persistence side-channel.
//!
//! The pipeline hands every freshly computed assessment to a sink on a
//! spawned task and never awaits the outcome. Durable storage is left to
//! the embedding application.

use std::sync::Arc;

use async_trait::async_trait;

use crate::assessment::RiskAssessment;
use crate::error::Result;

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Record an assessment together with the image it was computed from.
    /// Failures are logged by the caller and otherwise ignored.
    async fn persist(&self, assessment: Arc<RiskAssessment>, image: Arc<[u8]>) -> Result<()>;
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl PersistenceSink for NoopSink {
    async fn persist(&self, _assessment: Arc<RiskAssessment>, _image: Arc<[u8]>) -> Result<()> {
        Ok(())
    }
}
