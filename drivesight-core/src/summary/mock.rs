use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Summarizer, SummaryRequest};
use crate::error::{Error, Result, Stage};

/// Mock summarizer. Returns fixed text, echoes the label, or fails.
pub struct MockSummarizer {
    reply: Option<String>,
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockSummarizer {
    /// Replies "Risk level <LABEL>: conditions reviewed."
    pub fn new() -> Self {
        Self {
            reply: None,
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, request: &SummaryRequest, _timeout: Duration) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(Error::adapter(Stage::Summary, "mock summarizer failure"));
        }

        Ok(match &self.reply {
            Some(reply) => reply.clone(),
            None => format!("Risk level {}: conditions reviewed.", request.label),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
