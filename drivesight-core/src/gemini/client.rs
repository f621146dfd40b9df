//! HTTP client for `generateContent` with retry and backoff.

use std::time::{Duration, Instant};

use backoff::{future::retry_notify, ExponentialBackoff};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::GeminiConfig;
use crate::error::{Error, Result, Stage};

const INITIAL_INTERVAL: Duration = Duration::from_millis(250);
const MAX_INTERVAL: Duration = Duration::from_secs(4);

/// Sampling parameters sent with each request.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

/// Shared Gemini client.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    #[instrument(level = "debug", skip_all, fields(model = %config.model))]
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .https_only(true)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                Error::Config(format!("Failed to create HTTP client: {e}"))
            })?;

        info!("Gemini client created");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Generate text from a prompt, optionally with one inline image.
    ///
    /// Transient failures (timeouts, connect errors, 429/502/503/504) are
    /// retried until `timeout` has elapsed overall.
    pub async fn generate(
        &self,
        stage: Stage,
        prompt: &str,
        image: Option<(&[u8], &str)>,
        generation: GenerationConfig,
        timeout: Duration,
    ) -> Result<String> {
        let mut parts = vec![Part::Text { text: prompt }];
        if let Some((bytes, mime_type)) = image {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type,
                    data: STANDARD.encode(bytes),
                },
            });
        }
        let request = GenerateRequest {
            contents: [Content { parts }],
            generation_config: generation,
        };

        let url = self.config.endpoint();
        let timeout = timeout.min(self.config.timeout);
        let backoff = ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_INTERVAL,
            max_elapsed_time: Some(timeout.saturating_mul(self.config.max_retries.max(1))),
            ..Default::default()
        };

        retry_notify(
            backoff,
            || {
                let request = &request;
                let url = url.as_str();
                async move { self.send_once(stage, url, request, timeout).await }
            },
            |err: Error, duration: Duration| {
                warn!(
                    %stage,
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    async fn send_once(
        &self,
        stage: Stage,
        url: &str,
        request: &GenerateRequest<'_>,
        timeout: Duration,
    ) -> std::result::Result<String, backoff::Error<Error>> {
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let latency_ms = start.elapsed().as_millis() as u64;
                if e.is_timeout() {
                    warn!(%stage, latency_ms, "Request timed out, will retry");
                    backoff::Error::transient(Error::timeout(stage, timeout))
                } else if is_transient_error(&e) {
                    warn!(%stage, error = %e, latency_ms, "Transient error, will retry");
                    backoff::Error::transient(Error::adapter(stage, format!("Transient error: {e}")))
                } else {
                    warn!(%stage, error = %e, latency_ms, "Permanent error, aborting");
                    backoff::Error::permanent(Error::adapter(stage, format!("Gemini request failed: {e}")))
                }
            })?;

        let status = response.status();
        debug!(%stage, status = %status, "Received HTTP response");

        if !status.is_success() {
            let err = Error::adapter(stage, format!("Gemini API returned status: {status}"));
            return if is_transient_status(status) {
                warn!(%stage, status = %status, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(%stage, status = %status, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            warn!(%stage, error = %e, "Failed to parse Gemini response");
            backoff::Error::permanent(Error::adapter(stage, format!("Invalid Gemini response: {e}")))
        })?;

        debug!(
            %stage,
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed successfully"
        );

        parsed
            .into_text()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                backoff::Error::permanent(Error::adapter(stage, "Gemini returned no candidates"))
            })
    }
}

fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}
