//! OCR Providers
//!
//! Defines the provider trait and the OCR.space implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::OcrConfig;
use crate::document::EncodedPayload;

use super::transport::{OcrTransport, ReqwestTransport, TransportResponse};
use super::types::{error_message_text, OcrError, OcrOptions, OcrResponse};

/// OCR provider trait
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Submit an encoded image and return the parsed provider response
    async fn submit(&self, payload: &EncodedPayload) -> Result<OcrResponse, OcrError>;
}

/// Attempt count and geometric backoff between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-indexed): base, 2*base, 4*base...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// OCR.space parse API provider
pub struct OcrSpaceProvider {
    api_key: String,
    api_url: String,
    options: OcrOptions,
    retry: RetryPolicy,
    transport: Arc<dyn OcrTransport>,
}

impl OcrSpaceProvider {
    pub fn new(config: &OcrConfig) -> Self {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.read_timeout_secs),
        );
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &OcrConfig, transport: Arc<dyn OcrTransport>) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            options: OcrOptions {
                language: config.language.clone(),
                engine: config.engine,
                detect_orientation: config.detect_orientation,
                scale: config.scale,
            },
            retry: RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                base_delay: Duration::from_secs(config.base_delay_secs),
            },
            transport,
        }
    }

    fn form_fields(&self, payload: &EncodedPayload) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", self.api_key.clone()),
            ("language", self.options.language.clone()),
            ("isOverlayRequired", "true".to_string()),
            ("OCREngine", self.options.engine.to_string()),
            ("base64Image", payload.data_uri.clone()),
            ("scale", self.options.scale.to_string()),
            ("detectOrientation", self.options.detect_orientation.to_string()),
            ("isTable", "false".to_string()),
            ("filetype", "jpg".to_string()),
        ]
    }
}

#[async_trait]
impl OcrProvider for OcrSpaceProvider {
    fn name(&self) -> &str {
        "ocr.space"
    }

    async fn submit(&self, payload: &EncodedPayload) -> Result<OcrResponse, OcrError> {
        let form = self.form_fields(payload);
        let max_attempts = self.retry.max_attempts;
        let mut attempt = 0;

        // Attempts are strictly sequential: the provider bills per request
        loop {
            attempt += 1;
            tracing::info!(attempt, max_attempts, "Making API request to OCR.space");

            match self.transport.post_form(&self.api_url, &form).await {
                Ok(response) => {
                    tracing::info!(status = response.status, "API response received");
                    return interpret_response(response);
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(attempt, error = %err, "API request attempt failed");

                    if attempt >= max_attempts {
                        tracing::error!(attempts = attempt, "All API attempts failed");
                        return Err(OcrError::Unavailable {
                            attempts: attempt,
                            last_error: err.to_string(),
                        });
                    }

                    let delay = self.retry.delay_after(attempt);
                    tracing::info!(delay_secs = delay.as_secs_f64(), "Retrying API request");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(OcrError::Transport(err.to_string())),
            }
        }
    }
}

/// Map one HTTP outcome to a parsed response or a definitive error
fn interpret_response(response: TransportResponse) -> Result<OcrResponse, OcrError> {
    if response.status != 200 {
        let message = serde_json::from_str::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|value| value.get("ErrorMessage").and_then(error_message_text));

        tracing::error!(
            status = response.status,
            body = %truncate(&response.body, 512),
            "API error response"
        );
        return Err(OcrError::Provider {
            status: response.status,
            message,
        });
    }

    let parse_failed = |message: String| {
        tracing::error!(body = %truncate(&response.body, 512), "Failed to parse API response");
        OcrError::ResponseParse(message)
    };

    let value: serde_json::Value =
        serde_json::from_str(&response.body).map_err(|e| parse_failed(e.to_string()))?;

    // Serde would otherwise fill the struct from a JSON array
    if !value.is_object() {
        return Err(parse_failed("expected a JSON object".to_string()));
    }

    serde_json::from_value(value).map_err(|e| parse_failed(e.to_string()))
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub response: Result<OcrResponse, u16>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockProvider {
    pub fn returning(response: OcrResponse) -> Self {
        Self {
            response: Ok(response),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            response: Err(status),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, _payload: &EncodedPayload) -> Result<OcrResponse, OcrError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.response {
            Ok(response) => Ok(response.clone()),
            Err(status) => Err(OcrError::Provider {
                status: *status,
                message: None,
            }),
        }
    }
}
