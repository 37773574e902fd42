//! Anthropic Messages API backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use folio_core::defaults::{
    ANTHROPIC_API_VERSION, INFERENCE_RETRY_BASE_MS, INFERENCE_RETRY_MAX_MS, INFERENCE_TEMPERATURE,
};
use folio_core::{Error, GenerationBackend, InferenceSettings, Result, VisionBackend};

use super::error::{to_folio_error, AnthropicErrorCode};
use super::types::*;

/// Instruction used when `describe_image` is called without a prompt.
pub const DEFAULT_VISION_PROMPT: &str = "Describe this image in detail.";

/// Configuration for the Anthropic backend.
#[derive(Clone)]
pub struct AnthropicConfig {
    /// Base URL for the API endpoint, without the `/v1` suffix.
    pub base_url: String,
    pub api_key: String,
    /// Model used for both generation and vision calls.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Retries after the first attempt for retryable failures.
    pub max_retries: u32,
    /// Base delay of the exponential backoff.
    pub retry_base_ms: u64,
    /// Cap for a single backoff delay.
    pub retry_max_ms: u64,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl AnthropicConfig {
    /// Build a backend configuration from loaded settings.
    pub fn from_settings(settings: &InferenceSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: INFERENCE_TEMPERATURE,
            timeout_seconds: settings.timeout_secs,
            max_retries: settings.max_retries,
            retry_base_ms: INFERENCE_RETRY_BASE_MS,
            retry_max_ms: INFERENCE_RETRY_MAX_MS,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(20)).unwrap_or(u64::MAX);
        let ms = self.retry_base_ms.saturating_mul(factor).min(self.retry_max_ms);
        Duration::from_millis(ms)
    }
}

/// Anthropic inference backend (text generation and image description).
pub struct AnthropicBackend {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("Anthropic API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "anthropic",
            model = %config.model,
            max_retries = config.max_retries,
            "Initializing Anthropic backend"
        );

        Ok(Self { client, config })
    }

    /// Create from loaded settings.
    pub fn from_settings(settings: &InferenceSettings) -> Result<Self> {
        Self::new(AnthropicConfig::from_settings(settings))
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn build_request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
    }

    fn request(&self, system: Option<&str>, content: Vec<ContentBlock>) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: system.filter(|s| !s.is_empty()).map(str::to_string),
            messages: vec![Message::user(content)],
        }
    }

    /// Send a messages request, retrying rate-limit, overload and server errors.
    pub async fn send_messages(&self, request: &MessagesRequest) -> Result<String> {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            match self.send_once(request).await {
                Ok(text) => {
                    debug!(
                        subsystem = "inference",
                        component = "anthropic",
                        op = "messages",
                        model = %request.model,
                        attempt,
                        response_len = text.len(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Messages call complete"
                    );
                    return Ok(text);
                }
                Err(failure) if failure.retryable && attempt < self.config.max_retries => {
                    let delay = failure
                        .retry_after
                        .map(|d| d.min(Duration::from_millis(self.config.retry_max_ms)))
                        .unwrap_or_else(|| self.config.backoff_delay(attempt));
                    warn!(
                        subsystem = "inference",
                        component = "anthropic",
                        op = "messages",
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure.error,
                        "Retryable model call failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn send_once(&self, request: &MessagesRequest) -> std::result::Result<String, CallFailure> {
        let response = self
            .build_request(self.client.post(self.endpoint("/v1/messages")))
            .json(request)
            .send()
            .await
            .map_err(|e| CallFailure {
                retryable: e.is_timeout() || e.is_connect(),
                retry_after: None,
                error: Error::Inference(format!("Request failed: {}", e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(&response);
            let (error_type, message) = match response.json::<ApiErrorResponse>().await {
                Ok(body) => (body.error.error_type, body.error.message),
                Err(_) => (String::new(), format!("Anthropic returned {}", status)),
            };
            let code = AnthropicErrorCode::from_response(status.as_u16(), &error_type);
            return Err(CallFailure {
                retryable: code.is_retryable(),
                retry_after,
                error: to_folio_error(code, &message),
            });
        }

        let result: MessagesResponse = response.json().await.map_err(|e| CallFailure {
            retryable: false,
            retry_after: None,
            error: Error::Inference(format!("Failed to parse response: {}", e)),
        })?;

        let text = result.text();
        if text.trim().is_empty() {
            return Err(CallFailure {
                retryable: false,
                retry_after: None,
                error: Error::Inference(format!(
                    "Model returned no text content (stop_reason: {})",
                    result.stop_reason.as_deref().unwrap_or("unknown")
                )),
            });
        }
        Ok(text)
    }
}

/// One failed attempt, with its retry classification.
struct CallFailure {
    retryable: bool,
    retry_after: Option<Duration>,
    error: Error,
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        debug!(
            subsystem = "inference",
            component = "anthropic",
            op = "generate",
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Generating"
        );
        let request = self.request(Some(system), vec![ContentBlock::text(prompt)]);
        self.send_messages(&request).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl VisionBackend for AnthropicBackend {
    async fn describe_image(
        &self,
        image_data: &[u8],
        mime_type: &str,
        prompt: Option<&str>,
    ) -> Result<String> {
        if image_data.is_empty() {
            return Err(Error::Input("Cannot describe empty image data".to_string()));
        }

        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);
        debug!(
            subsystem = "inference",
            component = "anthropic",
            op = "describe_image",
            model = %self.config.model,
            image_bytes = image_data.len(),
            "Describing image"
        );

        let request = self.request(
            None,
            vec![
                ContentBlock::text(prompt.unwrap_or(DEFAULT_VISION_PROMPT)),
                ContentBlock::base64_image(mime_type, image_b64),
            ],
        );
        self.send_messages(&request).await
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .build_request(self.client.get(self.endpoint("/v1/models")))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!(status = %resp.status(), "Anthropic health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Anthropic health check error");
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
