//! Mock inference backend for deterministic testing.
//!
//! Vision calls answer `"Description of <image bytes as UTF-8>"` unless a
//! mapping is configured, so tests can use image payloads like `b"page-3"`
//! and predict every page's analysis. Per-image latency and failures let
//! tests force adversarial completion orders and degraded pages.
//!
//! ## Usage
//!
//! ```rust
//! use folio_inference::mock::MockInferenceBackend;
//!
//! let backend = MockInferenceBackend::new()
//!     .with_fixed_response("- Summary point")
//!     .with_image_latency_ms(b"page-1", 50)
//!     .with_image_failure(b"page-2", "vision model unavailable");
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use folio_core::{Error, GenerationBackend, Result, VisionBackend};

/// Mock inference backend for testing.
#[derive(Clone)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

#[derive(Debug, Clone, Default)]
struct MockConfig {
    model: String,
    default_response: String,
    generation_failure: Option<String>,
    image_responses: HashMap<Vec<u8>, String>,
    image_failures: HashMap<Vec<u8>, String>,
    image_latency_ms: HashMap<Vec<u8>, u64>,
    latency_ms: u64,
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Generate { system: String, prompt: String },
    DescribeImage { image: Vec<u8>, prompt: Option<String> },
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInferenceBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig {
                model: "mock-model".to_string(),
                default_response: "Mock response".to_string(),
                ..MockConfig::default()
            }),
            call_log: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the response for generation requests.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Make every generation request fail.
    pub fn with_generation_failure(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).generation_failure = Some(message.into());
        self
    }

    /// Answer a specific image with a fixed description.
    pub fn with_image_response(mut self, image: &[u8], response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .image_responses
            .insert(image.to_vec(), response.into());
        self
    }

    /// Fail the description of a specific image.
    pub fn with_image_failure(mut self, image: &[u8], message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .image_failures
            .insert(image.to_vec(), message.into());
        self
    }

    /// Delay the description of a specific image.
    pub fn with_image_latency_ms(mut self, image: &[u8], latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config)
            .image_latency_ms
            .insert(image.to_vec(), latency_ms);
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls().clone()
    }

    /// Prompts of every generation call, in call order.
    pub fn generate_prompts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                MockCall::Generate { prompt, .. } => Some(prompt.clone()),
                MockCall::DescribeImage { .. } => None,
            })
            .collect()
    }

    /// Number of image description calls.
    pub fn describe_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, MockCall::DescribeImage { .. }))
            .count()
    }

    /// Highest number of image description calls observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn calls(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: MockCall) {
        self.calls().push(call);
    }
}

/// Decrements the in-flight counter when a call finishes, even on cancellation.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationBackend for MockInferenceBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.record(MockCall::Generate {
            system: system.to_string(),
            prompt: prompt.to_string(),
        });

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        match &self.config.generation_failure {
            Some(message) => Err(Error::Inference(message.clone())),
            None => Ok(self.config.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl VisionBackend for MockInferenceBackend {
    async fn describe_image(
        &self,
        image_data: &[u8],
        _mime_type: &str,
        prompt: Option<&str>,
    ) -> Result<String> {
        self.record(MockCall::DescribeImage {
            image: image_data.to_vec(),
            prompt: prompt.map(str::to_string),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let latency = self
            .config
            .image_latency_ms
            .get(image_data)
            .copied()
            .unwrap_or(self.config.latency_ms);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if let Some(message) = self.config.image_failures.get(image_data) {
            return Err(Error::Inference(message.clone()));
        }

        Ok(self
            .config
            .image_responses
            .get(image_data)
            .cloned()
            .unwrap_or_else(|| {
                format!("Description of {}", String::from_utf8_lossy(image_data))
            }))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
