//! Vision provider trait and request/response types.
//!
//! Defines the interface every vision-model backend implements, plus the
//! factory that builds the right provider from CLI flags and config.

use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ConfigError};

/// Raw image bytes handed to a content analyzer.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and a format identifier
    /// ("jpeg", "png", "webp", ...).
    pub fn from_bytes(bytes: Vec<u8>, format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            bytes,
            media_type: media_type.to_string(),
        }
    }

    /// Sniff the format from the magic bytes.
    pub fn detect(bytes: Vec<u8>) -> Self {
        let format = image::guess_format(&bytes)
            .map(crate::engine::codec::format_to_string)
            .unwrap_or_else(|_| "jpeg".to_string());
        Self::from_bytes(bytes, &format)
    }

    /// Base64 encoding of the bytes (standard alphabet, padded).
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64())
    }
}

/// A request to classify an image.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// Base64 image payload
    pub image_data: String,
    pub media_type: String,
    /// Role instructions, sent separately from the prompt where the API allows
    pub system: Option<String>,
    /// Text prompt for the model
    pub prompt: String,
    /// The reply must be a single JSON object
    pub json_only: bool,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl VisionRequest {
    pub fn new(image: &ImageInput, prompt: impl Into<String>) -> Self {
        Self {
            image_data: image.base64(),
            media_type: image.media_type.clone(),
            system: None,
            prompt: prompt.into(),
            json_only: false,
            max_tokens: 600,
            temperature: 0.2,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Ask for a bare JSON object at near-deterministic temperature.
    pub fn json_only(mut self) -> Self {
        self.json_only = true;
        self.temperature = 0.0;
        self
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.image_data)
    }
}

/// The raw reply of a vision model.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all vision providers implement.
///
/// Uses `async_trait` so providers can live behind `Box<dyn VisionProvider>`.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logging (e.g., "anthropic", "ollama").
    fn name(&self) -> &str;

    /// Check whether the provider is configured and reachable.
    async fn is_available(&self) -> bool;

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse, AnalysisError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn missing_key(provider: &str, var: &str) -> ConfigError {
    ConfigError::ValidationError(format!("{provider} API key not set. Set {var} env var."))
}

/// Factory that creates the appropriate provider from CLI flags and config.
pub struct VisionProviderFactory;

impl VisionProviderFactory {
    /// Create a provider by name ("ollama", "anthropic", "openai", "hyperbolic").
    ///
    /// `model_override` replaces the model configured for that provider.
    pub fn create(
        provider: &str,
        config: &AnalysisConfig,
        model_override: Option<&str>,
    ) -> Result<Box<dyn VisionProvider>, ConfigError> {
        match provider {
            "ollama" => {
                let cfg = config.ollama.clone().unwrap_or_default();
                let model = model_override.unwrap_or(&cfg.model);
                Ok(Box::new(super::ollama::OllamaProvider::new(
                    &cfg.endpoint,
                    model,
                )))
            }
            "anthropic" => {
                let cfg = config.anthropic.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_key("Anthropic", "ANTHROPIC_API_KEY"))?;
                let model = model_override.unwrap_or(&cfg.model);
                Ok(Box::new(super::anthropic::AnthropicProvider::new(
                    &api_key, model,
                )))
            }
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_key("OpenAI", "OPENAI_API_KEY"))?;
                let model = model_override.unwrap_or(&cfg.model);
                Ok(Box::new(super::openai::OpenAiProvider::new(&api_key, model)))
            }
            "hyperbolic" => {
                let cfg = config.hyperbolic.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_key("Hyperbolic", "HYPERBOLIC_API_KEY"))?;
                let model = model_override.unwrap_or(&cfg.model);
                Ok(Box::new(super::hyperbolic::HyperbolicProvider::new(
                    &cfg.endpoint,
                    &api_key,
                    model,
                )))
            }
            other => Err(ConfigError::ValidationError(format!(
                "Unknown vision provider: {other}"
            ))),
        }
    }
}
