//! Hyperbolic vision provider (OpenAI-compatible API).

use async_trait::async_trait;
use std::time::Duration;

use super::openai::OpenAiProvider;
use super::provider::{VisionProvider, VisionRequest, VisionResponse};
use crate::error::AnalysisError;

/// Hyperbolic provider wrapping an OpenAI-compatible endpoint.
pub struct HyperbolicProvider {
    inner: OpenAiProvider,
}

impl HyperbolicProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        let url = format!("{}/chat/completions", endpoint.trim_end_matches('/'));
        Self {
            inner: OpenAiProvider::with_endpoint(api_key, model, &url, "hyperbolic"),
        }
    }
}

#[async_trait]
impl VisionProvider for HyperbolicProvider {
    fn name(&self) -> &str {
        "hyperbolic"
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse, AnalysisError> {
        self.inner.generate(request).await
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }
}
