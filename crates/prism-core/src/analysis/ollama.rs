//! Ollama vision provider for local model inference.
//!
//! Talks to a local Ollama instance via `/api/generate`, in JSON mode when
//! the request asks for a bare object.
//! No authentication required.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::provider::{VisionProvider, VisionRequest, VisionResponse};
use super::retry;
use crate::error::AnalysisError;

/// Ollama provider for local vision model inference.
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Ollama /api/generate request body.
#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    prompt: String,
    images: Vec<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama /api/generate response.
#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
}

#[async_trait]
impl VisionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse, AnalysisError> {
        let url = format!("{}/api/generate", self.endpoint);
        let start = Instant::now();

        let body = OllamaRequest {
            model: self.model.clone(),
            system: request.system.clone(),
            prompt: request.prompt.clone(),
            images: vec![request.image_data.clone()],
            stream: false,
            format: request.json_only.then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| retry::from_reqwest("ollama", &e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(retry::from_status("ollama", status.as_u16(), &text));
        }

        let ollama_resp: OllamaResponse = resp.json().await.map_err(|e| {
            AnalysisError::unrecoverable(format!("Failed to parse Ollama response: {e}"))
        })?;

        let text = ollama_resp.response.trim().to_string();
        if text.is_empty() {
            return Err(AnalysisError::unrecoverable("Ollama returned empty response"));
        }

        let tokens_used = match (ollama_resp.prompt_eval_count, ollama_resp.eval_count) {
            (Some(p), Some(e)) => Some(p + e),
            (p, e) => p.or(e),
        };

        Ok(VisionResponse {
            text,
            model: self.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        // Vision models running locally can be slow
        Duration::from_secs(120)
    }
}
