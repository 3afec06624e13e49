//! OpenAI vision provider using the Chat Completions API.
//!
//! The analyst role goes in a system message and the photo travels as a
//! low-detail data URL, which is plenty for judging exposure and mood.
//! JSON mode (`response_format`) is only sent to OpenAI itself; compatible
//! endpoints such as Hyperbolic do not all accept it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::provider::{VisionProvider, VisionRequest, VisionResponse};
use super::retry;
use crate::error::AnalysisError;

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    label: &'static str,
    json_mode: bool,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        let mut provider = Self::with_endpoint(
            api_key,
            model,
            "https://api.openai.com/v1/chat/completions",
            "openai",
        );
        provider.json_mode = true;
        provider
    }

    /// Create against any OpenAI-compatible endpoint.
    pub fn with_endpoint(api_key: &str, model: &str, endpoint: &str, label: &'static str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            label,
            json_mode: false,
        }
    }

    fn request_body(&self, request: &VisionRequest) -> AnalysisChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: vec![ChatPart::Text {
                    text: system.clone(),
                }],
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: vec![
                ChatPart::ImageUrl {
                    image_url: ImageUrl {
                        url: request.data_url(),
                        detail: "low",
                    },
                },
                ChatPart::Text {
                    text: request.prompt.clone(),
                },
            ],
        });

        AnalysisChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: (self.json_mode && request.json_only).then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Serialize)]
struct AnalysisChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ChatPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Deserialize)]
struct CompletionReply {
    choices: Vec<CompletionChoice>,
    model: String,
    usage: Option<CompletionUsage>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ReplyMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionUsage {
    total_tokens: u32,
}

#[async_trait]
impl VisionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        self.label
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse, AnalysisError> {
        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| retry::from_reqwest(self.label, &e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(retry::from_status(self.label, status.as_u16(), &text));
        }

        let reply: CompletionReply = resp.json().await.map_err(|e| {
            AnalysisError::unrecoverable(format!("Failed to parse {} response: {e}", self.label))
        })?;

        let choice = reply.choices.into_iter().next().ok_or_else(|| {
            AnalysisError::unrecoverable(format!("{} returned no choices", self.label))
        })?;
        // A reply cut off at max_tokens cannot hold a complete analysis object.
        if choice.finish_reason.as_deref() == Some("length") {
            return Err(AnalysisError::unrecoverable(format!(
                "{} analysis truncated at {} tokens",
                self.label, request.max_tokens
            )));
        }
        let text = choice
            .message
            .content
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AnalysisError::unrecoverable(format!("{} returned no content", self.label))
            })?;

        Ok(VisionResponse {
            text: text.trim().to_string(),
            model: reply.model,
            tokens_used: reply.usage.map(|u| u.total_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}
