//! Anthropic vision provider using the Messages API with base64 image blocks.
//!
//! The Messages API has no JSON mode, so a JSON-only request pre-fills the
//! assistant turn with `{` and the reply is stitched back onto it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::provider::{VisionProvider, VisionRequest, VisionResponse};
use super::retry;
use crate::error::AnalysisError;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const JSON_PREFILL: &str = "{";

/// Anthropic provider using the Messages API.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, request: &VisionRequest) -> AnalysisMessages {
        let mut messages = vec![Turn {
            role: "user",
            content: vec![
                Block::Image {
                    source: Base64Source {
                        kind: "base64",
                        media_type: request.media_type.clone(),
                        data: request.image_data.clone(),
                    },
                },
                Block::Text {
                    text: request.prompt.clone(),
                },
            ],
        }];
        if request.json_only {
            messages.push(Turn {
                role: "assistant",
                content: vec![Block::Text {
                    text: JSON_PREFILL.to_string(),
                }],
            });
        }

        AnalysisMessages {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            system: request.system.clone(),
            temperature: request.temperature,
            messages,
        }
    }
}

#[derive(Serialize)]
struct AnalysisMessages {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f32,
    messages: Vec<Turn>,
}

#[derive(Serialize)]
struct Turn {
    role: &'static str,
    content: Vec<Block>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Image { source: Base64Source },
    Text { text: String },
}

#[derive(Serialize)]
struct Base64Source {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesReply {
    content: Vec<ReplyBlock>,
    model: String,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: ReplyUsage,
}

#[derive(Deserialize)]
struct ReplyBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ReplyUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Join the reply's text blocks, restoring the pre-filled `{` if one was sent.
fn reply_text(request: &VisionRequest, blocks: Vec<ReplyBlock>) -> String {
    let text: String = blocks.into_iter().filter_map(|b| b.text).collect();
    let text = text.trim();
    if request.json_only && !text.is_empty() && !text.starts_with('{') {
        format!("{JSON_PREFILL}{text}")
    } else {
        text.to_string()
    }
}

#[async_trait]
impl VisionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse, AnalysisError> {
        let start = Instant::now();

        let resp = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(request))
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| retry::from_reqwest("anthropic", &e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(retry::from_status("anthropic", status.as_u16(), &text));
        }

        let reply: MessagesReply = resp.json().await.map_err(|e| {
            AnalysisError::unrecoverable(format!("Failed to parse Anthropic response: {e}"))
        })?;

        if reply.stop_reason.as_deref() == Some("max_tokens") {
            return Err(AnalysisError::unrecoverable(format!(
                "anthropic analysis truncated at {} tokens",
                request.max_tokens
            )));
        }

        let text = reply_text(request, reply.content);
        if text.is_empty() {
            return Err(AnalysisError::unrecoverable(
                "Anthropic returned no text content",
            ));
        }

        Ok(VisionResponse {
            text,
            model: reply.model,
            tokens_used: Some(reply.usage.input_tokens + reply.usage.output_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}
