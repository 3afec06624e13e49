//! [`ContentAnalyzer`] backed by a remote or local vision model.

use async_trait::async_trait;

use super::parse::parse_analysis;
use super::provider::{ImageInput, VisionProvider, VisionRequest};
use super::ContentAnalyzer;
use crate::error::AnalysisError;
use crate::types::AnalysisResult;

const ANALYST_ROLE: &str = "You are a photo editing assistant. You judge photos for \
automatic color correction and reply with a single JSON object and nothing else.";

const ANALYSIS_PROMPT: &str = "Analyze this photo. Use exactly these fields:\n\
{\"image_type\": one of portrait, landscape, food, urban, architecture, street, night, \
product, document, general;\n\
\"confidence\": number 0-1;\n\
\"technical_quality\": {\"exposure\": 0-1, \"sharpness\": 0-1, \"composition\": 0-1, \
\"overall\": 0-1};\n\
\"detected_objects\": list of short lowercase nouns;\n\
\"mood\": one word such as warm, neutral, moody, dramatic, nostalgic, cheerful;\n\
\"suggested_improvements\": list of short imperative phrases;\n\
\"editing_intensity\": one of light, medium, heavy}";

/// Classifies images by prompting a [`VisionProvider`] for JSON.
pub struct VisionAnalyzer {
    provider: Box<dyn VisionProvider>,
}

impl VisionAnalyzer {
    pub fn new(provider: Box<dyn VisionProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn VisionProvider {
        self.provider.as_ref()
    }
}

#[async_trait]
impl ContentAnalyzer for VisionAnalyzer {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn analyze(&self, image: &ImageInput) -> Result<AnalysisResult, AnalysisError> {
        let request = VisionRequest::new(image, ANALYSIS_PROMPT)
            .with_system(ANALYST_ROLE)
            .json_only();
        let timeout = self.provider.timeout();

        let response = tokio::time::timeout(timeout, self.provider.generate(&request))
            .await
            .map_err(|_| {
                AnalysisError::transient(format!(
                    "{} timed out after {}ms",
                    self.provider.name(),
                    timeout.as_millis()
                ))
            })??;

        tracing::debug!(
            "{} ({}) replied in {}ms, tokens: {:?}",
            self.provider.name(),
            response.model,
            response.latency_ms,
            response.tokens_used
        );

        parse_analysis(&response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::provider::VisionResponse;
    use crate::error::AnalysisErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct ScriptedProvider {
        reply: Result<String, AnalysisError>,
        delay: Duration,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl VisionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(request.prompt.contains("technical_quality"));
            assert!(request.json_only);
            assert!(request.system.as_deref().is_some_and(|s| s.contains("JSON")));
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map(|text| VisionResponse {
                text,
                model: "scripted-1".to_string(),
                tokens_used: Some(42),
                latency_ms: 1,
            })
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }
    }

    fn analyzer(reply: Result<String, AnalysisError>, delay_ms: u64) -> (VisionAnalyzer, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = ScriptedProvider {
            reply,
            delay: Duration::from_millis(delay_ms),
            calls: calls.clone(),
        };
        (VisionAnalyzer::new(Box::new(provider)), calls)
    }

    fn image() -> ImageInput {
        ImageInput::from_bytes(vec![0xFF, 0xD8], "jpeg")
    }

    #[tokio::test]
    async fn test_parses_model_reply() {
        let reply = r#"Analysis: {"image_type": "portrait", "confidence": 0.9,
            "technical_quality": {"exposure": 0.5, "sharpness": 0.6, "composition": 0.7, "overall": 0.6},
            "detected_objects": ["person"], "mood": "warm"}"#;
        let (analyzer, calls) = analyzer(Ok(reply.to_string()), 0);

        let result = analyzer.analyze(&image()).await.unwrap();
        assert_eq!(result.image_type, "portrait");
        assert!(result.suggested_improvements.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(analyzer.name(), "scripted");
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let (analyzer, _) = analyzer(Err(AnalysisError::rate_limited("quota")), 0);
        let err = analyzer.analyze(&image()).await.unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_as_transient() {
        let (analyzer, _) = analyzer(Ok("{}".to_string()), 500);
        let err = analyzer.analyze(&image()).await.unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::Transient);
        assert!(err.message.contains("timed out"));
    }
}
