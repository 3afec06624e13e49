//! Content analysis: the collaborator that classifies an image.
//!
//! Analyzers sit behind the [`ContentAnalyzer`] trait so the orchestrator
//! can drive a vision model (OpenAI, Anthropic, Ollama, Hyperbolic), the
//! offline pixel-statistics analyzer, or a fixed result interchangeably.

mod anthropic;
mod fixed;
mod hyperbolic;
mod local;
mod ollama;
mod openai;
pub mod parse;
pub mod provider;
pub mod retry;
mod vision;

pub use fixed::StaticAnalyzer;
pub use local::{analysis_from_metrics, LocalAnalyzer};
pub use provider::{ImageInput, VisionProvider, VisionProviderFactory, VisionRequest, VisionResponse};
pub use vision::VisionAnalyzer;

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::types::AnalysisResult;

/// Classifies an image into an [`AnalysisResult`].
///
/// Failures carry an [`AnalysisErrorKind`](crate::error::AnalysisErrorKind)
/// that tells the orchestrator whether to retry, defer, or fail.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    /// Analyzer name for logging.
    fn name(&self) -> &str;

    async fn analyze(&self, image: &ImageInput) -> Result<AnalysisResult, AnalysisError>;
}
