//! Image records and their status machine.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::color::TransformOptions;
use crate::engine::{EnhancedImage, OutputFormat};
use crate::quality::QualityComparison;
use crate::types::{AnalysisResult, EditingConfig, ImageId, Locator};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Processing status of an image.
///
/// ```text
/// uploaded -> analyzing -> analyzed -> processing -> processed
///                 \                        \
///                  `-> failed               `-> failed
/// ```
/// Any status returns to `uploaded` through an explicit retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Uploaded,
    Analyzing,
    Analyzed,
    Processing,
    Processed,
    Failed,
}

impl ImageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageStatus::Uploaded => "uploaded",
            ImageStatus::Analyzing => "analyzing",
            ImageStatus::Analyzed => "analyzed",
            ImageStatus::Processing => "processing",
            ImageStatus::Processed => "processed",
            ImageStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ImageStatus::Processed | ImageStatus::Failed)
    }
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was written for a processed image, without the pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementSummary {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub options: TransformOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_id: Option<String>,
}

impl From<&EnhancedImage> for EnhancementSummary {
    fn from(image: &EnhancedImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            format: image.format,
            options: image.options,
            preset_id: image.preset_id.clone(),
        }
    }
}

/// The persisted unit of work for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub status: ImageStatus,
    /// BLAKE3 hex digest of the original bytes
    pub content_hash: String,
    pub original: Locator,
    #[serde(default)]
    pub processed: Option<Locator>,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub editing_config: Option<EditingConfig>,
    #[serde(default)]
    pub enhancement: Option<EnhancementSummary>,
    #[serde(default)]
    pub quality: Option<QualityComparison>,
    #[serde(default)]
    pub error: Option<String>,
    /// Analysis attempts since the last retry, across deferrals
    #[serde(default)]
    pub analysis_attempts: u32,
    /// Earliest time another analysis attempt may start
    #[serde(default)]
    pub retry_after_ms: Option<u64>,
    /// Incremented on every committed write
    pub revision: u64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl ImageRecord {
    pub fn new(id: ImageId, content_hash: String, original: Locator) -> Self {
        let now = now_ms();
        Self {
            id,
            status: ImageStatus::Uploaded,
            content_hash,
            original,
            processed: None,
            analysis: None,
            editing_config: None,
            enhancement: None,
            quality: None,
            error: None,
            analysis_attempts: 0,
            retry_after_ms: None,
            revision: 0,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    /// Move to `failed` with a reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = ImageStatus::Failed;
        self.error = Some(reason.into());
    }

    /// Reset to `uploaded`, discarding everything derived from the original.
    ///
    /// Returns the processed locator that was dropped, if any.
    pub fn reset(&mut self) -> Option<Locator> {
        self.status = ImageStatus::Uploaded;
        self.analysis = None;
        self.editing_config = None;
        self.enhancement = None;
        self.quality = None;
        self.error = None;
        self.analysis_attempts = 0;
        self.retry_after_ms = None;
        self.processed.take()
    }

    /// Whether analysis is held back until `retry_after_ms`.
    pub fn is_deferred(&self, now_ms: u64) -> bool {
        self.retry_after_ms.is_some_and(|after| after > now_ms)
    }
}

/// Outcome of one [`evaluate`](super::Orchestrator::evaluate) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Analysis stored; status `analyzed`
    Analyzed,
    /// Editing config stored; status stays `analyzed`
    Configured,
    /// Enhanced output stored; status `processed`
    Processed,
    /// Status moved to `failed`
    Failed(String),
    /// Analysis deferred; record back at `uploaded` until `retry_after_ms`
    RetryLater { retry_after_ms: u64 },
    /// Too early to retry analysis
    Deferred { retry_after_ms: u64 },
    /// Nothing to do (terminal, or the stage is already in flight)
    Idle,
}

impl Transition {
    /// Whether another `evaluate` could make progress right away.
    pub fn can_continue(&self) -> bool {
        matches!(self, Transition::Analyzed | Transition::Configured)
    }
}
