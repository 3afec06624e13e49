//! Offline analyzer: technical quality from pixel statistics, no network.

use async_trait::async_trait;
use std::sync::Arc;

use super::provider::ImageInput;
use super::ContentAnalyzer;
use crate::engine::{BitmapCodec, ImageCodec};
use crate::error::AnalysisError;
use crate::quality::{self, QualityMetrics};
use crate::types::{AnalysisResult, EditingIntensity, TechnicalQuality};

/// Derives an [`AnalysisResult`] from [`QualityMetrics`].
///
/// Scene and mood are unknown offline, so they are reported as `general`
/// and `neutral`, which routes preset selection to the default look.
#[derive(Clone)]
pub struct LocalAnalyzer {
    codec: Arc<dyn BitmapCodec>,
}

impl Default for LocalAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(ImageCodec::default()))
    }
}

impl LocalAnalyzer {
    pub fn new(codec: Arc<dyn BitmapCodec>) -> Self {
        Self { codec }
    }
}

/// Map measured metrics onto the analysis contract.
pub fn analysis_from_metrics(metrics: &QualityMetrics) -> AnalysisResult {
    let overall = metrics.overall();

    let mut improvements = Vec::new();
    if metrics.exposure() < 0.5 {
        improvements.push("Increase brightness to lift underexposed areas".to_string());
    }
    if metrics.contrast() < 0.35 {
        improvements.push("Increase contrast for more depth".to_string());
    }
    if metrics.color_balance() < 0.75 {
        improvements.push("Correct color balance".to_string());
    }
    if metrics.sharpness() < 0.2 {
        improvements.push("Improve clarity and sharpness".to_string());
    }

    let editing_intensity = if overall < 0.4 {
        EditingIntensity::Heavy
    } else if overall < 0.7 {
        EditingIntensity::Medium
    } else {
        EditingIntensity::Light
    };

    AnalysisResult {
        image_type: "general".to_string(),
        confidence: 0.5,
        technical_quality: TechnicalQuality {
            exposure: metrics.exposure(),
            sharpness: metrics.sharpness(),
            composition: 0.5,
            overall,
        },
        detected_objects: Vec::new(),
        mood: "neutral".to_string(),
        suggested_improvements: improvements,
        editing_intensity,
    }
}

#[async_trait]
impl ContentAnalyzer for LocalAnalyzer {
    fn name(&self) -> &str {
        "local"
    }

    async fn analyze(&self, image: &ImageInput) -> Result<AnalysisResult, AnalysisError> {
        let codec = self.codec.clone();
        let bytes = image.bytes.clone();

        let metrics = tokio::task::spawn_blocking(move || {
            codec.decode(&bytes).map(|decoded| quality::analyze(&decoded.buffer))
        })
        .await
        .map_err(|e| AnalysisError::transient(format!("local analysis task failed: {e}")))?
        .map_err(|e| AnalysisError::unrecoverable(e.to_string()))?;

        Ok(analysis_from_metrics(&metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Pixel;
    use crate::engine::PixelBuffer;
    use crate::error::AnalysisErrorKind;
    use crate::test_support::{gradient, png_bytes};

    #[test]
    fn test_dark_flat_image_gets_brightness_hint() {
        let dark = PixelBuffer::from_fn(16, 16, |_, _| Pixel::gray(10));
        let result = analysis_from_metrics(&quality::analyze(&dark));

        assert_eq!(result.image_type, "general");
        assert_eq!(result.mood, "neutral");
        assert_eq!(result.editing_intensity, EditingIntensity::Medium);
        assert!(result
            .suggested_improvements
            .iter()
            .any(|s| s.contains("brightness")));
        assert!(result.validate().is_ok());
    }

    #[tokio::test]
    async fn test_analyze_decodes_and_scores() {
        let analyzer = LocalAnalyzer::default();
        let image = ImageInput::detect(png_bytes(&gradient(32, 32)));
        let result = analyzer.analyze(&image).await.unwrap();
        assert!(result.validate().is_ok());
        assert_eq!(result.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_unrecoverable() {
        let analyzer = LocalAnalyzer::default();
        let err = analyzer
            .analyze(&ImageInput::from_bytes(b"garbage".to_vec(), "png"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::Unrecoverable);
    }
}
