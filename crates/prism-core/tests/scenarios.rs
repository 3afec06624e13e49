//! End-to-end scenarios against the public API.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use prism_core::analysis::ImageInput;
use prism_core::color::pixel::{contrast, gamma};
use prism_core::engine::planner::plan_strength;
use prism_core::engine::{BitmapCodec, ImageCodec};
use prism_core::error::{AnalysisError, StorageError};
use prism_core::storage::{BlobStore, MemoryBlobStore, MemoryRecordStore};
use prism_core::types::{EditingIntensity, TechnicalQuality};
use prism_core::{
    recommend_filters, AnalysisResult, ContentAnalyzer, EnhancementEngine, ImageId, ImageStatus,
    Locator, Orchestrator, OutputFormat, Pixel, PixelBuffer, StaticAnalyzer,
};

fn portrait(overall: f64) -> AnalysisResult {
    AnalysisResult {
        image_type: "portrait".into(),
        confidence: 0.9,
        technical_quality: TechnicalQuality {
            exposure: 0.4,
            sharpness: 0.3,
            composition: 0.5,
            overall,
        },
        detected_objects: vec!["person".into()],
        mood: "neutral".into(),
        suggested_improvements: Vec::new(),
        editing_intensity: EditingIntensity::Medium,
    }
}

fn photo_bytes() -> Vec<u8> {
    let buffer = PixelBuffer::from_fn(16, 12, |x, y| {
        Pixel::rgb((x * 15) as u8, (y * 20) as u8, ((x + y) * 9) as u8)
    });
    ImageCodec::default()
        .encode(&buffer, OutputFormat::Png)
        .unwrap()
}

/// Counts output writes so a repeated enhancement would show up.
#[derive(Default)]
struct CountingBlobs {
    inner: MemoryBlobStore,
    puts: AtomicU32,
}

#[async_trait]
impl BlobStore for CountingBlobs {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<Locator, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, bytes).await
    }

    async fn get(&self, locator: &Locator) -> Result<Vec<u8>, StorageError> {
        self.inner.get(locator).await
    }

    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        self.inner.delete(locator).await
    }
}

/// Fails every call with an unrecoverable error.
struct BrokenAnalyzer;

#[async_trait]
impl ContentAnalyzer for BrokenAnalyzer {
    fn name(&self) -> &str {
        "broken"
    }

    async fn analyze(&self, _image: &ImageInput) -> Result<AnalysisResult, AnalysisError> {
        Err(AnalysisError::unrecoverable("model refused the image"))
    }
}

#[test]
fn low_quality_neutral_portrait_gets_soft_filter() {
    let analysis = portrait(0.3);
    let recs = recommend_filters(&analysis);
    assert!(recs[0].filter_id.contains("soft"), "top was {}", recs[0].filter_id);

    let strength = plan_strength(&analysis);
    assert!((0.8..=0.9).contains(&strength), "strength {strength}");
}

#[test]
fn mid_gray_is_a_contrast_fixed_point() {
    let gray = Pixel::rgb(128, 128, 128);
    assert_eq!(contrast(gray, 50.0), gray);
}

#[test]
fn gamma_keeps_endpoints() {
    assert_eq!(gamma(Pixel::rgb(255, 255, 255), 2.0), Pixel::rgb(255, 255, 255));
    assert_eq!(gamma(Pixel::rgb(0, 0, 0), 2.0), Pixel::rgb(0, 0, 0));
}

#[tokio::test]
async fn retry_on_failed_image_resets_to_uploaded() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let orchestrator = Orchestrator::new(
        Arc::new(MemoryRecordStore::new()),
        blobs.clone(),
        Arc::new(BrokenAnalyzer),
        EnhancementEngine::default(),
    );
    let id = ImageId::new("selfie");
    orchestrator.submit(id.clone(), &photo_bytes()).await.unwrap();

    let failed = orchestrator.drive(&id).await.unwrap();
    assert_eq!(failed.status, ImageStatus::Failed);
    assert!(failed.error.as_deref().unwrap_or_default().contains("refused"));

    let reset = orchestrator.retry(&id).await.unwrap();
    assert_eq!(reset.status, ImageStatus::Uploaded);
    assert!(reset.analysis.is_none());
    assert!(reset.editing_config.is_none());
    assert!(reset.processed.is_none());
    assert!(reset.error.is_none());
    assert!(reset.revision > failed.revision);
}

#[tokio::test]
async fn enhancement_runs_once_for_repeated_evaluations() {
    let outputs = Arc::new(CountingBlobs::default());
    let orchestrator = Orchestrator::new(
        Arc::new(MemoryRecordStore::new()),
        outputs.clone(),
        Arc::new(StaticAnalyzer::new(portrait(0.6))),
        EnhancementEngine::default(),
    );
    let id = ImageId::new("studio");
    orchestrator.submit(id.clone(), &photo_bytes()).await.unwrap();
    let originals_written = outputs.puts.load(Ordering::SeqCst);

    // Analyze, then configure.
    orchestrator.evaluate(&id).await.unwrap();
    orchestrator.evaluate(&id).await.unwrap();
    let configured = orchestrator.record(&id).await.unwrap();
    assert_eq!(configured.status, ImageStatus::Analyzed);
    assert!(configured.editing_config.is_some());

    let (a, b) = tokio::join!(orchestrator.evaluate(&id), orchestrator.evaluate(&id));
    a.unwrap();
    b.unwrap();
    orchestrator.evaluate(&id).await.unwrap();

    let done = orchestrator.record(&id).await.unwrap();
    assert_eq!(done.status, ImageStatus::Processed);
    assert_eq!(outputs.puts.load(Ordering::SeqCst), originals_written + 1);
}

#[tokio::test]
async fn processed_output_decodes_at_original_size() {
    let outputs = Arc::new(MemoryBlobStore::new());
    let orchestrator = Orchestrator::new(
        Arc::new(MemoryRecordStore::new()),
        outputs.clone(),
        Arc::new(StaticAnalyzer::new(portrait(0.6))),
        EnhancementEngine::default(),
    );
    let id = ImageId::new("garden");
    orchestrator.submit(id.clone(), &photo_bytes()).await.unwrap();

    let record = orchestrator.drive(&id).await.unwrap();
    let locator = record.processed.expect("processed locator");
    let bytes = outputs.get(&locator).await.unwrap();
    let decoded = ImageCodec::default().decode(&bytes).unwrap();
    assert_eq!((decoded.buffer.width, decoded.buffer.height), (16, 12));
    assert!(record.quality.is_some());
}
