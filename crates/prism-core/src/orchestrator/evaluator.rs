//! The idempotent per-image evaluator.
//!
//! [`Orchestrator::evaluate`] reads an image record, applies at most one
//! step of the status machine, and commits the result. A per-process
//! in-flight set keyed by image id makes concurrent or repeated calls
//! safe: a second caller sees [`Transition::Idle`] while a step runs, and
//! a finished step leaves a status that does not re-trigger it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::state::{now_ms, EnhancementSummary, ImageRecord, ImageStatus, Transition};
use crate::analysis::retry::{backoff_duration, is_retryable};
use crate::analysis::{ContentAnalyzer, ImageInput};
use crate::cache::AnalysisCache;
use crate::config::Config;
use crate::engine::{Adjustment, ConfigPlanner, EnhancedImage, EnhancementEngine};
use crate::error::{AnalysisError, AnalysisErrorKind, EngineError, PrismError, Result, StorageError};
use crate::hash::content_hash;
use crate::quality::{self, QualityComparison};
use crate::storage::{BlobStore, RecordStore};
use crate::types::{AnalysisResult, ImageId};

/// Timeouts and retry policy.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub analysis_timeout: Duration,
    pub enhance_timeout: Duration,
    /// In-place retries for transient analysis failures
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Analysis rounds (across deferrals) before the image is failed
    pub max_analysis_attempts: u32,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            analysis_timeout: config.analysis_timeout(),
            enhance_timeout: config.enhance_timeout(),
            retry_attempts: config.pipeline.retry_attempts,
            retry_delay_ms: config.pipeline.retry_delay_ms,
            max_analysis_attempts: config.pipeline.max_analysis_attempts,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of driving one image to rest.
#[derive(Debug)]
pub struct DriveOutcome {
    pub id: ImageId,
    pub result: Result<ImageRecord>,
}

impl DriveOutcome {
    pub fn status(&self) -> Option<ImageStatus> {
        self.result.as_ref().ok().map(|r| r.status)
    }
}

type InFlightSet = Arc<Mutex<HashSet<ImageId>>>;

/// Removes the id from the in-flight set when the step ends, even on panic.
struct InFlightGuard {
    set: InFlightSet,
    id: ImageId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

enum AnalysisFailure {
    TimedOut(u64),
    Error(AnalysisError),
}

/// Sequences analysis, configuration, and enhancement for stored images.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct Orchestrator {
    records: Arc<dyn RecordStore>,
    outputs: Arc<dyn BlobStore>,
    originals: Arc<dyn BlobStore>,
    analyzer: Arc<dyn ContentAnalyzer>,
    engine: EnhancementEngine,
    planner: ConfigPlanner,
    cache: Option<Arc<AnalysisCache>>,
    settings: OrchestratorSettings,
    in_flight: InFlightSet,
}

impl Orchestrator {
    /// Originals and outputs share `blobs` unless
    /// [`with_original_store`](Self::with_original_store) is used.
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        analyzer: Arc<dyn ContentAnalyzer>,
        engine: EnhancementEngine,
    ) -> Self {
        let planner = ConfigPlanner::new(*engine.catalog());
        Self {
            records,
            originals: blobs.clone(),
            outputs: blobs,
            analyzer,
            engine,
            planner,
            cache: None,
            settings: OrchestratorSettings::default(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_planner(mut self, planner: ConfigPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_cache(mut self, cache: Option<Arc<AnalysisCache>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_original_store(mut self, originals: Arc<dyn BlobStore>) -> Self {
        self.originals = originals;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    pub fn outputs(&self) -> &dyn BlobStore {
        self.outputs.as_ref()
    }

    /// Create the record for a new image in `uploaded`.
    ///
    /// Submitting an id that already exists returns the stored record
    /// untouched.
    pub async fn submit(&self, id: ImageId, bytes: &[u8]) -> Result<ImageRecord> {
        if let Some(existing) = self.records.get(&id).await? {
            tracing::debug!("Image {id} already submitted ({})", existing.status);
            return Ok(existing);
        }
        let hash = content_hash(bytes);
        let original = self.originals.put(&format!("originals/{id}"), bytes).await?;
        self.commit(ImageRecord::new(id, hash, original)).await
    }

    /// Current record for `id`.
    pub async fn record(&self, id: &ImageId) -> Result<ImageRecord> {
        self.records
            .get(id)
            .await?
            .ok_or_else(|| PrismError::NotFound(id.clone()))
    }

    /// Apply at most one step of the status machine.
    pub async fn evaluate(&self, id: &ImageId) -> Result<Transition> {
        let Some(_guard) = self.claim(id) else {
            tracing::debug!("Image {id} has a stage in flight, skipping");
            return Ok(Transition::Idle);
        };

        let record = self.record(id).await?;
        match record.status {
            ImageStatus::Processed | ImageStatus::Failed => Ok(Transition::Idle),
            ImageStatus::Uploaded | ImageStatus::Analyzing => self.analyze_stage(record).await,
            ImageStatus::Analyzed if record.editing_config.is_none() => {
                self.configure_stage(record).await
            }
            ImageStatus::Analyzed | ImageStatus::Processing => self.enhance_stage(record).await,
        }
    }

    /// Evaluate until the image rests (terminal, deferred, or in flight).
    pub async fn drive(&self, id: &ImageId) -> Result<ImageRecord> {
        loop {
            let transition = self.evaluate(id).await?;
            if !transition.can_continue() {
                break;
            }
        }
        self.record(id).await
    }

    /// Reset an image to `uploaded`, deleting any processed output.
    pub async fn retry(&self, id: &ImageId) -> Result<ImageRecord> {
        let Some(_guard) = self.claim(id) else {
            return Err(PrismError::InFlight(id.clone()));
        };

        let mut record = self.record(id).await?;
        let previous = record.status;
        if let Some(processed) = record.reset() {
            self.outputs.delete(&processed).await?;
        }
        if let Some(cache) = &self.cache {
            cache.remove(&record.content_hash);
        }
        tracing::info!("Retrying image {id} (was {previous})");
        self.commit(record).await
    }

    fn claim(&self, id: &ImageId) -> Option<InFlightGuard> {
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        set.insert(id.clone()).then(|| InFlightGuard {
            set: self.in_flight.clone(),
            id: id.clone(),
        })
    }

    /// Write, then re-read and check the revision landed.
    async fn commit(&self, mut record: ImageRecord) -> Result<ImageRecord> {
        record.revision += 1;
        record.updated_at_ms = now_ms();
        self.records.put(&record).await?;

        let found = self.records.get(&record.id).await?.map(|r| r.revision);
        if found != Some(record.revision) {
            return Err(StorageError::Unconfirmed {
                id: record.id.clone(),
                expected: record.revision,
                found,
            }
            .into());
        }
        tracing::debug!(
            "Image {} is {} (revision {})",
            record.id,
            record.status,
            record.revision
        );
        Ok(record)
    }

    async fn fail(&self, mut record: ImageRecord, reason: String) -> Result<Transition> {
        tracing::error!("Image {} failed: {reason}", record.id);
        record.fail(reason.clone());
        self.commit(record).await?;
        Ok(Transition::Failed(reason))
    }

    /// Original bytes, or `None` if the blob is gone.
    async fn fetch_original(&self, record: &ImageRecord) -> Result<Option<Vec<u8>>> {
        match self.originals.get(&record.original).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn analyze_stage(&self, mut record: ImageRecord) -> Result<Transition> {
        if record.status == ImageStatus::Uploaded {
            if let Some(retry_after_ms) = record.retry_after_ms.filter(|&t| t > now_ms()) {
                return Ok(Transition::Deferred { retry_after_ms });
            }
            record.status = ImageStatus::Analyzing;
            record.retry_after_ms = None;
            record = self.commit(record).await?;
        } else {
            tracing::info!("Resuming interrupted analysis of {}", record.id);
        }

        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&record.content_hash)) {
            tracing::debug!("Analysis cache hit for {}", record.id);
            return self.store_analysis(record, hit).await;
        }

        let Some(bytes) = self.fetch_original(&record).await? else {
            let reason = format!("original blob {} is missing", record.original);
            return self.fail(record, reason).await;
        };
        let image = ImageInput::detect(bytes);
        record.analysis_attempts += 1;

        match self.call_analyzer(&image).await {
            Ok(result) => {
                if let Some(cache) = &self.cache {
                    cache.insert(&record.content_hash, result.clone());
                }
                self.store_analysis(record, result).await
            }
            Err(AnalysisFailure::TimedOut(ms)) => {
                self.fail(record, format!("Timeout in analysis stage after {ms}ms"))
                    .await
            }
            Err(AnalysisFailure::Error(e)) if e.kind == AnalysisErrorKind::Unrecoverable => {
                self.fail(record, e.to_string()).await
            }
            Err(AnalysisFailure::Error(e)) => {
                let attempts = record.analysis_attempts;
                if attempts >= self.settings.max_analysis_attempts {
                    let reason = format!("analysis gave up after {attempts} attempts: {e}");
                    return self.fail(record, reason).await;
                }
                let delay = backoff_duration(attempts - 1, self.settings.retry_delay_ms);
                let retry_after_ms = now_ms() + delay.as_millis() as u64;
                tracing::warn!(
                    "Analysis of {} deferred for {delay:?} ({e})",
                    record.id
                );
                record.status = ImageStatus::Uploaded;
                record.retry_after_ms = Some(retry_after_ms);
                record.error = Some(e.to_string());
                self.commit(record).await?;
                Ok(Transition::RetryLater { retry_after_ms })
            }
        }
    }

    /// Call the analyzer, retrying transient failures in place.
    async fn call_analyzer(
        &self,
        image: &ImageInput,
    ) -> std::result::Result<AnalysisResult, AnalysisFailure> {
        let timeout = self.settings.analysis_timeout;
        let mut attempt = 0;
        loop {
            match tokio::time::timeout(timeout, self.analyzer.analyze(image)).await {
                Err(_) => return Err(AnalysisFailure::TimedOut(timeout.as_millis() as u64)),
                Ok(Ok(result)) => {
                    result.validate().map_err(AnalysisFailure::Error)?;
                    return Ok(result);
                }
                Ok(Err(e)) if is_retryable(&e) && attempt < self.settings.retry_attempts => {
                    let delay = backoff_duration(attempt, self.settings.retry_delay_ms);
                    attempt += 1;
                    tracing::warn!(
                        "{} analysis failed ({e}), retry {attempt}/{} in {delay:?}",
                        self.analyzer.name(),
                        self.settings.retry_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(Err(e)) => return Err(AnalysisFailure::Error(e)),
            }
        }
    }

    async fn store_analysis(
        &self,
        mut record: ImageRecord,
        analysis: AnalysisResult,
    ) -> Result<Transition> {
        record.analysis = Some(analysis);
        record.status = ImageStatus::Analyzed;
        record.retry_after_ms = None;
        record.error = None;
        self.commit(record).await?;
        Ok(Transition::Analyzed)
    }

    async fn configure_stage(&self, mut record: ImageRecord) -> Result<Transition> {
        let Some(analysis) = record.analysis.clone() else {
            return self
                .fail(record, "analyzed image has no analysis".to_string())
                .await;
        };
        let config = self.planner.plan_or_default(&analysis);
        tracing::debug!(
            "Planned {} steps for {} ({}, strength {:.2})",
            config.steps.len(),
            record.id,
            config.style,
            config.strength
        );
        record.editing_config = Some(config);
        self.commit(record).await?;
        Ok(Transition::Configured)
    }

    async fn enhance_stage(&self, mut record: ImageRecord) -> Result<Transition> {
        let Some(analysis) = record.analysis.clone() else {
            return self
                .fail(record, "image reached enhancement without analysis".to_string())
                .await;
        };

        let config = match record.editing_config.clone() {
            Some(config) => config,
            None => {
                let config = self.planner.plan_or_default(&analysis);
                record.editing_config = Some(config.clone());
                config
            }
        };

        if record.status == ImageStatus::Analyzed {
            record.status = ImageStatus::Processing;
            record = self.commit(record).await?;
        } else {
            tracing::info!("Resuming interrupted enhancement of {}", record.id);
        }

        let Some(bytes) = self.fetch_original(&record).await? else {
            let reason = format!("original blob {} is missing", record.original);
            return self.fail(record, reason).await;
        };

        let engine = self.engine.clone();
        let timeout = self.settings.enhance_timeout;
        let task = tokio::task::spawn_blocking(
            move || -> std::result::Result<(EnhancedImage, QualityComparison), EngineError> {
                let output = engine.process(&bytes, Some(&analysis), &Adjustment::Config(config))?;
                let comparison = quality::compare_buffers(&output.before, &output.after);
                Ok((output.image, comparison))
            },
        );

        let (image, comparison) = match tokio::time::timeout(timeout, task).await {
            Err(_) => {
                let err = EngineError::Timeout {
                    stage: "enhance".to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                };
                return self.fail(record, err.to_string()).await;
            }
            Ok(Err(join)) => {
                let err = EngineError::Task(join.to_string());
                return self.fail(record, err.to_string()).await;
            }
            Ok(Ok(Err(e))) => return self.fail(record, e.to_string()).await,
            Ok(Ok(Ok(done))) => done,
        };

        let key = format!("{}.{}", record.id, image.format.extension());
        let locator = match self.outputs.put(&key, &image.bytes).await {
            Ok(locator) => locator,
            Err(e) => return self.fail(record, format!("failed to store output: {e}")).await,
        };

        if !comparison.degradations.is_empty() {
            tracing::warn!(
                "Enhancement of {} degraded {}",
                record.id,
                comparison.degradations.join(", ")
            );
        }

        record.processed = Some(locator);
        record.enhancement = Some(EnhancementSummary::from(&image));
        record.quality = Some(comparison);
        record.status = ImageStatus::Processed;
        record.error = None;
        self.commit(record).await?;
        Ok(Transition::Processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StaticAnalyzer;
    use crate::storage::{MemoryBlobStore, MemoryRecordStore};
    use crate::test_support::{analysis, gradient, png_bytes};
    use crate::types::Locator;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replays scripted replies, then keeps succeeding.
    struct ScriptedAnalyzer {
        script: Mutex<VecDeque<std::result::Result<AnalysisResult, AnalysisError>>>,
        calls: AtomicU32,
        delay: Duration,
    }

    impl ScriptedAnalyzer {
        fn new(script: Vec<std::result::Result<AnalysisResult, AnalysisError>>) -> Arc<Self> {
            Self::slow(script, Duration::ZERO)
        }

        fn slow(
            script: Vec<std::result::Result<AnalysisResult, AnalysisError>>,
            delay: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                delay,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentAnalyzer for ScriptedAnalyzer {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn analyze(
            &self,
            _image: &ImageInput,
        ) -> std::result::Result<AnalysisResult, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(analysis("landscape", "calm", &["mountain"])))
        }
    }

    /// Memory blob store that counts writes.
    #[derive(Default)]
    struct CountingBlobStore {
        inner: MemoryBlobStore,
        puts: AtomicU32,
    }

    #[async_trait]
    impl BlobStore for CountingBlobStore {
        async fn put(&self, key: &str, bytes: &[u8]) -> std::result::Result<Locator, StorageError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, bytes).await
        }

        async fn get(&self, locator: &Locator) -> std::result::Result<Vec<u8>, StorageError> {
            self.inner.get(locator).await
        }

        async fn delete(&self, locator: &Locator) -> std::result::Result<(), StorageError> {
            self.inner.delete(locator).await
        }
    }

    fn fast_settings() -> OrchestratorSettings {
        OrchestratorSettings {
            analysis_timeout: Duration::from_secs(5),
            enhance_timeout: Duration::from_secs(30),
            retry_attempts: 2,
            retry_delay_ms: 1,
            max_analysis_attempts: 3,
        }
    }

    fn setup(analyzer: Arc<dyn ContentAnalyzer>) -> (Orchestrator, Arc<CountingBlobStore>) {
        let blobs = Arc::new(CountingBlobStore::default());
        let orchestrator = Orchestrator::new(
            Arc::new(MemoryRecordStore::new()),
            blobs.clone(),
            analyzer,
            EnhancementEngine::default(),
        )
        .with_settings(fast_settings());
        (orchestrator, blobs)
    }

    fn image_bytes() -> Vec<u8> {
        png_bytes(&gradient(12, 8))
    }

    #[tokio::test]
    async fn test_drive_reaches_processed() {
        let analyzer = Arc::new(StaticAnalyzer::new(analysis("portrait", "warm", &["person"])));
        let (orch, blobs) = setup(analyzer);
        let id = ImageId::new("img");
        let submitted = orch.submit(id.clone(), &image_bytes()).await.unwrap();
        assert_eq!(submitted.status, ImageStatus::Uploaded);
        assert_eq!(submitted.revision, 1);

        let record = orch.drive(&id).await.unwrap();
        assert_eq!(record.status, ImageStatus::Processed);
        assert_eq!(record.revision, 6);
        assert_eq!(record.editing_config.unwrap().preset_id.as_deref(), Some("golden_hour"));
        assert!(record.quality.is_some());
        let summary = record.enhancement.unwrap();
        assert_eq!((summary.width, summary.height), (12, 8));

        let processed = record.processed.unwrap();
        assert_eq!(processed.0, "img.png");
        assert!(!blobs.get(&processed).await.unwrap().is_empty());
        assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Idle);
    }

    #[tokio::test]
    async fn test_repeated_evaluation_enhances_once() {
        let (orch, blobs) = setup(ScriptedAnalyzer::new(vec![]));
        let id = ImageId::new("once");
        orch.submit(id.clone(), &image_bytes()).await.unwrap();
        assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Analyzed);
        assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Configured);
        let puts_before = blobs.puts.load(Ordering::SeqCst);

        assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Processed);
        assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Idle);
        assert_eq!(blobs.puts.load(Ordering::SeqCst), puts_before + 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_evaluate_runs_stage_once() {
        let analyzer = ScriptedAnalyzer::slow(vec![], Duration::from_millis(100));
        let (orch, _) = setup(analyzer.clone());
        let id = ImageId::new("race");
        orch.submit(id.clone(), &image_bytes()).await.unwrap();

        let (a, b) = tokio::join!(orch.evaluate(&id), orch.evaluate(&id));
        let mut transitions = vec![a.unwrap(), b.unwrap()];
        transitions.sort_by_key(|t| format!("{t:?}"));
        assert_eq!(transitions, vec![Transition::Analyzed, Transition::Idle]);
        assert_eq!(analyzer.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retry_in_place() {
        let analyzer = ScriptedAnalyzer::new(vec![
            Err(AnalysisError::transient("502")),
            Err(AnalysisError::transient("reset")),
        ]);
        let (orch, _) = setup(analyzer.clone());
        let id = ImageId::new("flaky");
        orch.submit(id.clone(), &image_bytes()).await.unwrap();

        assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Analyzed);
        assert_eq!(analyzer.calls(), 3);
        assert_eq!(orch.record(&id).await.unwrap().analysis_attempts, 1);
    }

    #[tokio::test]
    async fn test_rate_limit_defers_without_immediate_retry() {
        let analyzer = ScriptedAnalyzer::new(vec![Err(AnalysisError::rate_limited("quota"))]);
        let (orch, _) = setup(analyzer.clone());
        let orch = orch.with_settings(OrchestratorSettings {
            retry_delay_ms: 60_000,
            ..fast_settings()
        });
        let id = ImageId::new("limited");
        orch.submit(id.clone(), &image_bytes()).await.unwrap();

        let Transition::RetryLater { retry_after_ms } = orch.evaluate(&id).await.unwrap() else {
            panic!("expected RetryLater");
        };
        assert_eq!(analyzer.calls(), 1);
        let record = orch.record(&id).await.unwrap();
        assert_eq!(record.status, ImageStatus::Uploaded);
        assert_eq!(record.retry_after_ms, Some(retry_after_ms));
        assert!(record.error.unwrap().contains("quota"));

        assert_eq!(
            orch.evaluate(&id).await.unwrap(),
            Transition::Deferred { retry_after_ms }
        );
        assert_eq!(analyzer.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_fail() {
        let analyzer = ScriptedAnalyzer::new(vec![
            Err(AnalysisError::rate_limited("quota")),
            Err(AnalysisError::rate_limited("quota")),
        ]);
        let (orch, _) = setup(analyzer);
        let orch = orch.with_settings(OrchestratorSettings {
            max_analysis_attempts: 2,
            ..fast_settings()
        });
        let id = ImageId::new("starved");
        orch.submit(id.clone(), &image_bytes()).await.unwrap();

        assert!(matches!(
            orch.evaluate(&id).await.unwrap(),
            Transition::RetryLater { .. }
        ));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(orch.evaluate(&id).await.unwrap(), Transition::Failed(_)));

        let record = orch.record(&id).await.unwrap();
        assert_eq!(record.status, ImageStatus::Failed);
        assert!(record.error.unwrap().contains("after 2 attempts"));
    }

    #[tokio::test]
    async fn test_unrecoverable_and_invalid_results_fail() {
        let mut out_of_range = analysis("food", "warm", &[]);
        out_of_range.technical_quality.exposure = 1.5;
        let analyzer = ScriptedAnalyzer::new(vec![
            Err(AnalysisError::unrecoverable("bad key").with_status(401)),
            Ok(out_of_range),
        ]);
        let (orch, _) = setup(analyzer);

        for name in ["auth", "range"] {
            let id = ImageId::new(name);
            orch.submit(id.clone(), &image_bytes()).await.unwrap();
            assert!(matches!(orch.evaluate(&id).await.unwrap(), Transition::Failed(_)));
        }
        let range = orch.record(&ImageId::new("range")).await.unwrap();
        assert!(range.error.unwrap().contains("exposure"));
    }

    #[tokio::test]
    async fn test_analysis_timeout_fails() {
        let analyzer = ScriptedAnalyzer::slow(vec![], Duration::from_millis(300));
        let (orch, _) = setup(analyzer);
        let orch = orch.with_settings(OrchestratorSettings {
            analysis_timeout: Duration::from_millis(20),
            ..fast_settings()
        });
        let id = ImageId::new("slow");
        orch.submit(id.clone(), &image_bytes()).await.unwrap();

        let Transition::Failed(reason) = orch.evaluate(&id).await.unwrap() else {
            panic!("expected Failed");
        };
        assert!(reason.contains("Timeout in analysis stage after 20ms"));
    }

    #[tokio::test]
    async fn test_undecodable_original_fails_in_enhancement() {
        let analyzer = Arc::new(StaticAnalyzer::new(analysis("food", "warm", &[])));
        let (orch, _) = setup(analyzer);
        let id = ImageId::new("junk");
        orch.submit(id.clone(), b"definitely not an image").await.unwrap();

        let record = orch.drive(&id).await.unwrap();
        assert_eq!(record.status, ImageStatus::Failed);
        assert!(record.error.unwrap().contains("Decode error"));
        assert!(record.editing_config.is_some());
        assert!(record.processed.is_none());
    }

    #[tokio::test]
    async fn test_retry_clears_outputs() {
        let (orch, blobs) = setup(ScriptedAnalyzer::new(vec![]));
        let id = ImageId::new("again");
        orch.submit(id.clone(), &image_bytes()).await.unwrap();
        let done = orch.drive(&id).await.unwrap();
        let processed = done.processed.clone().unwrap();

        let reset = orch.retry(&id).await.unwrap();
        assert_eq!(reset.status, ImageStatus::Uploaded);
        assert!(reset.analysis.is_none());
        assert!(reset.editing_config.is_none());
        assert!(reset.quality.is_none());
        assert!(reset.processed.is_none());
        assert_eq!(reset.revision, done.revision + 1);
        assert!(matches!(
            blobs.get(&processed).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_interrupted_stages_resume() {
        let (orch, _) = setup(ScriptedAnalyzer::new(vec![]));
        let id = ImageId::new("crashed");
        let mut record = orch.submit(id.clone(), &image_bytes()).await.unwrap();
        record.status = ImageStatus::Analyzing;
        record.revision += 1;
        orch.records().put(&record).await.unwrap();

        assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Analyzed);

        let mut record = orch.record(&id).await.unwrap();
        record.status = ImageStatus::Processing;
        record.revision += 1;
        orch.records().put(&record).await.unwrap();
        assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Processed);
        assert!(orch.record(&id).await.unwrap().editing_config.is_some());
    }

    #[tokio::test]
    async fn test_cache_shares_analysis_between_identical_images() {
        let analyzer = ScriptedAnalyzer::new(vec![]);
        let (orch, _) = setup(analyzer.clone());
        let cache = Arc::new(AnalysisCache::new(8, Duration::from_secs(60)));
        let orch = orch.with_cache(Some(cache.clone()));

        let bytes = image_bytes();
        for name in ["first", "copy"] {
            let id = ImageId::new(name);
            orch.submit(id.clone(), &bytes).await.unwrap();
            assert_eq!(orch.evaluate(&id).await.unwrap(), Transition::Analyzed);
        }
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(cache.len(), 1);

        orch.retry(&ImageId::new("copy")).await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_submit_is_idempotent_and_missing_ids_error() {
        let (orch, blobs) = setup(ScriptedAnalyzer::new(vec![]));
        let id = ImageId::new("dup");
        let first = orch.submit(id.clone(), &image_bytes()).await.unwrap();
        let second = orch.submit(id.clone(), b"other bytes").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(blobs.puts.load(Ordering::SeqCst), 1);

        let err = orch.evaluate(&ImageId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, PrismError::NotFound(_)));
    }

    /// Record store whose writes silently vanish.
    struct LossyRecordStore;

    #[async_trait]
    impl RecordStore for LossyRecordStore {
        async fn get(&self, _id: &ImageId) -> std::result::Result<Option<ImageRecord>, StorageError> {
            Ok(None)
        }

        async fn put(&self, _record: &ImageRecord) -> std::result::Result<(), StorageError> {
            Ok(())
        }

        async fn list(&self) -> std::result::Result<Vec<ImageRecord>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_unconfirmed_write_is_an_error() {
        let orch = Orchestrator::new(
            Arc::new(LossyRecordStore),
            Arc::new(MemoryBlobStore::new()),
            ScriptedAnalyzer::new(vec![]),
            EnhancementEngine::default(),
        );
        let err = orch.submit(ImageId::new("lost"), b"x").await.unwrap_err();
        assert!(matches!(
            err,
            PrismError::Storage(StorageError::Unconfirmed {
                expected: 1,
                found: None,
                ..
            })
        ));
    }
}
