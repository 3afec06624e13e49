//! Bounded concurrent enhancement of many images.
//!
//! Each item runs on the blocking pool, gated by a semaphore. A failing
//! item is reported in its own outcome and never fails the batch.

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::EngineError;
use crate::types::AnalysisResult;

use super::{Adjustment, EnhancedImage, EnhancementEngine};

/// One unit of batch work.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Caller-chosen label echoed in the outcome
    pub id: String,
    pub bytes: Vec<u8>,
    pub analysis: Option<AnalysisResult>,
    pub adjustment: Adjustment,
}

/// Result of enhancing a single batch item.
#[derive(Debug)]
pub enum BatchOutcome {
    Success { id: String, image: EnhancedImage },
    Failure { id: String, error: EngineError },
}

impl BatchOutcome {
    pub fn id(&self) -> &str {
        match self {
            BatchOutcome::Success { id, .. } | BatchOutcome::Failure { id, .. } => id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success { .. })
    }
}

impl EnhancementEngine {
    /// Enhance `items` with at most `parallel` running at once.
    ///
    /// Outcomes are returned in input order.
    pub async fn batch_enhance(&self, items: Vec<BatchItem>, parallel: usize) -> Vec<BatchOutcome> {
        let semaphore = Arc::new(Semaphore::new(parallel.max(1)));
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::warn!("Batch semaphore closed unexpectedly, stopping batch");
                break;
            };
            let engine = self.clone();
            let id = item.id.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let result = engine.enhance(&item.bytes, item.analysis.as_ref(), &item.adjustment);
                drop(permit);
                match result {
                    Ok(image) => BatchOutcome::Success { id: item.id, image },
                    Err(error) => BatchOutcome::Failure { id: item.id, error },
                }
            });
            handles.push((id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Enhancement task for {id} failed: {e}");
                    BatchOutcome::Failure {
                        id,
                        error: EngineError::Task(e.to_string()),
                    }
                }
            };
            if let BatchOutcome::Failure { id, error } = &outcome {
                tracing::warn!("Failed to enhance {id}: {error}");
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}
