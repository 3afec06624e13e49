//! Event-driven processing: image ids arrive on a bounded channel and each
//! one is driven to rest.
//!
//! An image deferred by a rate limit is re-queued when its retry window
//! opens, so callers never poll. The loop ends once the channel is closed
//! and no drive or deferred retry is outstanding.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::evaluator::{DriveOutcome, Orchestrator};
use super::state::{now_ms, ImageStatus};
use crate::config::PipelineConfig;
use crate::error::EngineError;
use crate::types::ImageId;

/// Create a bounded image-id channel with the configured buffer size.
///
/// When the buffer is full, senders wait, which keeps a large discovery
/// from racing ahead of processing.
pub fn event_channel(config: &PipelineConfig) -> (mpsc::Sender<ImageId>, mpsc::Receiver<ImageId>) {
    mpsc::channel(config.buffer_size.max(1))
}

/// Retry time of a record parked at `uploaded` by a deferral.
fn deferred_until(outcome: &DriveOutcome) -> Option<u64> {
    match &outcome.result {
        Ok(record) if record.status == ImageStatus::Uploaded => record.retry_after_ms,
        _ => None,
    }
}

impl Orchestrator {
    /// Consume ids from `events`, driving at most `parallel` images at once.
    ///
    /// `on_done` fires once per image when it reaches a final outcome.
    /// Outcomes are returned in completion order.
    pub async fn run_events<F>(
        &self,
        mut events: mpsc::Receiver<ImageId>,
        parallel: usize,
        on_done: F,
    ) -> Vec<DriveOutcome>
    where
        F: Fn(&DriveOutcome) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(parallel.max(1)));
        let mut drives: JoinSet<DriveOutcome> = JoinSet::new();
        let mut timers: JoinSet<ImageId> = JoinSet::new();
        let mut outcomes = Vec::new();
        let mut open = true;

        let spawn_drive = |drives: &mut JoinSet<DriveOutcome>, id: ImageId| {
            let orchestrator = self.clone();
            let semaphore = semaphore.clone();
            drives.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let driven = id.clone();
                let drive = tokio::spawn(async move { orchestrator.drive(&driven).await });
                let result = match drive.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Drive of {id} panicked: {e}");
                        Err(EngineError::Task(e.to_string()).into())
                    }
                };
                DriveOutcome { id, result }
            });
        };

        loop {
            tokio::select! {
                event = events.recv(), if open => match event {
                    Some(id) => spawn_drive(&mut drives, id),
                    None => open = false,
                },
                Some(joined) = drives.join_next(), if !drives.is_empty() => {
                    let outcome = match joined {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::error!("Drive task aborted: {e}");
                            continue;
                        }
                    };
                    if let Some(retry_after_ms) = deferred_until(&outcome) {
                        let wait = Duration::from_millis(retry_after_ms.saturating_sub(now_ms()));
                        tracing::debug!("Re-queueing {} in {wait:?}", outcome.id);
                        let id = outcome.id;
                        timers.spawn(async move {
                            tokio::time::sleep(wait).await;
                            id
                        });
                        continue;
                    }
                    on_done(&outcome);
                    outcomes.push(outcome);
                },
                Some(joined) = timers.join_next(), if !timers.is_empty() => {
                    if let Ok(id) = joined {
                        spawn_drive(&mut drives, id);
                    }
                },
                else => break,
            }
        }
        outcomes
    }

    /// Drive `ids` to a final outcome with at most `parallel` at once.
    ///
    /// Outcomes come back in input order; duplicate ids are driven once.
    pub async fn drive_all<F>(&self, ids: Vec<ImageId>, parallel: usize, on_done: F) -> Vec<DriveOutcome>
    where
        F: Fn(&DriveOutcome) + Send + Sync + 'static,
    {
        let mut order: HashMap<ImageId, usize> = HashMap::with_capacity(ids.len());
        let (tx, rx) = mpsc::channel(ids.len().max(1));
        for id in ids {
            let next = order.len();
            if let std::collections::hash_map::Entry::Vacant(slot) = order.entry(id.clone()) {
                slot.insert(next);
                // Capacity covers every id, so this never waits.
                if tx.send(id).await.is_err() {
                    break;
                }
            }
        }
        drop(tx);

        let mut outcomes = self.run_events(rx, parallel, on_done).await;
        outcomes.sort_by_key(|o| order.get(&o.id).copied().unwrap_or(usize::MAX));
        outcomes
    }
}
