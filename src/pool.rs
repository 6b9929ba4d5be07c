//! Bounded worker pool fanning page tasks out over a shared document.
//!
//! [`PagePool::run_all`] keeps at most `P` pages in flight, where
//! `P = max(1, min(limit, tasks))` and `limit` defaults to the machine's
//! available parallelism. A finished page frees its slot immediately so the
//! next one is admitted; there are no fixed batches. Each admitted page runs
//! on tokio's blocking thread pool because every stage is CPU- or IO-bound.
//!
//! `run_all` is a barrier: it returns only when every admitted page has
//! succeeded or failed. Results are folded by the single consumer of the
//! result stream, so aggregation needs no locking.

use crate::error::PageError;
use crate::output::{PageArtifact, RunOutcome};
use crate::pipeline::page::{PageProcessor, PageTask};
use crate::progress::ProgressCallback;
use futures::future;
use futures::stream::{self, StreamExt};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cooperative cancellation shared between a run and its caller.
///
/// Raising the flag stops admission of new pages; pages already in flight
/// run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Degree of parallelism for `tasks` pages under an optional `limit`.
pub fn degree_of_parallelism(limit: Option<usize>, tasks: usize) -> usize {
    let limit = limit.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    });
    limit.min(tasks).max(1)
}

/// Schedules one [`PageProcessor::process`] call per task.
pub struct PagePool {
    processor: Arc<PageProcessor>,
    limit: Option<usize>,
    progress: Option<ProgressCallback>,
    cancellation: CancellationFlag,
    fail_fast: bool,
}

impl PagePool {
    pub fn new(processor: PageProcessor) -> Self {
        Self {
            processor: Arc::new(processor),
            limit: None,
            progress: None,
            cancellation: CancellationFlag::default(),
            fail_fast: false,
        }
    }

    /// Cap concurrency below the available parallelism.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Stop admitting pages after the first failure.
    pub fn fail_fast(mut self, v: bool) -> Self {
        self.fail_fast = v;
        self
    }

    /// Run every task and return once all admitted tasks are terminal.
    pub async fn run_all(&self, tasks: Vec<PageTask>) -> RunOutcome {
        let start = Instant::now();
        let total = tasks.len();
        let parallelism = degree_of_parallelism(self.limit, total);
        info!(
            "Processing {} pages with up to {} in flight",
            total, parallelism
        );

        if let Some(ref cb) = self.progress {
            cb.on_conversion_start(total);
        }

        let cancellation = self.cancellation.clone();
        let initial = RunOutcome {
            requested: total,
            ..Default::default()
        };

        let mut outcome = stream::iter(tasks)
            .take_while(move |_| future::ready(!cancellation.is_cancelled()))
            .map(|task| self.run_one(task, total))
            .buffer_unordered(parallelism)
            .fold(initial, |mut outcome, result| {
                if result.is_err() && self.fail_fast && !self.cancellation.is_cancelled() {
                    warn!("Strict mode: no further pages will be admitted");
                    self.cancellation.cancel();
                }
                outcome.record(result);
                future::ready(outcome)
            })
            .await;

        outcome.finalize();
        outcome.duration_ms = start.elapsed().as_millis() as u64;

        if outcome.skipped > 0 {
            warn!("{} pages were not admitted (run cancelled)", outcome.skipped);
        }
        if let Some(ref cb) = self.progress {
            cb.on_conversion_complete(total, outcome.succeeded);
        }

        outcome
    }

    async fn run_one(&self, task: PageTask, total: usize) -> Result<PageArtifact, PageError> {
        let page = task.page;
        if let Some(ref cb) = self.progress {
            cb.on_page_start(page, total);
        }

        let processor = Arc::clone(&self.processor);
        let result = tokio::task::spawn_blocking(move || processor.process(&task))
            .await
            .unwrap_or_else(|e| {
                Err(PageError::Aborted {
                    page,
                    detail: e.to_string(),
                })
            });

        match &result {
            Ok(artifact) => {
                debug!("Page {} done", page);
                if let Some(ref cb) = self.progress {
                    cb.on_page_complete(page, total, artifact);
                }
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(ref cb) = self.progress {
                    cb.on_page_error(page, total, e);
                }
            }
        }

        result
    }
}
