//! Sequential processing loop with per-item failure isolation.
//!
//! The pipeline owns the rate limiter and the extraction backend. It
//! drains the queue strictly in order with at most one item in flight;
//! one bad document never aborts the batch, it only yields a
//! [`ProcessingResult::Failure`] for that item.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use factura_extract::DocumentExtractor;

use crate::error::{FacturaError, Result};
use crate::models::row::ExtractedRow;
use crate::normalize::normalize;
use crate::queue::{SourceFile, WorkItem, build_queue};
use crate::ratelimit::{CycleState, RateLimiter};

/// Progress notifications surfaced to the presentation layer. The
/// core never renders; whoever owns the sink does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// An item was picked up by the loop.
    ItemStarted { name: String },
    /// An item finished with normalized rows.
    ItemCompleted { name: String, rows: usize },
    /// An item failed; the loop moves on.
    ItemFailed { name: String, reason: String },
    /// The per-cycle completion count changed.
    CycleCount(usize),
    /// The cycle locked and the cooldown timer was armed.
    LockedOut { cooldown: Duration },
    /// The cooldown elapsed and the cycle reopened.
    CooldownExpired,
}

/// Receiver for pipeline progress. Implementations must not block:
/// events are emitted from the processing loop and the timer task.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: PipelineEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: PipelineEvent) {}
}

/// Outcome of one work item, emitted in queue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingResult {
    /// Extraction and normalization succeeded.
    Success {
        items: Vec<ExtractedRow>,
        source_name: String,
    },
    /// The item failed; `reason` is the human-readable cause.
    Failure { reason: String, source_name: String },
}

impl ProcessingResult {
    /// Name of the source document this result belongs to.
    pub fn source_name(&self) -> &str {
        match self {
            ProcessingResult::Success { source_name, .. } => source_name,
            ProcessingResult::Failure { source_name, .. } => source_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success { .. })
    }
}

/// Orchestrates queue building, admission, extraction, and
/// normalization for one process-wide cycle counter.
pub struct Pipeline<E> {
    extractor: E,
    limiter: RateLimiter,
    sink: Arc<dyn EventSink>,
}

impl<E: DocumentExtractor> Pipeline<E> {
    /// Create a pipeline with the default limiter and no event sink.
    pub fn new(extractor: E) -> Self {
        Self::with_sink(extractor, Arc::new(NullSink))
    }

    /// Create a pipeline that reports progress through `sink`.
    pub fn with_sink(extractor: E, sink: Arc<dyn EventSink>) -> Self {
        Self {
            extractor,
            limiter: RateLimiter::default(),
            sink,
        }
    }

    /// Replace the rate limiter (used to shrink limits in tests).
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Validate an archive before queueing: returns the valid-entry
    /// count, rejecting bundles that could never fit in one cycle.
    pub fn validate_archive(&self, bytes: &[u8]) -> Result<usize> {
        let valid = crate::archive::inspect_archive(bytes)?;

        if valid > self.limiter.limit() {
            return Err(crate::error::ArchiveError::TooManyEntries {
                valid,
                limit: self.limiter.limit(),
            }
            .into());
        }

        Ok(valid)
    }

    /// Handle one processing request end to end: rebuild the queue
    /// from the given sources, run the admission check, then drain the
    /// queue. Archive and admission errors abort before any work;
    /// per-item errors never do.
    pub async fn process(
        &mut self,
        standalone: Option<SourceFile>,
        archive: Option<&[u8]>,
    ) -> Result<Vec<ProcessingResult>> {
        let queue = build_queue(standalone, archive)?;

        if queue.is_empty() {
            return Err(FacturaError::EmptyQueue);
        }

        self.limiter.admit(queue.len())?;

        Ok(self.run(queue).await)
    }

    /// Drain an already-admitted queue strictly in order, one item in
    /// flight at a time. Arms the cooldown timer if the cycle locked
    /// while draining.
    pub async fn run(&mut self, queue: Vec<WorkItem>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(queue.len());

        for item in queue {
            self.sink.on_event(PipelineEvent::ItemStarted {
                name: item.display_name.clone(),
            });

            match self.process_item(&item).await {
                Ok(rows) => {
                    let count = self.limiter.record_completion();
                    info!(name = %item.display_name, rows = rows.len(), count, "item completed");

                    self.sink.on_event(PipelineEvent::ItemCompleted {
                        name: item.display_name.clone(),
                        rows: rows.len(),
                    });
                    self.sink.on_event(PipelineEvent::CycleCount(count));

                    results.push(ProcessingResult::Success {
                        items: rows,
                        source_name: item.display_name,
                    });
                }
                Err(err) => {
                    // Failure is contained to this item; the counter
                    // does not move and the loop continues.
                    let reason = err.to_string();
                    warn!(name = %item.display_name, %reason, "item failed");

                    self.sink.on_event(PipelineEvent::ItemFailed {
                        name: item.display_name.clone(),
                        reason: reason.clone(),
                    });

                    results.push(ProcessingResult::Failure {
                        reason,
                        source_name: item.display_name,
                    });
                }
            }
        }

        if self.limiter.state().locked {
            self.arm_cooldown();
        }

        results
    }

    async fn process_item(&self, item: &WorkItem) -> Result<Vec<ExtractedRow>> {
        let raw = self.extractor.extract(&item.payload, item.media_type).await?;
        let rows = normalize(&raw)?;
        Ok(rows)
    }

    fn arm_cooldown(&mut self) {
        self.sink.on_event(PipelineEvent::LockedOut {
            cooldown: self.limiter.cooldown(),
        });

        let sink = Arc::clone(&self.sink);
        self.limiter.arm_cooldown(move || {
            sink.on_event(PipelineEvent::CooldownExpired);
        });
    }

    /// Manual reset: clears the lockout and cancels any pending
    /// cooldown. Deliberately does not abort an in-flight batch; it
    /// only prevents (or lifts) the lockout.
    pub fn reset(&mut self) {
        self.limiter.reset();
        self.sink.on_event(PipelineEvent::CycleCount(0));
    }

    /// Snapshot of the cycle counter and lock flag.
    pub fn cycle_state(&self) -> CycleState {
        self.limiter.state()
    }
}
